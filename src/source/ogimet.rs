use crate::source::error::FetchError;
use crate::source::MetarSource;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::Client;

pub const OGIMET_URL: &str = "https://www.ogimet.com/cgi-bin/getmetar";
const QUERY_TIME_FORMAT: &str = "%Y%m%d%H%M";
const QUOTA_MARKER: &str = "quota limit";
const NO_DATA_MARKER: &str = "No METARs found";

/// Client for the Ogimet `getmetar` CGI, which answers with one CSV line per
/// report: `ICAO,YYYY,MM,DD,HH,mm,REPORT`.
#[derive(Debug, Clone)]
pub struct OgimetSource {
    client: Client,
    base_url: String,
}

impl Default for OgimetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl OgimetSource {
    pub fn new() -> Self {
        Self::with_base_url(OGIMET_URL)
    }

    /// Points the client at a different endpoint speaking the same protocol.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn request(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<String, FetchError> {
        let begin = begin.format(QUERY_TIME_FORMAT).to_string();
        let end = end.format(QUERY_TIME_FORMAT).to_string();
        let url = &self.base_url;

        let response = self
            .client
            .get(url)
            .query(&[
                ("icao", station),
                ("begin", begin.as_str()),
                ("end", end.as_str()),
                ("lang", "eng"),
                ("header", "no"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))?;
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => FetchError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    },
                    None => FetchError::NetworkRequest(url.to_string(), e),
                });
            }
        };
        response
            .text()
            .await
            .map_err(|e| FetchError::NetworkRequest(url.to_string(), e))
    }
}

impl MetarSource for OgimetSource {
    async fn fetch_raw(
        &self,
        station: &str,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<String>, FetchError> {
        info!("Fetching METARs for {} from {} to {}", station, begin, end);
        let body = self.request(station, begin, end).await?;
        let lines = parse_ogimet_body(&body)?;
        info!("Received {} METARs for {}", lines.len(), station);
        Ok(lines)
    }
}

/// Turns a `getmetar` response body into `"YYYYMMDDHHmm REPORT"` lines.
pub fn parse_ogimet_body(body: &str) -> Result<Vec<String>, FetchError> {
    if let Some(line) = body.lines().find(|line| line.contains(QUOTA_MARKER)) {
        return Err(FetchError::Transient {
            message: line.trim().to_string(),
        });
    }
    if body.contains(NO_DATA_MARKER) {
        return Err(FetchError::NoData);
    }

    let lines: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let parts: Vec<&str> = line.splitn(7, ',').collect();
            match parts.as_slice() {
                [_icao, year, month, day, hour, minute, report] => Some(format!(
                    "{year}{month}{day}{hour}{minute} {}",
                    report.trim()
                )),
                _ => {
                    debug!("Ignoring unexpected upstream line: {}", line);
                    None
                }
            }
        })
        .collect();

    if lines.is_empty() {
        return Err(FetchError::NoData);
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_lines_become_timestamped_reports() {
        let body = "EGKA,2025,01,02,09,20,METAR EGKA 020920Z 24008KT 9999 BKN020 06/04 Q1011=\n\
                    EGKA,2025,01,02,09,50,METAR EGKA 020950Z 24010KT 9999 FEW025 06/04 Q1011=\n";
        let lines = parse_ogimet_body(body).unwrap();
        assert_eq!(
            lines,
            vec![
                "202501020920 METAR EGKA 020920Z 24008KT 9999 BKN020 06/04 Q1011=",
                "202501020950 METAR EGKA 020950Z 24010KT 9999 FEW025 06/04 Q1011=",
            ]
        );
    }

    #[test]
    fn parsed_lines_feed_the_parser() {
        let body = "EGKA,2025,01,02,09,20,METAR EGKA 020920Z 24008KT 9999 BKN020 06/04 Q1011=";
        let lines = parse_ogimet_body(body).unwrap();
        let observation = crate::parser::parse(&lines[0]).unwrap();
        assert_eq!(observation.station(), "EGKA");
        assert_eq!(observation.qnh(), Some(1011));
    }

    #[test]
    fn quota_message_is_transient() {
        let body = "#Sorry, Your quota limit for slow queries rate has been reached\n";
        assert!(matches!(
            parse_ogimet_body(body),
            Err(FetchError::Transient { .. })
        ));
    }

    #[test]
    fn empty_answers_are_no_data() {
        assert!(matches!(
            parse_ogimet_body("No METARs found for EGKA"),
            Err(FetchError::NoData)
        ));
        assert!(matches!(parse_ogimet_body("\n\n"), Err(FetchError::NoData)));
        assert!(matches!(
            parse_ogimet_body("garbage without commas"),
            Err(FetchError::NoData)
        ));
    }

    #[test]
    fn commas_inside_the_report_are_kept() {
        let lines = parse_ogimet_body("EGKA,2025,01,02,09,20,METAR EGKA 020920Z RMK A,B").unwrap();
        assert_eq!(lines, vec!["202501020920 METAR EGKA 020920Z RMK A,B"]);
    }
}
