//! Decoder for archived METAR lines of the form
//! `YYYYMMDDHHMM METAR [COR] CCCC ddhhmmZ ...`.
//!
//! Only the timestamp and station are required. Every other group is looked up
//! independently and left empty when it is missing or unreadable.

pub mod error;

use crate::parser::error::ParseError;
use crate::types::observation::{
    CloudCover, CloudLayer, Observation, Temperatures, WeatherPhenomenon, WindDirection,
};
use chrono::{DateTime, NaiveDate, Utc};
use log::debug;

const CORRECTION_MARKER: &str = "COR";
const REMARKS_MARKER: &str = "RMK";

/// Decodes one archived report.
///
/// # Examples
///
/// ```
/// use metar_archive::parse;
///
/// let observation = parse("202501020900 METAR EGKA 020900Z 24008KT 9999 FEW025 18/12 Q1015").unwrap();
/// assert_eq!(observation.station(), "EGKA");
/// assert_eq!(observation.cloud_base(), Some(2500));
/// assert_eq!(observation.ceiling(), None);
/// ```
pub fn parse(raw: &str) -> Result<Observation, ParseError> {
    let tokens: Vec<&str> = raw
        .split_whitespace()
        .map(|token| token.trim_end_matches('='))
        .filter(|token| !token.is_empty())
        .collect();

    let (timestamp, station, body_start) = parse_header(raw, &tokens)?;

    let mut groups = Groups::default();
    for token in tokens[body_start..]
        .iter()
        .copied()
        .take_while(|token| *token != REMARKS_MARKER)
    {
        groups.accept(token);
    }

    Ok(groups.into_observation(station, timestamp, raw))
}

fn parse_header<'a>(
    raw: &str,
    tokens: &[&'a str],
) -> Result<(DateTime<Utc>, &'a str, usize), ParseError> {
    let stamp = tokens.first().ok_or(ParseError::Empty)?;
    let timestamp = parse_timestamp(stamp).ok_or_else(|| ParseError::InvalidTimestamp {
        token: stamp.to_string(),
        raw: raw.to_string(),
    })?;

    let mut position = 1;
    if matches!(tokens.get(position), Some(&"METAR") | Some(&"SPECI")) {
        position += 1;
    }
    if tokens.get(position) == Some(&CORRECTION_MARKER) {
        position += 1;
    }
    let station = tokens
        .get(position)
        .copied()
        .filter(|token| is_station_code(token))
        .ok_or_else(|| ParseError::MissingStation {
            raw: raw.to_string(),
        })?;
    position += 1;
    if tokens.get(position) == Some(&CORRECTION_MARKER) {
        position += 1;
    }

    Ok((timestamp, station, position))
}

fn parse_timestamp(token: &str) -> Option<DateTime<Utc>> {
    if token.len() != 12 || !is_digits(token) {
        return None;
    }
    let number = |range: std::ops::Range<usize>| token[range].parse::<u32>().ok();
    let year = token[0..4].parse::<i32>().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, number(4..6)?, number(6..8)?)?
        .and_hms_opt(number(8..10)?, number(10..12)?, 0)?;
    Some(naive.and_utc())
}

fn is_station_code(token: &str) -> bool {
    token.len() == 4
        && token.starts_with(|c: char| c.is_ascii_uppercase())
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

struct Wind {
    direction: WindDirection,
    speed: u32,
    gust: Option<u32>,
}

/// `dddssKT`, `dddsssGggKT`, `VRBssKT`, ...
fn parse_wind(token: &str) -> Option<Wind> {
    let body = token.strip_suffix("KT")?;
    let direction = body.get(..3)?.parse::<WindDirection>().ok()?;
    if !(body.starts_with("VRB") || is_digits(&body[..3])) {
        return None;
    }
    let rest = &body[3..];
    let (speed, gust) = match rest.split_once('G') {
        Some((speed, gust)) => (speed, Some(gust)),
        None => (rest, None),
    };
    let is_knots = |text: &str| (2..=3).contains(&text.len()) && is_digits(text);
    if !is_knots(speed) || !gust.map_or(true, is_knots) {
        return None;
    }
    Some(Wind {
        direction,
        speed: speed.parse().ok()?,
        gust: gust.and_then(|g| g.parse().ok()),
    })
}

fn parse_visibility(token: &str) -> Option<u32> {
    if token.len() == 4 && is_digits(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// `FEW025`, `BKN008CB`, ...
fn parse_cloud_layer(token: &str) -> Option<CloudLayer> {
    let cover = CloudCover::from_code(token.get(..3)?)?;
    let height = token.get(3..6).filter(|h| is_digits(h))?;
    Some(CloudLayer::new(cover, height.parse().ok()?))
}

fn parse_qnh(token: &str) -> Option<u32> {
    let value = token.strip_prefix('Q')?;
    if value.len() == 4 && is_digits(value) {
        value.parse().ok()
    } else {
        None
    }
}

enum TemperatureGroup {
    Reported(Temperatures),
    Missing,
}

/// `18/12`, `M02/M04`, `05///`
fn parse_temperatures(token: &str) -> Option<TemperatureGroup> {
    let (air, dewpoint) = token.split_once('/')?;
    let side = |text: &str| -> Option<Option<i32>> {
        if text == "//" {
            return Some(None);
        }
        let (sign, digits) = match text.strip_prefix('M') {
            Some(digits) => (-1, digits),
            None => (1, text),
        };
        if digits.len() == 2 && is_digits(digits) {
            Some(Some(sign * digits.parse::<i32>().ok()?))
        } else {
            None
        }
    };
    match (side(air)?, side(dewpoint)?) {
        (Some(air), Some(dewpoint)) => Some(TemperatureGroup::Reported(Temperatures {
            air,
            dewpoint,
        })),
        _ => Some(TemperatureGroup::Missing),
    }
}

/// Accumulates the optional groups of a report. Single-valued groups keep
/// their first occurrence; cloud layers and weather keep every occurrence in
/// report order.
#[derive(Default)]
struct Groups {
    wind: Option<Wind>,
    visibility: Option<u32>,
    cloud_layers: Vec<CloudLayer>,
    weather: Vec<WeatherPhenomenon>,
    explicitly_clear: bool,
    qnh: Option<u32>,
    temperatures: Option<TemperatureGroup>,
}

impl Groups {
    fn accept(&mut self, token: &str) {
        if let Some(wind) = parse_wind(token) {
            self.wind.get_or_insert(wind);
        } else if let Some(visibility) = parse_visibility(token) {
            self.visibility.get_or_insert(visibility);
        } else if let Some(layer) = parse_cloud_layer(token) {
            self.cloud_layers.push(layer);
        } else if let Some(qnh) = parse_qnh(token) {
            self.qnh.get_or_insert(qnh);
        } else if let Some(group) = parse_temperatures(token) {
            self.temperatures.get_or_insert(group);
        } else if let Some(phenomenon) = WeatherPhenomenon::from_token(token) {
            self.weather.push(phenomenon);
        } else if token == "CAVOK" {
            self.visibility.get_or_insert(9999);
            self.explicitly_clear = true;
        } else if token == "NSW" {
            self.explicitly_clear = true;
        } else {
            debug!("Skipping unrecognised group '{}'", token);
        }
    }

    fn into_observation(self, station: &str, timestamp: DateTime<Utc>, raw: &str) -> Observation {
        let weather = if !self.weather.is_empty() {
            Some(self.weather)
        } else if self.explicitly_clear {
            Some(Vec::new())
        } else {
            None
        };
        let temperatures = match self.temperatures {
            Some(TemperatureGroup::Reported(temperatures)) => Some(temperatures),
            Some(TemperatureGroup::Missing) | None => None,
        };

        Observation {
            station: station.to_string(),
            timestamp,
            wind_direction: self.wind.as_ref().map(|w| w.direction),
            wind_speed: self.wind.as_ref().map(|w| w.speed),
            wind_gust: self.wind.as_ref().and_then(|w| w.gust),
            visibility: self.visibility,
            cloud_layers: self.cloud_layers,
            weather,
            qnh: self.qnh,
            temperatures,
            raw: raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::observation::{Intensity, PhenomenonCode};
    use chrono::TimeZone;

    const EGKA: &str = "202501020900 METAR EGKA 020900Z 24008KT 9999 FEW025 18/12 Q1015";

    #[test]
    fn decodes_a_complete_report() {
        let observation = parse(EGKA).unwrap();
        assert_eq!(observation.station(), "EGKA");
        assert_eq!(
            observation.timestamp(),
            Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()
        );
        assert_eq!(observation.wind_direction(), Some(WindDirection::Heading(240)));
        assert_eq!(observation.wind_speed(), Some(8));
        assert_eq!(observation.wind_gust(), None);
        assert_eq!(observation.visibility(), Some(9999));
        assert_eq!(observation.cloud_base(), Some(2500));
        assert_eq!(observation.ceiling(), None);
        assert_eq!(observation.temperature(), Some(18));
        assert_eq!(observation.dewpoint(), Some(12));
        assert_eq!(observation.qnh(), Some(1015));
        assert_eq!(observation.weather(), None);
        assert_eq!(observation.raw(), EGKA);
    }

    #[test]
    fn raw_text_is_kept_verbatim() {
        let raw = "202307011450 METAR EGLL 011450Z 27015G28KT 6000 +TSRA BKN012CB 21/19 Q1009 RMK AO2=";
        assert_eq!(parse(raw).unwrap().raw(), raw);
    }

    #[test]
    fn correction_marker_is_skipped() {
        let after_type = parse("202501020920 METAR COR EGKA 020920Z 25010KT 8000 Q1014").unwrap();
        assert_eq!(after_type.station(), "EGKA");
        assert_eq!(after_type.wind_speed(), Some(10));

        let after_station = parse("202501020920 METAR EGKA COR 020920Z 25010KT 8000 Q1014").unwrap();
        assert_eq!(after_station.station(), "EGKA");
        assert_eq!(after_station.visibility(), Some(8000));
    }

    #[test]
    fn missing_report_type_still_finds_station() {
        let observation = parse("202501020900 EGKA 020900Z 24008KT 9999").unwrap();
        assert_eq!(observation.station(), "EGKA");
        assert_eq!(observation.visibility(), Some(9999));
    }

    #[test]
    fn missing_required_tokens_are_malformed() {
        assert_eq!(parse("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse("METAR EGKA 020900Z 24008KT"),
            Err(ParseError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            parse("202513020900 METAR EGKA 020900Z"),
            Err(ParseError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            parse("202501020900 METAR"),
            Err(ParseError::MissingStation { .. })
        ));
        assert!(matches!(
            parse("202501020900 METAR 020900Z 24008KT"),
            Err(ParseError::MissingStation { .. })
        ));
    }

    #[test]
    fn gusts_and_variable_wind() {
        let gusting = parse("202501021200 METAR EGKA 021200Z 230105G125KT 9999").unwrap();
        assert_eq!(gusting.wind_direction(), Some(WindDirection::Heading(230)));
        assert_eq!(gusting.wind_speed(), Some(105));
        assert_eq!(gusting.wind_gust(), Some(125));

        let variable = parse("202501021200 METAR EGKA 021200Z VRB02KT 9999").unwrap();
        assert_eq!(variable.wind_direction(), Some(WindDirection::Variable));
        assert_eq!(variable.wind_speed(), Some(2));
    }

    #[test]
    fn unreadable_groups_are_skipped() {
        let observation =
            parse("202501021200 METAR EGKA 021200Z /////KT //// BKN/// 9999 ///// Q////").unwrap();
        assert_eq!(observation.wind_speed(), None);
        assert_eq!(observation.visibility(), Some(9999));
        assert!(observation.cloud_layers().is_empty());
        assert_eq!(observation.qnh(), None);
    }

    #[test]
    fn missing_dewpoint_clears_both_temperatures() {
        let observation = parse("202501021200 METAR EGKA 021200Z 24008KT 9999 05/// Q1015").unwrap();
        assert_eq!(observation.temperature(), None);
        assert_eq!(observation.dewpoint(), None);
    }

    #[test]
    fn negative_temperatures() {
        let observation = parse("202501020600 METAR EGKA 020600Z 00000KT 0300 FG M03/M04 Q1030").unwrap();
        assert_eq!(observation.temperature(), Some(-3));
        assert_eq!(observation.dewpoint(), Some(-4));
        assert_eq!(observation.wind_direction(), Some(WindDirection::Heading(0)));
        assert_eq!(observation.wind_speed(), Some(0));
        assert_eq!(observation.visibility(), Some(300));
    }

    #[test]
    fn weather_groups_collected_in_order() {
        let observation =
            parse("202501021200 METAR EGKA 021200Z 24008KT 3000 -RA VCTS +SN BR BKN010").unwrap();
        let weather = observation.weather().unwrap();
        let text: Vec<String> = weather.iter().map(ToString::to_string).collect();
        assert_eq!(text, ["-RA", "VCTS", "+SN", "BR"]);
        assert_eq!(weather[0].intensity, Some(Intensity::Light));
        assert_eq!(weather[1].code, PhenomenonCode::Thunderstorm);
    }

    #[test]
    fn cavok_and_nsw_mean_explicitly_clear() {
        let cavok = parse("202501021200 METAR EGKA 021200Z 24008KT CAVOK 18/12 Q1015").unwrap();
        assert_eq!(cavok.visibility(), Some(9999));
        assert_eq!(cavok.weather(), Some(&[][..]));

        let nsw = parse("202501021200 METAR EGKA 021200Z 24008KT 9999 NSW SCT030").unwrap();
        assert_eq!(nsw.weather(), Some(&[][..]));
    }

    #[test]
    fn cloud_layers_keep_report_order() {
        let observation =
            parse("202501021200 METAR EGKA 021200Z 24008KT 9999 FEW005 BKN020 OVC035").unwrap();
        assert_eq!(observation.cloud_layers().len(), 3);
        assert_eq!(observation.cloud_base(), Some(500));
        assert_eq!(observation.ceiling(), Some(2000));

        let reordered =
            parse("202501021200 METAR EGKA 021200Z 24008KT 9999 OVC035 FEW005 BKN020").unwrap();
        assert_eq!(reordered.cloud_base(), Some(3500));
        assert_eq!(reordered.ceiling(), Some(3500));
    }

    #[test]
    fn remarks_are_not_decoded() {
        let observation =
            parse("202501021200 METAR EGKA 021200Z 24008KT 9999 Q1015 RMK 1234 RA BKN005").unwrap();
        assert_eq!(observation.visibility(), Some(9999));
        assert_eq!(observation.weather(), None);
        assert!(observation.cloud_layers().is_empty());
    }

    #[test]
    fn removing_one_optional_group_only_clears_that_field() {
        let full = parse(EGKA).unwrap();
        let groups = ["24008KT", "9999", "FEW025", "18/12", "Q1015"];
        for group in groups {
            let reduced_raw = EGKA.replace(&format!(" {group}"), "");
            let reduced = parse(&reduced_raw).unwrap();
            assert_eq!(reduced.station(), full.station());
            assert_eq!(reduced.timestamp(), full.timestamp());

            let wind_removed = group == "24008KT";
            assert_eq!(reduced.wind_speed().is_none(), wind_removed);
            assert_eq!(reduced.wind_direction().is_none(), wind_removed);
            assert_eq!(reduced.visibility().is_none(), group == "9999");
            assert_eq!(reduced.cloud_base().is_none(), group == "FEW025");
            assert_eq!(reduced.temperature().is_none(), group == "18/12");
            assert_eq!(reduced.dewpoint().is_none(), group == "18/12");
            assert_eq!(reduced.qnh().is_none(), group == "Q1015");
        }
    }

    #[test]
    fn optional_group_order_does_not_matter() {
        let shuffled =
            parse("202501020900 METAR EGKA 020900Z Q1015 18/12 FEW025 9999 24008KT").unwrap();
        let original = parse(EGKA).unwrap();
        assert_eq!(shuffled.wind_speed(), original.wind_speed());
        assert_eq!(shuffled.visibility(), original.visibility());
        assert_eq!(shuffled.cloud_layers(), original.cloud_layers());
        assert_eq!(shuffled.temperatures(), original.temperatures());
        assert_eq!(shuffled.qnh(), original.qnh());
    }
}
