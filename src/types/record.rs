//! Flat storage layout of an [`Observation`].
//!
//! Collection columns are kept as JSON text. A column holding the literal
//! text `null` means the collection was absent when the record was written.

use crate::store::error::RecordError;
use crate::types::observation::{
    CloudCover, CloudLayer, Observation, Temperatures, WeatherPhenomenon, WindDirection,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const NULL_SENTINEL: &str = "null";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub station: String,
    /// RFC 3339, UTC.
    pub time: String,
    pub raw: String,
    pub wind_direction: Option<String>,
    pub wind_speed: Option<u32>,
    pub wind_gust: Option<u32>,
    pub visibility: Option<u32>,
    /// JSON `[["BKN","020"], ...]` or `null`.
    pub clouds: String,
    /// Written for queries against the store; ignored when reading back.
    pub base: Option<u32>,
    /// Written for queries against the store; ignored when reading back.
    pub ceiling: Option<u32>,
    /// JSON `["-RA", ...]` or `null`.
    pub weather: String,
    pub qnh: Option<u32>,
    pub temperature: Option<i32>,
    pub dewpoint: Option<i32>,
}

impl Observation {
    pub fn to_record(&self) -> ObservationRecord {
        let clouds = if self.cloud_layers.is_empty() {
            NULL_SENTINEL.to_string()
        } else {
            Value::Array(
                self.cloud_layers
                    .iter()
                    .map(|layer| {
                        Value::Array(vec![
                            Value::String(layer.cover.code().to_string()),
                            Value::String(format!("{:03}", layer.height_hundreds_ft)),
                        ])
                    })
                    .collect(),
            )
            .to_string()
        };
        let weather = match &self.weather {
            None => NULL_SENTINEL.to_string(),
            Some(phenomena) => Value::Array(
                phenomena
                    .iter()
                    .map(|p| Value::String(p.to_string()))
                    .collect(),
            )
            .to_string(),
        };

        ObservationRecord {
            station: self.station.clone(),
            time: self.timestamp.to_rfc3339(),
            raw: self.raw.clone(),
            wind_direction: self.wind_direction.map(|d| d.to_string()),
            wind_speed: self.wind_speed,
            wind_gust: self.wind_gust,
            visibility: self.visibility,
            clouds,
            base: self.cloud_base(),
            ceiling: self.ceiling(),
            weather,
            qnh: self.qnh,
            temperature: self.temperature(),
            dewpoint: self.dewpoint(),
        }
    }

    /// Rebuilds an observation from storage without re-parsing the raw text.
    pub fn from_record(record: ObservationRecord) -> Result<Observation, RecordError> {
        let timestamp = DateTime::parse_from_rfc3339(&record.time)
            .map_err(|source| RecordError::InvalidTimestamp {
                value: record.time.clone(),
                source,
            })?
            .with_timezone(&Utc);

        let wind_direction = record
            .wind_direction
            .as_deref()
            .map(|text| {
                text.parse::<WindDirection>()
                    .map_err(|_| RecordError::InvalidValue {
                        column: "wind_direction",
                        value: text.to_string(),
                    })
            })
            .transpose()?;

        let cloud_layers = decode_clouds(&record.clouds)?;
        let weather = decode_weather(&record.weather)?;

        let temperatures = match (record.temperature, record.dewpoint) {
            (Some(air), Some(dewpoint)) => Some(Temperatures { air, dewpoint }),
            _ => None,
        };

        Ok(Observation {
            station: record.station,
            timestamp,
            wind_direction,
            wind_speed: record.wind_speed,
            wind_gust: record.wind_gust,
            visibility: record.visibility,
            cloud_layers,
            weather,
            qnh: record.qnh,
            temperatures,
            raw: record.raw,
        })
    }
}

fn decode_clouds(column: &str) -> Result<Vec<CloudLayer>, RecordError> {
    if column == NULL_SENTINEL {
        return Ok(Vec::new());
    }
    let pairs: Vec<(String, String)> =
        serde_json::from_str(column).map_err(|source| RecordError::InvalidColumn {
            column: "clouds",
            source,
        })?;
    pairs
        .into_iter()
        .map(|(cover, height)| {
            let layer = CloudCover::from_code(&cover)
                .zip(height.parse::<u16>().ok())
                .map(|(cover, height)| CloudLayer::new(cover, height));
            layer.ok_or_else(|| RecordError::InvalidValue {
                column: "clouds",
                value: format!("{cover}{height}"),
            })
        })
        .collect()
}

fn decode_weather(column: &str) -> Result<Option<Vec<WeatherPhenomenon>>, RecordError> {
    if column == NULL_SENTINEL {
        return Ok(None);
    }
    let groups: Vec<String> =
        serde_json::from_str(column).map_err(|source| RecordError::InvalidColumn {
            column: "weather",
            source,
        })?;
    groups
        .into_iter()
        .map(|group| {
            WeatherPhenomenon::from_token(&group).ok_or(RecordError::InvalidValue {
                column: "weather",
                value: group,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}
