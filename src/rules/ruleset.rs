use crate::rules::error::RulesetError;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// A named set of flight thresholds. Every threshold is optional; an unset
/// threshold is not checked.
///
/// # Examples
///
/// ```
/// use metar_archive::Ruleset;
///
/// let microlight = Ruleset::builder()
///     .name("microlight")
///     .min_visibility(5000)
///     .max_wind_speed(14)
///     .max_wind_gust(20)
///     .build();
/// assert_eq!(microlight.min_ceiling, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct Ruleset {
    #[builder(into)]
    pub name: String,
    /// Meters.
    pub min_visibility: Option<u32>,
    /// Feet.
    pub min_ceiling: Option<u32>,
    /// Feet.
    pub min_base: Option<u32>,
    /// Knots.
    pub max_wind_speed: Option<u32>,
    /// Knots.
    pub max_wind_gust: Option<u32>,
    /// Degrees Celsius.
    pub min_temperature: Option<i32>,
    /// Degrees Celsius.
    pub max_temperature: Option<i32>,
    /// Weather groups that ground the flight, compared by full text: `+RA`
    /// grounds heavy rain only and `RA` only unqualified rain.
    #[builder(default)]
    #[serde(default)]
    pub disallowed_weather: BTreeSet<String>,
}

impl Ruleset {
    /// A ruleset with no thresholds; every observation passes it.
    pub fn unrestricted(name: impl Into<String>) -> Self {
        Self::builder().name(name).build()
    }

    pub fn from_json_str(json: &str) -> Result<Self, RulesetError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Reads a JSON array of rulesets.
pub fn load_rulesets(path: &Path) -> Result<Vec<Ruleset>, RulesetError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RulesetError::Read(path.to_path_buf(), e))?;
    Ok(serde_json::from_str(&text)?)
}
