//! Flight-suitability checks over decoded observations.
//!
//! A check only fails when its threshold is configured and the observation
//! reports the field it looks at. Missing data never grounds a flight.

pub mod error;
pub mod ruleset;

use crate::rules::ruleset::Ruleset;
use crate::types::observation::Observation;
use std::fmt;

/// Minimum visibility in meters for the fixed VFR classification.
pub const VFR_MIN_VISIBILITY: u32 = 1500;
/// Minimum ceiling in feet for the fixed VFR classification.
pub const VFR_MIN_CEILING: u32 = 1500;

/// One threshold of a [`Ruleset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleCheck {
    Visibility,
    Ceiling,
    CloudBase,
    WindSpeed,
    WindGust,
    MinTemperature,
    MaxTemperature,
    Weather,
}

impl RuleCheck {
    pub const ALL: [RuleCheck; 8] = [
        RuleCheck::Visibility,
        RuleCheck::Ceiling,
        RuleCheck::CloudBase,
        RuleCheck::WindSpeed,
        RuleCheck::WindGust,
        RuleCheck::MinTemperature,
        RuleCheck::MaxTemperature,
        RuleCheck::Weather,
    ];

    pub fn passes(self, observation: &Observation, ruleset: &Ruleset) -> bool {
        match self {
            RuleCheck::Visibility => at_least(observation.visibility(), ruleset.min_visibility),
            RuleCheck::Ceiling => at_least(observation.ceiling(), ruleset.min_ceiling),
            RuleCheck::CloudBase => at_least(observation.cloud_base(), ruleset.min_base),
            RuleCheck::WindSpeed => at_most(observation.wind_speed(), ruleset.max_wind_speed),
            RuleCheck::WindGust => at_most(observation.wind_gust(), ruleset.max_wind_gust),
            RuleCheck::MinTemperature => {
                at_least(observation.temperature(), ruleset.min_temperature)
            }
            RuleCheck::MaxTemperature => {
                at_most(observation.temperature(), ruleset.max_temperature)
            }
            RuleCheck::Weather => match observation.weather() {
                Some(phenomena) => !phenomena.iter().any(|phenomenon| {
                    ruleset
                        .disallowed_weather
                        .iter()
                        .any(|code| phenomenon.matches(code))
                }),
                None => true,
            },
        }
    }
}

impl fmt::Display for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleCheck::Visibility => "visibility",
            RuleCheck::Ceiling => "ceiling",
            RuleCheck::CloudBase => "cloud base",
            RuleCheck::WindSpeed => "wind speed",
            RuleCheck::WindGust => "wind gust",
            RuleCheck::MinTemperature => "minimum temperature",
            RuleCheck::MaxTemperature => "maximum temperature",
            RuleCheck::Weather => "weather",
        };
        f.write_str(name)
    }
}

fn at_least<T: PartialOrd>(value: Option<T>, minimum: Option<T>) -> bool {
    match (value, minimum) {
        (Some(value), Some(minimum)) => value >= minimum,
        _ => true,
    }
}

fn at_most<T: PartialOrd>(value: Option<T>, maximum: Option<T>) -> bool {
    match (value, maximum) {
        (Some(value), Some(maximum)) => value <= maximum,
        _ => true,
    }
}

/// Outcome of checking one observation against a ruleset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Checks that failed, in [`RuleCheck::ALL`] order.
    pub failed: Vec<RuleCheck>,
}

impl Verdict {
    pub fn is_flyable(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `true` when every configured threshold of `ruleset` is met.
///
/// # Examples
///
/// ```
/// use metar_archive::{evaluate, parse, Ruleset};
///
/// let observation = parse("202501020900 METAR EGKA 020900Z 24008KT 9999 FEW025 18/12 Q1015").unwrap();
/// let ruleset = Ruleset::builder().name("default").min_visibility(5000).max_wind_speed(14).build();
/// assert!(evaluate(&observation, &ruleset));
/// ```
pub fn evaluate(observation: &Observation, ruleset: &Ruleset) -> bool {
    RuleCheck::ALL
        .iter()
        .all(|check| check.passes(observation, ruleset))
}

/// Like [`evaluate`], but reports which checks failed.
pub fn assess(observation: &Observation, ruleset: &Ruleset) -> Verdict {
    Verdict {
        failed: RuleCheck::ALL
            .into_iter()
            .filter(|check| !check.passes(observation, ruleset))
            .collect(),
    }
}

/// Fixed visibility/ceiling classification, independent of any ruleset.
pub fn is_vfr(observation: &Observation) -> bool {
    at_least(observation.visibility(), Some(VFR_MIN_VISIBILITY))
        && at_least(observation.ceiling(), Some(VFR_MIN_CEILING))
}
