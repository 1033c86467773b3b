//! The decoded form of a single METAR report and the value types it is made of.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Direction the wind is blowing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindDirection {
    /// Compass heading in degrees, `0..=360`.
    Heading(u16),
    /// Reported as `VRB`.
    Variable,
}

impl fmt::Display for WindDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindDirection::Heading(degrees) => write!(f, "{:03}", degrees),
            WindDirection::Variable => write!(f, "VRB"),
        }
    }
}

impl FromStr for WindDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "VRB" {
            return Ok(WindDirection::Variable);
        }
        match s.parse::<u16>() {
            Ok(degrees) if degrees <= 360 => Ok(WindDirection::Heading(degrees)),
            _ => Err(()),
        }
    }
}

/// Sky coverage of a single cloud layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CloudCover {
    /// `FEW`, 1-2 oktas.
    Few,
    /// `SCT`, 3-4 oktas.
    Scattered,
    /// `BKN`, 5-7 oktas.
    Broken,
    /// `OVC`, 8 oktas.
    Overcast,
}

impl CloudCover {
    /// The three-letter METAR abbreviation.
    ///
    /// ```
    /// use metar_archive::CloudCover;
    ///
    /// assert_eq!(CloudCover::Broken.code(), "BKN");
    /// ```
    pub fn code(self) -> &'static str {
        match self {
            CloudCover::Few => "FEW",
            CloudCover::Scattered => "SCT",
            CloudCover::Broken => "BKN",
            CloudCover::Overcast => "OVC",
        }
    }

    /// Inverse of [`code`](Self::code). Returns `None` for anything that is
    /// not `FEW`, `SCT`, `BKN` or `OVC`, including `NSC` and `SKC`.
    ///
    /// ```
    /// use metar_archive::CloudCover;
    ///
    /// assert_eq!(CloudCover::from_code("OVC"), Some(CloudCover::Overcast));
    /// assert_eq!(CloudCover::from_code("NSC"), None);
    /// ```
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "FEW" => Some(CloudCover::Few),
            "SCT" => Some(CloudCover::Scattered),
            "BKN" => Some(CloudCover::Broken),
            "OVC" => Some(CloudCover::Overcast),
            _ => None,
        }
    }

    /// Broken and overcast layers are the ones that form a ceiling.
    pub fn forms_ceiling(self) -> bool {
        matches!(self, CloudCover::Broken | CloudCover::Overcast)
    }
}

/// One reported cloud layer, e.g. `BKN020`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CloudLayer {
    pub cover: CloudCover,
    /// Height above ground in hundreds of feet, as written in the report.
    pub height_hundreds_ft: u16,
}

impl CloudLayer {
    pub fn new(cover: CloudCover, height_hundreds_ft: u16) -> Self {
        Self {
            cover,
            height_hundreds_ft,
        }
    }

    pub fn height_ft(&self) -> u32 {
        u32::from(self.height_hundreds_ft) * 100
    }
}

impl fmt::Display for CloudLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.cover.code(), self.height_hundreds_ft)
    }
}

/// Intensity prefix of a weather group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intensity {
    /// `-`
    Light,
    /// `+`
    Heavy,
}

/// The two-letter phenomenon codes the decoder recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhenomenonCode {
    Rain,
    Snow,
    Mist,
    Fog,
    Haze,
    Thunderstorm,
    Drizzle,
    Shower,
    IcePellets,
    Hail,
    SmallHail,
    UnknownPrecipitation,
}

impl PhenomenonCode {
    pub const ALL: [PhenomenonCode; 12] = [
        PhenomenonCode::Rain,
        PhenomenonCode::Snow,
        PhenomenonCode::Mist,
        PhenomenonCode::Fog,
        PhenomenonCode::Haze,
        PhenomenonCode::Thunderstorm,
        PhenomenonCode::Drizzle,
        PhenomenonCode::Shower,
        PhenomenonCode::IcePellets,
        PhenomenonCode::Hail,
        PhenomenonCode::SmallHail,
        PhenomenonCode::UnknownPrecipitation,
    ];

    pub fn code(self) -> &'static str {
        match self {
            PhenomenonCode::Rain => "RA",
            PhenomenonCode::Snow => "SN",
            PhenomenonCode::Mist => "BR",
            PhenomenonCode::Fog => "FG",
            PhenomenonCode::Haze => "HZ",
            PhenomenonCode::Thunderstorm => "TS",
            PhenomenonCode::Drizzle => "DZ",
            PhenomenonCode::Shower => "SH",
            PhenomenonCode::IcePellets => "PL",
            PhenomenonCode::Hail => "GR",
            PhenomenonCode::SmallHail => "GS",
            PhenomenonCode::UnknownPrecipitation => "UP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.code() == code)
    }
}

/// A weather group such as `-RA`, `+TS` or `VCSH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeatherPhenomenon {
    pub intensity: Option<Intensity>,
    /// `VC` qualifier: observed in the vicinity, not at the station.
    pub vicinity: bool,
    pub code: PhenomenonCode,
}

impl WeatherPhenomenon {
    /// Decodes the weather group at the start of `token`. Trailing characters
    /// (e.g. the `RA` of `SHRA`) are not examined.
    pub fn from_token(token: &str) -> Option<Self> {
        let (intensity, rest) = match token.as_bytes().first()? {
            b'-' => (Some(Intensity::Light), &token[1..]),
            b'+' => (Some(Intensity::Heavy), &token[1..]),
            _ => (None, token),
        };
        let (vicinity, rest) = match rest.strip_prefix("VC") {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let code = PhenomenonCode::from_code(rest.get(..2)?)?;
        Some(Self {
            intensity,
            vicinity,
            code,
        })
    }

    /// Whether a configured code refers to this phenomenon. Codes compare by
    /// their full text, so `RA` does not match `-RA` and `TS` does not match
    /// `VCTS`.
    pub fn matches(&self, configured: &str) -> bool {
        configured == self.to_string()
    }
}

impl fmt::Display for WeatherPhenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.intensity {
            Some(Intensity::Light) => write!(f, "-")?,
            Some(Intensity::Heavy) => write!(f, "+")?,
            None => {}
        }
        if self.vicinity {
            write!(f, "VC")?;
        }
        write!(f, "{}", self.code.code())
    }
}

/// Air temperature and dewpoint, always decoded from the same group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temperatures {
    pub air: i32,
    pub dewpoint: i32,
}

/// One decoded METAR report.
///
/// Observations come either from [`crate::parse`] or from a stored
/// [`crate::ObservationRecord`]. Cloud base and ceiling are derived from the
/// cloud layers on every call and have no storage of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub(crate) station: String,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) wind_direction: Option<WindDirection>,
    pub(crate) wind_speed: Option<u32>,
    pub(crate) wind_gust: Option<u32>,
    pub(crate) visibility: Option<u32>,
    pub(crate) cloud_layers: Vec<CloudLayer>,
    pub(crate) weather: Option<Vec<WeatherPhenomenon>>,
    pub(crate) qnh: Option<u32>,
    pub(crate) temperatures: Option<Temperatures>,
    pub(crate) raw: String,
}

impl Observation {
    pub fn station(&self) -> &str {
        &self.station
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn wind_direction(&self) -> Option<WindDirection> {
        self.wind_direction
    }

    /// Knots.
    pub fn wind_speed(&self) -> Option<u32> {
        self.wind_speed
    }

    /// Knots.
    pub fn wind_gust(&self) -> Option<u32> {
        self.wind_gust
    }

    /// Meters. `None` means not reported.
    pub fn visibility(&self) -> Option<u32> {
        self.visibility
    }

    pub fn cloud_layers(&self) -> &[CloudLayer] {
        &self.cloud_layers
    }

    /// Height in feet of the first reported layer of any coverage.
    pub fn cloud_base(&self) -> Option<u32> {
        self.cloud_layers.first().map(CloudLayer::height_ft)
    }

    /// Height in feet of the first broken or overcast layer.
    pub fn ceiling(&self) -> Option<u32> {
        self.cloud_layers
            .iter()
            .find(|layer| layer.cover.forms_ceiling())
            .map(CloudLayer::height_ft)
    }

    /// `None` when weather was not reported at all, `Some(&[])` when the
    /// report explicitly states there is no significant weather.
    pub fn weather(&self) -> Option<&[WeatherPhenomenon]> {
        self.weather.as_deref()
    }

    /// Pressure setting in hPa.
    pub fn qnh(&self) -> Option<u32> {
        self.qnh
    }

    pub fn temperatures(&self) -> Option<Temperatures> {
        self.temperatures
    }

    /// Degrees Celsius.
    pub fn temperature(&self) -> Option<i32> {
        self.temperatures.map(|t| t.air)
    }

    /// Degrees Celsius.
    pub fn dewpoint(&self) -> Option<i32> {
        self.temperatures.map(|t| t.dewpoint)
    }

    /// The report exactly as it was received.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
