mod analysis;
pub mod collector;
mod error;
mod metar_archive;
pub mod parser;
pub mod rules;
pub mod source;
pub mod store;
mod types;
mod utils;
pub mod windows;

pub use error::MetarArchiveError;
pub use metar_archive::*;

pub use analysis::{record_verdicts, AnalysisRow};
pub use collector::error::CollectError;
pub use collector::merge::{merge_windows, MergePolicy};
pub use collector::{Collector, RetryPolicy};
pub use parser::error::ParseError;
pub use parser::parse;
pub use rules::error::RulesetError;
pub use rules::ruleset::{load_rulesets, Ruleset};
pub use rules::{assess, evaluate, is_vfr, RuleCheck, Verdict};
pub use source::error::FetchError;
pub use source::ogimet::OgimetSource;
pub use source::MetarSource;
pub use store::error::{CacheError, RecordError};
pub use store::file::FileStore;
pub use store::memory::MemoryStore;
pub use store::{ObservationKey, ObservationStore, VerdictKey, VerdictRecord};
pub use windows::error::WindowError;
pub use windows::{resolve_windows, OperatingHours, DEFAULT_TIMEZONE};

pub use types::fetch_window::FetchWindow;
pub use types::observation::*;
pub use types::period::{AnyDate, DateRange};
pub use types::record::ObservationRecord;
