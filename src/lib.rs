//! Batted-ball quality metrics over Statcast-style event data.
//!
//! Load events ([`data::loader`]), derive metrics ([`metrics`]), select
//! events with three-valued predicates ([`predicate`]) and summarise the
//! result ([`subset`]).  [`report`] builds player and league views on top.

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod predicate;
pub mod report;
pub mod subset;

pub use config::{EngineConfig, LaunchAngleRange};
pub use data::loader::{CellValue, load_file, load_table};
pub use data::model::{BattedBallDataset, BattedBallEvent, Hand, Handedness};
pub use error::ConfigError;
pub use metrics::Metric;
pub use predicate::{CompareOp, NamedPredicate, Predicate, Truth};
pub use subset::{Binning, Histogram, Subset, SubsetEngine, Summary, SummaryStats};
