pub mod aggregate;
pub mod alignment;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod types;

pub use aggregate::{
    AggregationMode, Aggregator, RetrievalStatistic, Statistic, TerStatistic, WilStatistic,
};
pub use alignment::edit_distance::align;
pub use alignment::shift::{optimize, Shift, ShiftLimits, ShiftedAlignment};
pub use config::{MetricsConfig, MultiReferencePolicy};
pub use error::MetricError;
pub use metrics::retrieval::{r_precision, rank_by_scores, EmptyTargetAction, RPrecision};
pub use metrics::ter::TerScore;
pub use metrics::wil::WilScore;
pub use pipeline::builder::ScorerBuilder;
pub use pipeline::runtime::Scorer;
pub use pipeline::traits::{SequenceAligner, ShiftSearch, Tokenizer};
pub use types::{EditOp, EditScript, Rate, TokenSequence};
