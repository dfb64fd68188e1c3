pub mod cli;
pub mod fetch;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod stats;
pub mod ui;
pub mod units;
pub mod writer;

pub use cli::{Cli, Commands};
pub use pipeline::{ImportSummary, Pipeline, PipelineConfig, SkippedUnit};
pub use ui::{LogUi, Phase, SilentUi, Ui, UiApp};
pub use units::FetchUnit;
