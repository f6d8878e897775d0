mod pipeline_config;
mod schema;
mod series;

pub use pipeline_config::{PipelineConfig, ScaleStage};
pub use schema::{OhlcColumns, QuoteColumns, ScaleTarget, SchemaKind, SeriesSchema};
pub use series::{SeriesRecord, SeriesTable};
