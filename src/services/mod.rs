pub mod csv_loader;
pub mod csv_writer;
pub mod features;
pub mod normalizer;
pub mod pipeline;
pub mod series_cleaner;
pub mod series_merger;

pub use csv_loader::{load_series, load_series_file, LoadReport};
pub use csv_writer::write_merged_csv;
pub use normalizer::{min_max_scale, MinMaxScaler};
pub use pipeline::{
    discover_input_files, run_pipeline, run_pipeline_concurrent, write_output, FileOutcome,
    PipelineResult, PipelineStats, ProgressCallback,
};
pub use series_cleaner::{clean_series, CleanReport};
pub use series_merger::{merge_series, MergeReport, MergedTable};
