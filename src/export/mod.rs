//! Turning resolved images into PNG files

pub mod materialize;
pub mod path;
pub mod walker;

// Re-export commonly used items
pub use materialize::{infer_layout, materialize, materialize_with, ChannelLayout, ExportRecord, MaterializeOptions};
pub use path::output_path;
pub use walker::{
    export_images, export_images_with, scan, walk, CancelToken, ExportFailure, ExportOptions,
    ExportReport, FailurePolicy, FileNaming, ImageRef,
};
