mod download;
mod metadata;

pub use download::run_download;
pub use metadata::run_metadata;
