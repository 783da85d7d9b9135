//! Gateway to the external image analysis service.

mod client;
mod report;
mod upload;

pub use client::{AnalysisClient, AnalysisResponse};
pub use report::AnalysisReport;
pub use upload::UploadedFile;
