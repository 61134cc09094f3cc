pub mod body_extractor;
pub mod common;
pub mod mime;
pub mod processor_base;

// Re-export commonly used items
pub use body_extractor::extract_body;
pub use common::{ClassificationRecord, ContentNode, ProcessingResult, RawMessage};
pub use processor_base::{MessageSource, JobTracker};
