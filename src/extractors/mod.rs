// src/extractors/mod.rs
pub mod timetable;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use timetable::{
    DirectionalRecordSet, Extraction, ExtractionStats, PageSource, TimetableExtractor,
};
