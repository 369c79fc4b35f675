//! Domain types shared across the pipeline stages.

pub mod enums;
pub mod records;
pub mod submission;
