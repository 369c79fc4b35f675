//! Extraction and processing pipeline for area-specific project status
//! reports.
//!
//! Documents (PDF, DOCX, XLSX) are submitted for a declared business
//! area, decoded into a format-neutral view, routed to that area's
//! extractor, validated against a controlled vocabulary and persisted as
//! typed KPI and milestone records. Processing is asynchronous: intake
//! returns a submission id immediately and clients poll its state.

pub mod api;
pub mod config;
pub mod extract;
pub mod loader;
pub mod models;
pub mod persist;
pub mod pipeline;
pub mod tracker;
pub mod validate;
