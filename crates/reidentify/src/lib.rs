//! Faculty ID-card request workflow.
//!
//! Requests arrive in the pending collection from an external intake process. Reviewers
//! approve them into the print queue or reject them, and the faculty directory answers
//! whether a faculty number is on file.

pub mod config;
pub mod error;
pub mod faculty;
pub mod requests;
pub mod store;
pub mod telemetry;
