//! ID-card request lifecycle: listing the pending, approved, rejected, and history
//! collections, and moving a pending request to its decided collection.

pub mod domain;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{RecordId, RequestRecord, RequestStatus};
pub use router::{request_router, StatusUpdate};
pub use service::{RequestServiceError, RequestWorkflow};
