//! Resumable chunked upload protocol core.
//!
//! This crate implements the appliance's upload protocol against an abstract
//! [`Transport`], so the whole state machine is testable without sockets.
//! The HTTPS transport lives in `covesync-client`.
//!
//! # Pipeline
//!
//! 1. **Begin**: open a session on the file's content route, asserting the
//!    caller's known entity versions (`UploadSession::begin`)
//! 2. **Send**: stream fixed-size chunks in strict offset order
//!    (`UploadEngine::run`)
//! 3. **Reconcile**: after any ambiguous transport failure, ask the server
//!    how many bytes it durably holds and continue from there (`Reconciler`)
//! 4. **Finalize**: the last chunk carries a concrete total; its response
//!    returns the new entity version
//!
//! No request is ever retried blindly: a write whose outcome is unknown goes
//! through reconciliation or not at all.

pub mod engine;
pub mod error;
pub mod preconditions;
pub mod progress;
pub mod reconcile;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;
pub mod transport;

// Re-export primary types for convenience.
pub use engine::{UploadEngine, UploadOptions, UploadState};
pub use error::ClientError;
pub use preconditions::Access;
pub use progress::UploadEvent;
pub use reconcile::{Reconciler, RetryConfig};
pub use session::UploadSession;
pub use transport::{Method, Request, Response, Transport};
