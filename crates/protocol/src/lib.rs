//! Wire grammar and entity types for the CoveSync appliance API.
//!
//! Everything here is pure data: route builders, header grammar for the
//! resumable upload protocol, and the JSON entities the appliance returns.
//! No I/O happens in this crate.

pub mod constants;
pub mod range;
pub mod types;

pub use range::{
    RangeError, UPLOAD_BEGIN_RANGE, UPLOAD_STATUS_RANGE, chunk_content_range,
    parse_received_range,
};
pub use types::{ErrorBody, File, FileLocation};
