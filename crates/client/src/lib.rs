//! HTTPS client for the CoveSync appliance.
//!
//! Pairs the resumable upload core with a reqwest transport and the file
//! operations of the REST API. Start with [`ClientConfig`] and
//! [`FileClient`]:
//!
//! ```no_run
//! # async fn example() -> Result<(), covesync_client::ClientError> {
//! use covesync_client::{ClientConfig, FileClient};
//!
//! let client = FileClient::new(ClientConfig::new("share.example.com", "token"))?;
//! let file = client.metadata("7b3a9d8e", &["id", "etag"]).await?;
//! let etag = client
//!     .upload_path(&file.id, &[file.etag.clone()], "report.pdf".as_ref())
//!     .await?;
//! # let _ = etag;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod files;
pub mod http;

pub use config::ClientConfig;
pub use files::{FileClient, FileContent};
pub use http::HttpTransport;

// The pieces callers need to drive uploads without importing the lower
// crates themselves.
pub use covesync_protocol::types::{File, FileLocation};
pub use covesync_transfer::{BufferSource, ChunkSource, FileSource, ReaderSource};
pub use covesync_upload::{ClientError, RetryConfig, UploadEvent};
