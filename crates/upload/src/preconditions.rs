//! Conditional-request guard.
//!
//! The appliance protects destructive writes with `If-Match`. The guard
//! refuses to build an overwrite or delete request without at least one
//! asserted version, so the mistake surfaces before any bytes move.

use covesync_protocol::constants::{IF_MATCH, IF_NONE_MATCH};

use crate::error::ClientError;

/// What the caller is about to do to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Fetch content or metadata.
    Read,
    /// Create a new object; nothing exists to assert a version against.
    Create,
    /// Replace existing content.
    Overwrite,
    /// Remove the object.
    Delete,
}

impl Access {
    fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Create => "create",
            Access::Overwrite => "overwrite",
            Access::Delete => "delete",
        }
    }
}

/// Rejects `access` when it needs a version assertion and has none.
///
/// Overwrite and delete fail with [`ClientError::PreconditionMissing`] when
/// no version is asserted. Runs before any request is built, so the mistake
/// never reaches the wire.
pub fn check(access: Access, versions: &[String]) -> Result<(), ClientError> {
    match access {
        Access::Overwrite | Access::Delete if versions.is_empty() => {
            Err(ClientError::PreconditionMissing(format!(
                "{} requires at least one expected version",
                access.as_str()
            )))
        }
        _ => Ok(()),
    }
}

/// Renders `versions` into conditional headers for `access`.
///
/// Reads turn versions into `If-None-Match` (one header per version), writes
/// into `If-Match`. Create ignores versions entirely; nothing exists yet to
/// assert against.
pub fn conditional_headers(
    access: Access,
    versions: &[String],
) -> Result<Vec<(&'static str, String)>, ClientError> {
    check(access, versions)?;
    let headers = match access {
        Access::Read => versions
            .iter()
            .map(|v| (IF_NONE_MATCH, v.clone()))
            .collect(),
        Access::Create => Vec::new(),
        Access::Overwrite | Access::Delete => {
            versions.iter().map(|v| (IF_MATCH, v.clone())).collect()
        }
    };
    Ok(headers)
}
