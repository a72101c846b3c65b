//! Content-type identity.

use crate::error::{RegistryError, RegistryResult};
use std::fmt;

/// Identity of a content type: name plus major.minor version, written
/// `<name>-<major>.<minor>` (e.g. `Quiz-1.0`).
///
/// The name itself may contain dashes; the version is whatever follows
/// the last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType {
    name: String,
    major: u32,
    minor: u32,
}

impl ContentType {
    /// Creates a content type from its parts.
    pub fn new(name: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            name: name.into(),
            major,
            minor,
        }
    }

    /// Parses the `<name>-<major>.<minor>` form.
    pub fn parse(raw: &str) -> RegistryResult<Self> {
        let bad = || RegistryError::BadContentType(raw.to_string());

        let (name, version) = raw.rsplit_once('-').ok_or_else(bad)?;
        if name.is_empty() {
            return Err(bad());
        }
        let (major, minor) = version.split_once('.').ok_or_else(bad)?;
        Ok(Self {
            name: name.to_string(),
            major: major.parse().map_err(|_| bad())?,
            minor: minor.parse().map_err(|_| bad())?,
        })
    }

    /// The content type's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `(major, minor)` version pair.
    pub fn version(&self) -> (u32, u32) {
        (self.major, self.minor)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.major, self.minor)
    }
}

/// Content metadata resolved per document from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMetadata {
    /// The document's declared main content type.
    pub main_content_type: ContentType,
    /// The sync protocol version the content type requires. The gateway
    /// supports exactly one version and rejects mismatches.
    pub required_protocol_version: u16,
}
