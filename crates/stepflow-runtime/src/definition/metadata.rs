//! Graph metadata.

use jiff::Timestamp;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Graph metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Graph name (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Graph description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Graph version (semver, optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Tags for organization.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Last update timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}
