use serde::{Deserialize, Serialize};

/// One row of the installed-extensions listing.
///
/// Field names match the JSON served at `GET /api/extensions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub name: String,
    /// Catalog path, relative to the bundle root (`"<name>/"`).
    pub path: String,
    pub description: String,
    pub version: String,
    /// Activation discriminator as written in the manifest, empty when unknown.
    pub based_on: String,
    pub running: bool,
    /// Set when the manifest is missing or unreadable; the entry is still listed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Success flag plus a human-readable message.
///
/// Every mutating operation crosses the management boundary as one of these,
/// so presentation code never needs its own error recovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationReply {
    pub success: bool,
    pub message: String,
}

impl OperationReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// A bundle offered for installation from a remote archive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteEntry {
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
}

/// Tail of a bundle's captured process output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogTail {
    pub name: String,
    pub lines: Vec<String>,
}
