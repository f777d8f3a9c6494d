//! Per-bundle manifest (`rules.json`) and the closed set of activation kinds.
//!
//! Parsing is lenient about missing fields (they default) but strict about
//! malformed JSON or wrongly typed fields, which the loader reports as
//! `LoadError::Invalid`.

use serde::Deserialize;

/// Manifest file name inside every bundle directory.
pub const MANIFEST_FILE: &str = "rules.json";

pub const DEFAULT_DESCRIPTION: &str = "No description";
pub const DEFAULT_VERSION: &str = "unknown";

/// How a bundle is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationKind {
    /// Script run through the configured interpreter (`based_on: "python"`).
    Process,
    /// Native binary shipped in the bundle (`based_on: "exe"`).
    Executable,
    /// Local hypertext document rendered by the shell (`based_on: "html"`).
    Document,
    /// Nothing but a URL (`based_on: "url"`).
    Remote,
    /// Anything else, including an absent discriminator. Listing works;
    /// activation fails with `UnsupportedKind`.
    Unrecognized(String),
}

impl ActivationKind {
    #[must_use]
    pub fn from_based_on(value: &str) -> Self {
        match value {
            "python" => Self::Process,
            "exe" => Self::Executable,
            "html" => Self::Document,
            "url" => Self::Remote,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_based_on(&self) -> &str {
        match self {
            Self::Process => "python",
            Self::Executable => "exe",
            Self::Document => "html",
            Self::Remote => "url",
            Self::Unrecognized(other) => other,
        }
    }

    /// Whether activation owns a child process that `stop` can terminate.
    #[must_use]
    pub fn spawns_process(&self) -> bool {
        matches!(self, Self::Process | Self::Executable)
    }

    /// Entry point used when the manifest omits `start`.
    #[must_use]
    pub fn default_entry_point(&self) -> Option<&'static str> {
        match self {
            Self::Process => Some("app.py"),
            Self::Document => Some("index.html"),
            _ => None,
        }
    }
}

/// On-disk shape. Every field is optional; wrong types are a parse error.
#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    based_on: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    logo: Option<String>,
}

/// Resolved bundle descriptor with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub description: String,
    pub version: String,
    pub activation_kind: ActivationKind,
    /// Path relative to the bundle directory, or a URL for `Remote`.
    pub entry_point: Option<String>,
    pub companion_url: Option<String>,
    pub logo: Option<String>,
}

impl Manifest {
    /// Parse manifest JSON, applying field defaults.
    ///
    /// # Errors
    ///
    /// Returns the serde error if the content is not a JSON object with
    /// string-typed fields.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let raw: RawManifest = serde_json::from_str(raw)?;
        let activation_kind = ActivationKind::from_based_on(raw.based_on.as_deref().unwrap_or(""));
        let entry_point = non_empty(raw.start).or_else(|| {
            activation_kind
                .default_entry_point()
                .map(str::to_string)
        });
        Ok(Self {
            description: non_empty(raw.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            version: non_empty(raw.version).unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            activation_kind,
            entry_point,
            companion_url: non_empty(raw.link),
            logo: non_empty(raw.logo),
        })
    }

    /// Sentinel manifest for a bundle whose descriptor is missing or unreadable.
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            version: DEFAULT_VERSION.to_string(),
            activation_kind: ActivationKind::Unrecognized(String::new()),
            entry_point: None,
            companion_url: None,
            logo: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
