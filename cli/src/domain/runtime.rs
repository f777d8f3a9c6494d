//! Runtime status, activation outcomes, and view-open requests.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Per-bundle run state. There are no intermediate states: activation either
/// completes and flips to `Running` or fails and stays `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Stopped,
    Running,
}

impl RunStatus {
    #[must_use]
    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("stopped"),
            Self::Running => f.write_str("running"),
        }
    }
}

/// Successful result of `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// A child process was spawned and is now tracked.
    Spawned { pid: Option<u32> },
    /// A document or URL was handed to the shell. No process is owned.
    Opened { target: String },
    /// Already running; the companion view (if any) was re-opened and the
    /// existing handle kept.
    AlreadyRunning { pid: Option<u32> },
}

impl Activation {
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Spawned { pid } | Self::AlreadyRunning { pid } => *pid,
            Self::Opened { .. } => None,
        }
    }
}

/// What the shell should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    /// Absolute path of a local document.
    Document(PathBuf),
    Url(String),
}

impl ViewTarget {
    /// Location string suitable for a browser tab or a system opener.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Document(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}

/// A request for the presentation layer to open a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    /// Tab label; the bundle name.
    pub label: String,
    pub target: ViewTarget,
}
