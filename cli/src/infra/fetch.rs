//! Infrastructure implementation of the `ArchiveFetcher` port.

use std::io::Read;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::application::ports::ArchiveFetcher;
use crate::domain::bundle::hex_encode;

/// Largest archive accepted from a remote source.
pub const MAX_ARCHIVE_BYTES: u64 = 100 * 1024 * 1024;

/// Downloads archives over HTTP(S) with `ureq`, off the async runtime.
#[derive(Debug, Clone)]
pub struct UreqFetcher {
    user_agent: String,
}

impl UreqFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_agent: format!("additions/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveFetcher for UreqFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let url = url.to_string();
        let user_agent = self.user_agent.clone();
        tokio::task::spawn_blocking(move || download(&url, &user_agent))
            .await
            .context("download task failed")?
    }
}

fn download(url: &str, user_agent: &str) -> Result<Vec<u8>> {
    let response = match ureq::get(url).set("User-Agent", user_agent).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, _)) => anyhow::bail!("HTTP {code} from {url}"),
        Err(e) => return Err(anyhow::Error::new(e).context(format!("cannot reach {url}"))),
    };

    let mut data = Vec::new();
    response
        .into_reader()
        .take(MAX_ARCHIVE_BYTES + 1)
        .read_to_end(&mut data)
        .context("failed to read archive")?;
    anyhow::ensure!(
        data.len() as u64 <= MAX_ARCHIVE_BYTES,
        "archive exceeds {} MiB",
        MAX_ARCHIVE_BYTES / (1024 * 1024)
    );

    let digest = hex_encode(&Sha256::digest(&data));
    tracing::debug!(url, bytes = data.len(), sha256 = %digest, "archive fetched");
    Ok(data)
}
