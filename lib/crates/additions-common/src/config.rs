use serde::Deserialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Loopback management endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address (default: 127.0.0.1:5000)
    /// The endpoint exposes install/remove/start/stop without authentication,
    /// so it must only ever bind to a loopback interface.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerConfigError {
    #[error("refusing to listen on non-loopback address {0}")]
    NotLoopback(SocketAddr),
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr) -> Result<Self, ServerConfigError> {
        let config = Self { listen_addr };
        config.validate()?;
        Ok(config)
    }

    /// Reject anything that is not bound to loopback.
    pub fn validate(&self) -> Result<(), ServerConfigError> {
        if self.listen_addr.ip().is_loopback() {
            Ok(())
        } else {
            Err(ServerConfigError::NotLoopback(self.listen_addr))
        }
    }
}

pub fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}
