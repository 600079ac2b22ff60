//! Configuration for pqchat session establishment

use std::time::Duration;

/// Configuration for handshakes driven through [`crate::transport::PqTransport`]
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Upper bound on the whole handshake.
    /// `None` leaves the stream's own behaviour in charge; the core itself
    /// never times out.
    pub handshake_timeout: Option<Duration>,

    /// Whether to log each handshake step at debug level
    pub verbose_logging: bool,
}

impl SessionConfig {
    /// Create a configuration with no timeout and quiet logging
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Enable verbose logging
    pub fn with_verbose_logging(mut self) -> Self {
        self.verbose_logging = true;
        self
    }
}

/// Builder for SessionConfig
#[derive(Default)]
pub struct SessionConfigBuilder {
    handshake_timeout: Option<Duration>,
    verbose_logging: bool,
}

impl SessionConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Enable verbose logging
    pub fn verbose(mut self) -> Self {
        self.verbose_logging = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SessionConfig, &'static str> {
        if self.handshake_timeout == Some(Duration::ZERO) {
            return Err("handshake timeout must be non-zero");
        }

        Ok(SessionConfig {
            handshake_timeout: self.handshake_timeout,
            verbose_logging: self.verbose_logging,
        })
    }
}
