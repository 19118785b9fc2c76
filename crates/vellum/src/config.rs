//! Client configuration.

use std::time::Duration;

use vellum_core::DEFAULT_ADMIN_IDENTITY;
use vellum_repo::Timeouts;

use crate::error::{ClientError, Result};

/// Default group whose entries are always preserved.
pub const DEFAULT_ADMINISTRATORS_GROUP: &str = "administrators";

/// Default group reported as all users.
pub const DEFAULT_EVERYONE_GROUP: &str = "members";

/// Sessions unused for this long are closed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// How often idle sessions are looked for.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Configuration for the [`Client`](crate::Client).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The distinguished administrator identity. Its case is preserved.
    pub admin_identity: String,
    /// Group whose local entries are never rewritten.
    pub administrators_group: String,
    /// Group reported as `*` when listing permissions.
    pub everyone_group: String,
    /// Idle time after which a cached session is closed.
    pub idle_timeout: Duration,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
    /// Connect and read timeouts handed to the connector.
    pub timeouts: Timeouts,
    /// Update the folder's modification time after a permission change.
    pub touch_modified_on_change: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            admin_identity: DEFAULT_ADMIN_IDENTITY.to_string(),
            administrators_group: DEFAULT_ADMINISTRATORS_GROUP.to_string(),
            everyone_group: DEFAULT_EVERYONE_GROUP.to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            timeouts: Timeouts::default(),
            touch_modified_on_change: true,
        }
    }
}

impl ClientConfig {
    pub fn with_admin_identity(mut self, admin: impl Into<String>) -> Self {
        self.admin_identity = admin.into();
        self
    }

    pub fn with_administrators_group(mut self, group: impl Into<String>) -> Self {
        self.administrators_group = group.into();
        self
    }

    pub fn with_everyone_group(mut self, group: impl Into<String>) -> Self {
        self.everyone_group = group.into();
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_touch_modified(mut self, enabled: bool) -> Self {
        self.touch_modified_on_change = enabled;
        self
    }

    /// Check the configuration before a client is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.admin_identity.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "the administrator identity can't be empty".into(),
            ));
        }
        if self.administrators_group.trim().is_empty() {
            return Err(ClientError::InvalidArgument(
                "the administrators group can't be empty".into(),
            ));
        }

        let durations = [
            ("idle timeout", self.idle_timeout),
            ("sweep interval", self.sweep_interval),
            ("connect timeout", self.timeouts.connect),
            ("read timeout", self.timeouts.read),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(ClientError::InvalidArgument(format!("the {name} must be positive")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.admin_identity, "Administrator");
        assert_eq!(config.idle_timeout, Duration::from_secs(3600));
        assert_eq!(config.sweep_interval, Duration::from_secs(1800));
        assert_eq!(config.timeouts.connect, Duration::from_secs(15));
        assert!(config.touch_modified_on_change);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_admin() {
        let config = ClientConfig::default().with_admin_identity("  ");
        assert!(matches!(config.validate(), Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_zero_durations() {
        let config = ClientConfig::default().with_sweep_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(ClientError::InvalidArgument(_))));

        let config = ClientConfig::default().with_timeouts(Timeouts {
            connect: Duration::from_secs(1),
            read: Duration::ZERO,
        });
        assert!(matches!(config.validate(), Err(ClientError::InvalidArgument(msg)) if msg.contains("read")));
    }
}
