//! Server configuration.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use opsync_openproject::OpenProjectConfig;

use crate::notify::{NotifierConfig, TelegramConfig};

/// Sync cadence used when none (or zero) is configured.
pub const DEFAULT_SYNC_INTERVAL_MINUTES: i64 = 30;

/// Upper bound for the sync interval (one year).
pub const MAX_SYNC_INTERVAL_MINUTES: i64 = 365 * 24 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind host.
    pub host: String,

    /// HTTP bind port.
    pub port: u16,

    /// SQLite database path; `None` keeps tasks in memory.
    pub database: Option<PathBuf>,

    /// Periodic sync cadence.
    pub sync_interval: Duration,

    pub openproject: OpenProjectConfig,

    pub telegram: TelegramConfig,

    pub notifier: NotifierConfig,
}

impl Config {
    /// Socket address the HTTP server binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Convert a minute count into a sync interval.
    ///
    /// Zero falls back to the default cadence; anything else is clamped
    /// between one minute and [`MAX_SYNC_INTERVAL_MINUTES`].
    pub fn sync_interval_from_minutes(minutes: i64) -> Duration {
        let minutes = if minutes == 0 {
            DEFAULT_SYNC_INTERVAL_MINUTES
        } else {
            minutes.clamp(1, MAX_SYNC_INTERVAL_MINUTES)
        };
        Duration::from_secs(minutes.unsigned_abs().saturating_mul(60))
    }

    /// Apply one request timeout to every outbound HTTP client.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.openproject.request_timeout = timeout;
        self.telegram.request_timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database: None,
            sync_interval: Self::sync_interval_from_minutes(DEFAULT_SYNC_INTERVAL_MINUTES),
            openproject: OpenProjectConfig::default(),
            telegram: TelegramConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_interval_clamping() {
        assert_eq!(Config::sync_interval_from_minutes(5), Duration::from_secs(300));
        assert_eq!(Config::sync_interval_from_minutes(0), Duration::from_secs(1800));
        assert_eq!(Config::sync_interval_from_minutes(-3), Duration::from_secs(60));
    }

    #[test]
    fn test_sync_interval_caps_huge_values() {
        let cap = Duration::from_secs(MAX_SYNC_INTERVAL_MINUTES as u64 * 60);
        assert_eq!(Config::sync_interval_from_minutes(i64::MAX), cap);
        assert_eq!(
            Config::sync_interval_from_minutes(MAX_SYNC_INTERVAL_MINUTES + 1),
            cap
        );
        assert_eq!(Config::sync_interval_from_minutes(i64::MIN), Duration::from_secs(60));
    }

    #[test]
    fn test_default_bind_addr() {
        let addr = Config::default().bind_addr().unwrap();
        assert_eq!(addr.port(), 3000);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_request_timeout_applies_to_all_clients() {
        let config = Config::default().with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.openproject.request_timeout, Duration::from_secs(5));
        assert_eq!(config.telegram.request_timeout, Duration::from_secs(5));
    }
}
