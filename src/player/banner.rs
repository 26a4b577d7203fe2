//! Transient error banner: one instance at most, dismissed after a timeout.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ErrorBanner {
    message: Option<String>,
    expires_at: Option<Instant>,
    timeout: Duration,
}

impl ErrorBanner {
    pub fn new(timeout: Duration) -> Self {
        Self {
            message: None,
            expires_at: None,
            timeout,
        }
    }

    /// Show `message`, replacing any banner already on screen and restarting
    /// the dismissal timer.
    pub fn show(&mut self, message: &str, now: Instant) {
        self.message = Some(message.to_string());
        self.expires_at = Some(now + self.timeout);
    }

    pub fn sweep(&mut self, now: Instant) {
        if let Some(expiry) = self.expires_at
            && now >= expiry
        {
            self.message = None;
            self.expires_at = None;
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_expires() {
        let mut banner = ErrorBanner::new(Duration::from_millis(5000));
        let now = Instant::now();
        banner.show("boom", now);

        banner.sweep(now + Duration::from_millis(4999));
        assert_eq!(banner.message(), Some("boom"));

        banner.sweep(now + Duration::from_millis(5000));
        assert!(!banner.is_visible());
    }

    #[test]
    fn test_new_error_replaces_text() {
        let mut banner = ErrorBanner::new(Duration::from_secs(5));
        let now = Instant::now();
        banner.show("first", now);
        banner.show("second", now + Duration::from_secs(3));

        assert_eq!(banner.message(), Some("second"));
        banner.sweep(now + Duration::from_secs(5));
        assert_eq!(banner.message(), Some("second"));
        banner.sweep(now + Duration::from_secs(8));
        assert!(!banner.is_visible());
    }
}
