//! Request pacing and quota backoff.
//!
//! Two mechanisms keep a run under the forge's hourly quota:
//!
//! - proactive pacing: a leaky-bucket limiter per request kind spaces
//!   consecutive calls at least a fixed interval apart;
//! - reactive backoff: after each page the core quota is checked, and when it
//!   runs low the run sleeps until the window resets.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::forge::ForgeClient;
use crate::progress::{ProgressCallback, SweepProgress, emit};

type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default pacing values, sized for a 5000 requests/hour quota.
pub mod rate_limits {
    /// Minimum spacing between read calls.
    pub const READ_INTERVAL_MS: u64 = 500;
    /// Minimum spacing between mutating calls.
    pub const WRITE_INTERVAL_MS: u64 = 1_000;
    /// Remaining core quota below which the run waits for the reset.
    pub const QUOTA_FLOOR: usize = 100;
    /// Added to the computed reset wait.
    pub const RESET_MARGIN_SECS: u64 = 1;
}

/// Which pacing lane a request uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Read,
    Write,
}

/// Pacing and backoff settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// Minimum spacing between reads. Zero disables read pacing.
    pub read_interval: Duration,
    /// Minimum spacing between writes. Zero disables write pacing.
    pub write_interval: Duration,
    pub quota_floor: usize,
    pub reset_margin: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            read_interval: Duration::from_millis(rate_limits::READ_INTERVAL_MS),
            write_interval: Duration::from_millis(rate_limits::WRITE_INTERVAL_MS),
            quota_floor: rate_limits::QUOTA_FLOOR,
            reset_margin: Duration::from_secs(rate_limits::RESET_MARGIN_SECS),
        }
    }
}

impl PacingConfig {
    /// No proactive pacing; the quota check still applies.
    pub fn unpaced() -> Self {
        Self {
            read_interval: Duration::ZERO,
            write_interval: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Outcome of a post-page quota check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaCheck {
    /// Quota above the floor; no wait.
    Healthy { remaining: usize },
    /// Quota below the floor; the run slept until the reset.
    Waited { remaining: usize, waited: Duration },
    /// The quota endpoint could not be read; the run continued without waiting.
    Unknown,
}

/// Wait needed before continuing, or `None` if `remaining` is at or above
/// `floor`.
///
/// The wait is the time until `reset_at`, floored at zero, plus `margin`.
pub fn quota_wait(
    remaining: usize,
    floor: usize,
    reset_at: DateTime<Utc>,
    now: DateTime<Utc>,
    margin: Duration,
) -> Option<Duration> {
    if remaining >= floor {
        return None;
    }

    let until_reset = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
    Some(until_reset + margin)
}

fn limiter_for(interval: Duration) -> Option<Arc<GovernorRateLimiter>> {
    Quota::with_period(interval)
        .map(|q| q.allow_burst(NonZeroU32::MIN))
        .map(|q| Arc::new(RateLimiter::direct(q)))
}

/// Paces outbound calls and backs off when the quota runs low.
#[derive(Clone)]
pub struct RateGovernor {
    reads: Option<Arc<GovernorRateLimiter>>,
    writes: Option<Arc<GovernorRateLimiter>>,
    config: PacingConfig,
}

impl std::fmt::Debug for RateGovernor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGovernor")
            .field("config", &self.config)
            .finish()
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(PacingConfig::default())
    }
}

impl RateGovernor {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            reads: limiter_for(config.read_interval),
            writes: limiter_for(config.write_interval),
            config,
        }
    }

    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Wait until a request of `kind` may be sent.
    pub async fn before_request(&self, kind: RequestKind) {
        let limiter = match kind {
            RequestKind::Read => &self.reads,
            RequestKind::Write => &self.writes,
        };
        if let Some(limiter) = limiter {
            limiter.until_ready().await;
        }
    }

    /// Check the core quota and sleep until the reset if it is below the
    /// floor.
    ///
    /// A failed quota lookup is logged and treated as "no wait".
    pub async fn after_page(
        &self,
        client: &ForgeClient,
        on_progress: Option<&ProgressCallback>,
    ) -> QuotaCheck {
        self.before_request(RequestKind::Read).await;

        let core = match client.rate_limit().await {
            Ok(core) => core,
            Err(e) => {
                tracing::warn!(error = %e, "could not read rate limit, continuing");
                return QuotaCheck::Unknown;
            }
        };

        let wait = quota_wait(
            core.remaining,
            self.config.quota_floor,
            core.reset_at(),
            Utc::now(),
            self.config.reset_margin,
        );

        match wait {
            None => {
                tracing::debug!(remaining = core.remaining, "quota healthy");
                QuotaCheck::Healthy {
                    remaining: core.remaining,
                }
            }
            Some(waited) => {
                emit(
                    on_progress,
                    SweepProgress::QuotaLow {
                        remaining: core.remaining,
                        wait_ms: waited.as_millis() as u64,
                    },
                );
                tracing::info!(
                    remaining = core.remaining,
                    wait_secs = waited.as_secs_f64(),
                    "quota low, waiting for reset"
                );
                tokio::time::sleep(waited).await;
                QuotaCheck::Waited {
                    remaining: core.remaining,
                    waited,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::http::{HttpMethod, MockTransport};

    const RATE_LIMIT_URL: &str = "https://api.github.com/rate_limit";

    fn client(transport: &MockTransport) -> ForgeClient {
        ForgeClient::new("t", Arc::new(transport.clone())).unwrap()
    }

    fn quota_body(remaining: usize, reset: DateTime<Utc>) -> serde_json::Value {
        serde_json::json!({
            "resources": {"core": {
                "limit": 5000,
                "used": 5000 - remaining,
                "remaining": remaining,
                "reset": reset.timestamp()
            }}
        })
    }

    #[test]
    fn default_config_matches_forge_quota() {
        let config = PacingConfig::default();
        assert_eq!(config.read_interval, Duration::from_millis(500));
        assert_eq!(config.write_interval, Duration::from_millis(1000));
        assert_eq!(config.quota_floor, 100);
        assert_eq!(config.reset_margin, Duration::from_secs(1));
    }

    #[test]
    fn quota_wait_none_at_or_above_floor() {
        let now = Utc::now();
        let margin = Duration::from_secs(1);
        assert_eq!(quota_wait(100, 100, now, now, margin), None);
        assert_eq!(quota_wait(4000, 100, now, now, margin), None);
    }

    #[test]
    fn quota_wait_adds_margin_to_time_until_reset() {
        let now = Utc::now();
        let reset = now + chrono::Duration::seconds(90);
        let wait = quota_wait(99, 100, reset, now, Duration::from_secs(1)).unwrap();
        assert_eq!(wait, Duration::from_secs(91));
    }

    #[test]
    fn quota_wait_floors_past_reset_at_zero() {
        let now = Utc::now();
        let reset = now - chrono::Duration::seconds(30);
        let wait = quota_wait(0, 100, reset, now, Duration::from_secs(1)).unwrap();
        assert_eq!(wait, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn before_request_spaces_consecutive_reads() {
        let governor = RateGovernor::new(PacingConfig {
            read_interval: Duration::from_millis(40),
            ..PacingConfig::default()
        });

        let start = std::time::Instant::now();
        for _ in 0..3 {
            governor.before_request(RequestKind::Read).await;
        }
        assert!(start.elapsed() >= Duration::from_millis(75));
    }

    #[tokio::test]
    async fn zero_interval_disables_pacing() {
        let governor = RateGovernor::new(PacingConfig::unpaced());
        let start = std::time::Instant::now();
        for _ in 0..50 {
            governor.before_request(RequestKind::Write).await;
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn after_page_does_not_wait_when_quota_is_healthy() {
        let transport = MockTransport::new();
        transport.push_json(RATE_LIMIT_URL, 200, quota_body(4500, Utc::now()));
        let governor = RateGovernor::new(PacingConfig::unpaced());

        let check = governor.after_page(&client(&transport), None).await;
        assert_eq!(check, QuotaCheck::Healthy { remaining: 4500 });
    }

    #[tokio::test(start_paused = true)]
    async fn after_page_sleeps_until_reset_when_quota_is_low() {
        let transport = MockTransport::new();
        let reset = Utc::now() + chrono::Duration::seconds(30);
        transport.push_json(RATE_LIMIT_URL, 200, quota_body(12, reset));
        let governor = RateGovernor::new(PacingConfig::unpaced());

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            sink.lock().unwrap_or_else(|e| e.into_inner()).push(event);
        });

        let start = tokio::time::Instant::now();
        let check = governor.after_page(&client(&transport), Some(&callback)).await;

        match check {
            QuotaCheck::Waited { remaining, waited } => {
                assert_eq!(remaining, 12);
                assert!(waited >= Duration::from_secs(29));
                assert!(waited <= Duration::from_secs(31));
            }
            other => panic!("expected a wait, got {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_secs(29));

        let events = events.lock().unwrap_or_else(|e| e.into_inner());
        assert!(matches!(
            events.as_slice(),
            [SweepProgress::QuotaLow { remaining: 12, .. }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn after_page_fails_open_when_quota_lookup_fails() {
        let transport = MockTransport::new();
        transport.push_json(RATE_LIMIT_URL, 500, serde_json::json!({}));
        let governor = RateGovernor::new(PacingConfig::unpaced());

        let start = tokio::time::Instant::now();
        let check = governor.after_page(&client(&transport), None).await;
        assert_eq!(check, QuotaCheck::Unknown);
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(transport.count(HttpMethod::Get), 1);
    }
}
