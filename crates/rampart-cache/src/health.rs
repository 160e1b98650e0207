//! Remote backend health monitoring.
//!
//! Every facade instance owns one [`HealthMonitor`]; there is no
//! process-global health state. Probe results are cached for a short window
//! so a health check does not cost a network round-trip per cache call, and
//! each probe runs under an aggressively short timeout so an unreachable
//! backend cannot stall request handling.
//!
//! The window introduces a deliberate staleness bias: callers may observe
//! the backend as healthy for up to the window length after it has actually
//! failed, and as unhealthy for up to the window length after it recovers.

use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::remote::RemoteBackend;

#[derive(Debug, Default)]
struct ProbeState {
    healthy: bool,
    checked_at: Option<Instant>,
}

/// Windowed health prober for the remote backend.
pub struct HealthMonitor {
    backend: Option<RemoteBackend>,
    window: Duration,
    probe_timeout: Duration,
    // Held across the probe so concurrent callers serialize on one PING.
    state: Mutex<ProbeState>,
}

impl HealthMonitor {
    /// Creates a monitor for an optional remote backend.
    ///
    /// With no backend configured the monitor reports unhealthy forever and
    /// never probes.
    #[must_use]
    pub fn new(backend: Option<RemoteBackend>, window: Duration, probe_timeout: Duration) -> Self {
        Self {
            backend,
            window,
            probe_timeout,
            state: Mutex::new(ProbeState::default()),
        }
    }

    /// Returns whether the remote backend is currently considered healthy.
    ///
    /// Answers from the cached probe result while it is fresher than the
    /// configured window; otherwise issues a PING bounded by the probe
    /// timeout and caches the outcome.
    pub async fn is_healthy(&self) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };

        let mut state = self.state.lock().await;
        if let Some(checked_at) = state.checked_at {
            if checked_at.elapsed() < self.window {
                return state.healthy;
            }
        }

        let was_healthy = state.healthy;
        let alive = matches!(
            tokio::time::timeout(self.probe_timeout, backend.ping()).await,
            Ok(Ok(()))
        );

        state.healthy = alive;
        state.checked_at = Some(Instant::now());

        if was_healthy && !alive {
            tracing::warn!("remote cache backend unreachable, serving from fallback store");
        } else if !was_healthy && alive {
            tracing::info!("remote cache backend reachable again");
        }

        alive
    }

    /// Forgets the cached probe result so the next check probes immediately.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.checked_at = None;
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("window", &self.window)
            .field("probe_timeout", &self.probe_timeout)
            .field("configured", &self.backend.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_backend_is_never_healthy() {
        let monitor = HealthMonitor::new(None, Duration::from_secs(5), Duration::from_millis(100));
        assert!(!monitor.is_healthy().await);
        assert!(!monitor.is_healthy().await);
    }

    #[tokio::test]
    async fn test_unreachable_backend_reports_unhealthy_within_probe_timeout() {
        // Reserved TEST-NET-1 address: nothing listens there.
        let backend = RemoteBackend::connect("redis://192.0.2.1:6379").unwrap();
        let monitor = HealthMonitor::new(
            Some(backend),
            Duration::from_secs(5),
            Duration::from_millis(100),
        );

        let start = Instant::now();
        assert!(!monitor.is_healthy().await);
        // The probe timeout bounds the check, not the TCP connect timeout.
        assert!(start.elapsed() < Duration::from_secs(2));

        // Second call must answer from the cached result without re-probing.
        let start = Instant::now();
        assert!(!monitor.is_healthy().await);
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
