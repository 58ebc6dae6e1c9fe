//! Per-client token-bucket rate limiting.
//!
//! One bucket per client key, all behind a single mutex. Buckets refill
//! lazily from elapsed time on each call. Idle buckets are swept inline once
//! the map grows past the eviction threshold; there is no timer task, so a
//! quiet process keeps its buckets until traffic resumes.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::error::GateError;
use crate::observability::metrics;
use crate::security::client_ip::client_key;

/// A simple token bucket rate limiter.
#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn refill(&mut self, capacity: f64, refill_rate: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64, now: Instant) -> bool {
        self.refill(capacity, refill_rate, now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    bucket: TokenBucket,
    last_seen: Instant,
}

/// Effective limiter settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitSettings {
    /// `<= 0` disables the limiter.
    pub rate_per_second: f64,
    pub burst: u32,
    pub idle_ttl: Duration,
    pub eviction_threshold: usize,
}

impl RateLimitSettings {
    fn normalized(self) -> Self {
        Self {
            burst: self.burst.max(1),
            eviction_threshold: self.eviction_threshold.max(1),
            ..self
        }
    }

    pub fn enabled(&self) -> bool {
        self.rate_per_second > 0.0
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        (&RateLimitConfig::default()).into()
    }
}

impl From<&RateLimitConfig> for RateLimitSettings {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            rate_per_second: config.requests_per_second,
            burst: config.burst,
            idle_ttl: Duration::from_secs(config.idle_ttl_secs),
            eviction_threshold: config.eviction_threshold,
        }
        .normalized()
    }
}

#[derive(Debug)]
struct LimiterState {
    settings: RateLimitSettings,
    entries: HashMap<String, RateLimitEntry>,
}

impl LimiterState {
    fn evict_idle(&mut self, now: Instant) -> usize {
        let ttl = self.settings.idle_ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);
        before - self.entries.len()
    }
}

/// Keyed admission control.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(LimiterState {
                settings: settings.normalized(),
                entries: HashMap::new(),
            }),
            clock,
        }
    }

    /// Apply new settings. Existing buckets keep their fill level, capped at
    /// the new burst. Disabling drops every bucket.
    pub fn configure(&self, settings: RateLimitSettings) {
        let settings = settings.normalized();
        let now = self.clock.monotonic_now();
        let mut state = self.lock();

        if settings.enabled() {
            let old = state.settings;
            let burst = f64::from(settings.burst);
            for entry in state.entries.values_mut() {
                entry
                    .bucket
                    .refill(f64::from(old.burst), old.rate_per_second, now);
                entry.bucket.tokens = entry.bucket.tokens.min(burst);
                entry.bucket.last_update = now;
            }
        } else if !state.entries.is_empty() {
            let dropped = state.entries.len();
            state.entries.clear();
            metrics::record_evictions(dropped);
            metrics::record_rate_limit_entries(0);
        }
        state.settings = settings;

        tracing::info!(
            rate_per_second = settings.rate_per_second,
            burst = settings.burst,
            idle_ttl_secs = settings.idle_ttl.as_secs(),
            eviction_threshold = settings.eviction_threshold,
            "Rate limiter configured"
        );
    }

    pub fn settings(&self) -> RateLimitSettings {
        self.lock().settings
    }

    pub fn is_enabled(&self) -> bool {
        self.settings().enabled()
    }

    /// Tracked keys.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Try to take one token for `key`.
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.monotonic_now();
        let mut state = self.lock();
        let settings = state.settings;
        if !settings.enabled() {
            return true;
        }

        let burst = f64::from(settings.burst);
        if !state.entries.contains_key(key) {
            state.entries.insert(
                key.to_string(),
                RateLimitEntry {
                    bucket: TokenBucket::new(burst, now),
                    last_seen: now,
                },
            );
        }

        let allowed = match state.entries.get_mut(key) {
            Some(entry) => {
                entry.last_seen = now;
                entry.bucket.try_acquire(burst, settings.rate_per_second, now)
            }
            None => true,
        };

        if state.entries.len() > settings.eviction_threshold {
            let evicted = state.evict_idle(now);
            if evicted > 0 {
                tracing::debug!(evicted, remaining = state.entries.len(), "Evicted idle rate limit entries");
                metrics::record_evictions(evicted);
            }
        }
        metrics::record_rate_limit_entries(state.entries.len());

        allowed
    }

    /// Sweep idle entries regardless of the threshold.
    pub fn evict_idle(&self) -> usize {
        let now = self.clock.monotonic_now();
        let mut state = self.lock();
        let evicted = state.evict_idle(now);
        metrics::record_evictions(evicted);
        metrics::record_rate_limit_entries(state.entries.len());
        evicted
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    if limiter.allow(&key) {
        metrics::record_admitted();
        next.run(request).await
    } else {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        GateError::RateLimited.into_response()
    }
}
