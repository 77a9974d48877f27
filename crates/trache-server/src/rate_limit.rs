use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use trache_shared::constants::LOGIN_ATTEMPTS_PER_MINUTE;

use crate::error::ServerError;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-client token buckets. `rate` is in tokens per second.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, TokenBucket>>>,
    rate: f64,
    capacity: f64,
    trusted_hops: usize,
}

impl RateLimiter {
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            rate,
            capacity,
            trusted_hops: 0,
        }
    }

    /// Burst of five, refilled at five per minute.
    pub fn for_login() -> Self {
        Self::new(LOGIN_ATTEMPTS_PER_MINUTE / 60.0, LOGIN_ATTEMPTS_PER_MINUTE)
    }

    /// Key buckets on the X-Forwarded-For entry appended by the outermost
    /// of `hops` reverse proxies instead of the socket peer.
    pub fn trusting_proxies(mut self, hops: usize) -> Self {
        self.trusted_hops = hops;
        self
    }

    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.try_consume(self.rate, self.capacity)
    }

    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_refill).as_secs_f64() < max_idle_secs
        });
    }

    /// Bucket key for `req`. Requests with no usable address share the
    /// unspecified address.
    fn key_for<B>(&self, req: &Request<B>) -> IpAddr {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|connect_info| connect_info.0);
        limiter_ip(req.headers(), peer, self.trusted_hops)
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ServerError> {
    let ip = limiter.key_for(&req);
    if !limiter.check(ip).await {
        warn!(ip = %ip, path = %req.uri().path(), "Rate limit exceeded");
        return Err(ServerError::TooManyRequests);
    }

    Ok(next.run(req).await)
}

/// Address a request is rate limited under.
///
/// Without trusted proxies this is the socket peer; forwarding headers are
/// client-controlled and ignored. Behind `trusted_hops` proxies it is the
/// `trusted_hops`-th X-Forwarded-For entry from the right, falling back to
/// the peer when the header is shorter.
pub fn limiter_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_hops: usize,
) -> Option<IpAddr> {
    if trusted_hops > 0 {
        let hops = forwarded_for(headers);
        if hops.len() >= trusted_hops {
            if let Some(ip) = hops[hops.len() - trusted_hops] {
                return Some(ip);
            }
        }
    }
    peer.map(|peer| peer.ip())
}

/// Address written to the audit log: first X-Forwarded-For hop, then
/// X-Real-IP, then the socket peer. Not suitable for access control.
pub fn reported_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(Some(first)) = forwarded_for(headers).first() {
        return Some(*first);
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            if let Ok(ip) = value.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    peer.map(|peer| peer.ip())
}

/// Entries of every X-Forwarded-For header, left to right. Unparseable
/// entries are kept as `None` so positions still count.
fn forwarded_for(headers: &HeaderMap) -> Vec<Option<IpAddr>> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|hop| hop.trim().parse::<IpAddr>().ok())
        .collect()
}
