use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub type Limiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// OneMap allows 250 calls per minute per client.
const ONEMAP_CALLS_PER_MINUTE: u32 = 250;

pub fn onemap_limiter() -> Limiter {
    let per_minute = NonZeroU32::new(ONEMAP_CALLS_PER_MINUTE).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)))
}
