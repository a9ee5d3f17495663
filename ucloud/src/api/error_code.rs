//! UCloud `RetCode` values with special handling.

pub const SUCCESS: i64 = 0;

/// Account-level API rate limit.
pub const RATE_LIMIT: i64 = 153;

/// CDN operation submitted too often for the same domain.
pub const TOO_OFTEN: i64 = 44025;

/// Throttling codes are worth retrying; every other non-zero code is final.
pub fn is_retryable(code: i64) -> bool {
    matches!(code, RATE_LIMIT | TOO_OFTEN)
}
