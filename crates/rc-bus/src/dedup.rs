//! Short-TTL key/value cache used to suppress duplicate inbound messages (spec.md §4.1/§6).
//!
//! Keys follow the `discord_msg_processed:{messageID}` pattern from the reference
//! persisted-state layout; callers choose the key, this module only owns the TTL marker.

use redis::aio::ConnectionManager;

use crate::error::Result;

/// Atomically mark `key` as processed if it isn't already. Returns `true` if this
/// call is the first to see `key` within the TTL window (i.e. the caller should
/// proceed), `false` if a prior call already marked it (the caller should drop).
pub async fn try_mark_processed(
    conn: &mut ConnectionManager,
    key: &str,
    ttl_secs: u64,
) -> Result<bool> {
    let result: Option<String> = redis::cmd("SET")
        .arg(key)
        .arg("processing")
        .arg("NX")
        .arg("EX")
        .arg(ttl_secs)
        .query_async(conn)
        .await?;

    Ok(result.is_some())
}

#[cfg(test)]
mod tests {
    // Exercised against a live Redis in integration tests (testcontainers); the
    // NX/EX semantics are Redis-native and not meaningfully unit-testable here.
}
