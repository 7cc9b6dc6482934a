/// Read-through caching over Redis.
///
/// Checks the cache for `$key`; on a miss, runs `$block` to compute the
/// value, schedules a background cache write with the given TTL, and
/// returns the computed value.
///
/// # Arguments
/// * `$cache`: cache instance with `get_from_cache` and `set_in_background`.
/// * `$key`: the `CacheKey` under which the value lives.
/// * `$ttl`: time-to-live in seconds.
/// * `$block`: async block producing the value on a miss.
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        if let Some(cached) = $cache.get_from_cache(&$key).await? {
            Ok(cached)
        } else {
            let value = $block.await?;
            $cache.set_in_background(&$key, &value, $ttl);
            Ok(value)
        }
    }};
}
