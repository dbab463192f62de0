/// Read-through caching around an async block.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues
/// the result for a background write with `$ttl` seconds to live, and returns
/// it. A cache that cannot be reached counts as a miss, so the metadata
/// provider keeps answering while Redis is down.
///
/// ```rust,ignore
/// let page: Page<Title> = cached!(self.cache, CacheKey::TopRated(media, page), FEED_TTL, async {
///     self.fetch_top_rated(media, page).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.lookup(&key).await {
            tracing::debug!(key = %key, "Cache hit");
            Ok(cached)
        } else {
            match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            }
        }
    }};
}
