//! Instance limits

/// Cap an instance sequence at `limit` items.
///
/// `None` passes the sequence through unchanged; zero or negative limits
/// yield nothing.
pub fn limit_instances<I: Iterator>(instances: I, limit: Option<i64>) -> std::iter::Take<I> {
    let cap = match limit {
        None => usize::MAX,
        Some(n) if n <= 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
    };
    instances.take(cap)
}
