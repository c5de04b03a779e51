use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(feature = "mimalloc")]
mod mimalloc {
    use mimalloc::MiMalloc;

    #[global_allocator]
    static GLOBAL: MiMalloc = MiMalloc;
}

/// Milliseconds since the unix epoch, 0 if the system clock is before it.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// `NO_NODELAY` in the environment leaves Nagle's algorithm on.
pub fn nodelay_enabled() -> bool {
    dotenvy::var("NO_NODELAY").is_err()
}
