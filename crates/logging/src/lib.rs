//! helpers for logging.

/// Log to stderr.
///
/// Filtering follows `RUST_LOG`, defaulting to `info`.  If called multiple times in the same process, only applies
/// once, so every test in a suite may call it.
pub fn log_to_stderr() {
    static ONCE: std::sync::Once = std::sync::Once::new();

    ONCE.call_once(|| {
        // Another logger may already be installed by the host process, in which case it wins.
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format(|buf, record| {
                use std::io::Write;

                let now = time::OffsetDateTime::now_utc();

                writeln!(
                    buf,
                    "{} {} time={} target={}",
                    record.level(),
                    record.args(),
                    now,
                    record.target()
                )
            })
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_twice() {
        log_to_stderr();
        log_to_stderr();
        log::info!("still here");
    }
}
