//! Shared timestamp and run-identity helpers.

use std::time::{Duration, SystemTime, UNIX_EPOCH};
use ulid::Ulid;

pub fn epoch_secs(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// Human-readable local timestamp for log headers.
pub fn local_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn new_run_id() -> String {
    Ulid::new().to_string()
}

/// Whole seconds, rounded to nearest, as printed in `TIMING_METRIC` lines.
pub fn whole_secs(d: Duration) -> u64 {
    (d.as_millis() as u64 + 500) / 1000
}

/// Compact elapsed-time rendering for summary tables (`42s`, `3m07s`).
pub fn format_secs(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m{:02}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_secs_before_epoch_is_zero() {
        assert_eq!(epoch_secs(UNIX_EPOCH), 0);
        assert!(epoch_secs(SystemTime::now()) > 1_600_000_000);
    }

    #[test]
    fn test_new_run_id_is_unique_ulid() {
        let id1 = new_run_id();
        let id2 = new_run_id();
        assert_ne!(id1, id2);
        assert!(ulid::Ulid::from_string(&id1).is_ok());
    }

    #[test]
    fn test_whole_secs_rounds() {
        assert_eq!(whole_secs(Duration::from_millis(0)), 0);
        assert_eq!(whole_secs(Duration::from_millis(1499)), 1);
        assert_eq!(whole_secs(Duration::from_millis(1500)), 2);
    }

    #[test]
    fn test_format_secs() {
        assert_eq!(format_secs(7), "7s");
        assert_eq!(format_secs(187), "3m07s");
    }
}
