use std::time::{SystemTime, UNIX_EPOCH};

pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Seconds since the epoch for a file modification time
pub fn system_time_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(_) => 0,
    }
}

pub fn elapsed_seconds(start: i64, end: i64) -> i64 {
    end - start
}

pub fn is_expired(timestamp: i64, timeout: i64, current_time: i64) -> bool {
    elapsed_seconds(timestamp, current_time) > timeout
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_current_timestamp() {
        let ts = current_timestamp();
        // Should be a reasonable timestamp (after 2020-01-01)
        assert!(ts > 1577836800);
        // Should be before 2100-01-01
        assert!(ts < 4102444800);
    }

    #[test]
    fn test_current_timestamp_millis() {
        let ts_millis = current_timestamp_millis();
        let ts_secs = current_timestamp();

        let diff = (ts_millis / 1000 - ts_secs).abs();
        assert!(diff <= 1);
    }

    #[test]
    fn test_system_time_secs() {
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(system_time_secs(t), 1_700_000_000);
        assert_eq!(system_time_secs(UNIX_EPOCH), 0);
    }

    #[test]
    fn test_is_expired() {
        let current = 1000;

        assert!(!is_expired(950, 100, current));
        assert!(is_expired(800, 100, current));

        // Exactly at the timeout is still live
        assert!(!is_expired(900, 100, current));
        assert!(is_expired(899, 100, current));
    }

    #[test]
    fn test_is_expired_upload_retention() {
        let retention = 86_400; // 1 day
        let now = current_timestamp();

        assert!(!is_expired(now - 3600, retention, now));
        assert!(is_expired(now - 2 * 86_400, retention, now));
    }
}
