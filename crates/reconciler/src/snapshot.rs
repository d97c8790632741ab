use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
};

use crate::error::QueryError;

/// Point-in-time read of a live broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSnapshot {
    pub title: String,
    /// Category / game name; empty when the broadcaster did not set one.
    pub game: String,
    /// Thumbnail URL template, may contain `{width}` and `{height}`.
    pub thumbnail_url: String,
    pub started_at: DateTime<Utc>,
    pub viewer_count: u64,
}

impl StreamSnapshot {
    /// Whole minutes the broadcast has been running at `now`.
    #[must_use]
    pub fn minutes_live(&self, now: DateTime<Utc>) -> u64 {
        let seconds = (now - self.started_at).num_seconds().max(0);
        (seconds / 60) as u64
    }
}

/// Reads the current state of a named broadcast.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// `Ok(None)` means the broadcast is not live.
    async fn fetch(&self, resource: &str) -> Result<Option<StreamSnapshot>, QueryError>;
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, chrono::TimeZone, rstest::rstest};

    fn started(at: DateTime<Utc>) -> StreamSnapshot {
        StreamSnapshot {
            title: "t".into(),
            game: String::new(),
            thumbnail_url: String::new(),
            started_at: at,
            viewer_count: 0,
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(59, 0)]
    #[case(60, 1)]
    #[case(3_599, 59)]
    #[case(3_600 + 5 * 60 + 30, 65)]
    fn minutes_are_floored(#[case] elapsed_secs: i64, #[case] minutes: u64) {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let now = t0 + chrono::Duration::seconds(elapsed_secs);
        assert_eq!(started(t0).minutes_live(now), minutes);
    }

    #[test]
    fn clock_skew_never_goes_negative() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let now = t0 - chrono::Duration::seconds(90);
        assert_eq!(started(t0).minutes_live(now), 0);
    }
}
