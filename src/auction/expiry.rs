/// 경매 만료 정책
/// 마감 시각 = 생성 시각 + 설정된 경매 기간
// region:    --- Imports
use super::model::Auction;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

// endregion: --- Imports

// region:    --- Expiry Policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    interval: Duration,
}

impl ExpiryPolicy {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// 마감 시각 계산 (표현 범위를 넘으면 최대 시각으로 고정)
    pub fn expires_at(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.interval)
            .ok()
            .and_then(|delta| created_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// 마감 시각이 지났는지 확인
    pub fn is_expired(auction: &Auction, now: DateTime<Utc>) -> bool {
        auction.expires_at <= now
    }
}
// endregion: --- Expiry Policy

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_expires_at_adds_interval() {
        let policy = ExpiryPolicy::new(Duration::from_millis(1500));
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            policy.expires_at(created),
            created + TimeDelta::milliseconds(1500)
        );
    }

    #[test]
    fn test_expires_at_saturates() {
        let policy = ExpiryPolicy::new(Duration::MAX);
        assert_eq!(policy.expires_at(Utc::now()), DateTime::<Utc>::MAX_UTC);
    }
}
// endregion: --- Tests
