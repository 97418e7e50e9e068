/// 조건부 업데이트를 지원하지 않는 저장소용 어댑터
/// 버전 확인 후 교체(read-modify-write)를 제한된 횟수만큼 재시도한다.
// region:    --- Imports
use super::{AuctionStore, StoreError};
use crate::auction::{Auction, AuctionFilter, AuctionId, AuctionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

// endregion: --- Imports

// 최대 재시도 횟수
pub const MAX_CAS_ATTEMPTS: u32 = 5;

// region:    --- Versioned Store Trait
/// 버전이 붙은 레코드
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

/// 버전 기반 교체만 지원하는 저장소
#[async_trait]
pub trait VersionedAuctionStore: Send + Sync {
    async fn insert(&self, auction: &Auction) -> Result<(), StoreError>;

    async fn load_versioned(&self, id: &AuctionId) -> Result<Versioned<Auction>, StoreError>;

    async fn scan(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError>;

    async fn scan_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError>;

    /// 저장된 버전이 `expected_version` 과 같을 때만 교체 (다르면 `false`)
    async fn replace_if_version(
        &self,
        id: &AuctionId,
        expected_version: u64,
        auction: &Auction,
    ) -> Result<bool, StoreError>;
}
// endregion: --- Versioned Store Trait

// region:    --- Optimistic Store
pub struct OptimisticAuctionStore<S> {
    inner: S,
    max_attempts: u32,
}

impl<S: VersionedAuctionStore> OptimisticAuctionStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            max_attempts: MAX_CAS_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(inner: S, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }
}

#[async_trait]
impl<S: VersionedAuctionStore> AuctionStore for OptimisticAuctionStore<S> {
    async fn create(&self, auction: &Auction) -> Result<(), StoreError> {
        self.inner.insert(auction).await
    }

    async fn find_by_id(&self, id: &AuctionId) -> Result<Auction, StoreError> {
        Ok(self.inner.load_versioned(id).await?.record)
    }

    async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        self.inner.scan(filter).await
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        self.inner.scan_expired_active(now).await
    }

    async fn compare_and_set_completed(&self, id: &AuctionId) -> Result<bool, StoreError> {
        for attempt in 1..=self.max_attempts {
            let Versioned { record, version } = self.inner.load_versioned(id).await?;
            if record.status == AuctionStatus::Completed {
                return Ok(false);
            }

            let closed = Auction {
                status: AuctionStatus::Completed,
                ..record
            };
            if self.inner.replace_if_version(id, version, &closed).await? {
                return Ok(true);
            }
            debug!(
                "{:<12} --> 버전 충돌: 재시도 id: {}, 시도: {}",
                "Store", id, attempt
            );
        }

        warn!(
            "{:<12} --> 최대 재시도 횟수 초과 id: {}",
            "Store", id
        );
        Err(StoreError::Conflict {
            id: id.clone(),
            attempts: self.max_attempts,
        })
    }
}
// endregion: --- Optimistic Store

// endregion: --- Tests
