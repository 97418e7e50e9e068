/// 경매 저장소 어댑터
/// 스케줄러와 생성/조회 경로가 사용하는 저장소 인터페이스
// region:    --- Imports
use crate::auction::{Auction, AuctionFilter, AuctionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod optimistic;
pub mod postgres;
mod queries;

pub use memory::InMemoryAuctionStore;
pub use optimistic::{
    OptimisticAuctionStore, Versioned, VersionedAuctionStore, MAX_CAS_ATTEMPTS,
};
pub use postgres::PostgresAuctionStore;
// endregion: --- Modules

// region:    --- Store Error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("auction {0} already exists")]
    DuplicateId(AuctionId),

    #[error("auction {0} not found")]
    NotFound(AuctionId),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid stored record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("update conflict on auction {id} after {attempts} attempts")]
    Conflict { id: AuctionId, attempts: u32 },
}
// endregion: --- Store Error

// region:    --- Auction Store Trait
/// 경매 저장소 트레이트
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매 저장 (id 중복 시 `DuplicateId`)
    async fn create(&self, auction: &Auction) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &AuctionId) -> Result<Auction, StoreError>;

    /// 필터 조건의 경매 목록 (최신 생성 순)
    async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError>;

    /// ACTIVE 상태이면서 마감 시각이 `now` 이전인 경매
    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError>;

    /// 현재 상태가 ACTIVE 인 경우에만 COMPLETED 로 변경
    ///
    /// 변경했으면 `true`, 이미 COMPLETED 였으면 `false`.
    async fn compare_and_set_completed(&self, id: &AuctionId) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: AuctionStore + ?Sized> AuctionStore for std::sync::Arc<S> {
    async fn create(&self, auction: &Auction) -> Result<(), StoreError> {
        (**self).create(auction).await
    }

    async fn find_by_id(&self, id: &AuctionId) -> Result<Auction, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        (**self).find_auctions(filter).await
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        (**self).find_expired_active(now).await
    }

    async fn compare_and_set_completed(&self, id: &AuctionId) -> Result<bool, StoreError> {
        (**self).compare_and_set_completed(id).await
    }
}
// endregion: --- Auction Store Trait
