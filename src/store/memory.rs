// region:    --- Imports
use super::optimistic::{Versioned, VersionedAuctionStore};
use super::{AuctionStore, StoreError};
use crate::auction::{Auction, AuctionFilter, AuctionId, AuctionStatus, ExpiryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

// endregion: --- Imports

// region:    --- In-Memory Store
/// 메모리 기반 경매 저장소
/// 모든 변경은 하나의 잠금 안에서 처리되므로 조건부 업데이트가 원자적이다.
#[derive(Default)]
pub struct InMemoryAuctionStore {
    records: Mutex<HashMap<AuctionId, Versioned<Auction>>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut auctions: Vec<Auction>) -> Vec<Auction> {
    auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    auctions
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn create(&self, auction: &Auction) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&auction.id) {
            return Err(StoreError::DuplicateId(auction.id.clone()));
        }
        records.insert(
            auction.id.clone(),
            Versioned {
                record: auction.clone(),
                version: 1,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &AuctionId) -> Result<Auction, StoreError> {
        self.records
            .lock()
            .await
            .get(id)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        let records = self.records.lock().await;
        let found = records
            .values()
            .map(|entry| &entry.record)
            .filter(|auction| filter.matches(auction))
            .cloned()
            .collect();
        Ok(newest_first(found))
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .map(|entry| &entry.record)
            .filter(|auction| auction.is_active() && ExpiryPolicy::is_expired(auction, now))
            .cloned()
            .collect())
    }

    async fn compare_and_set_completed(&self, id: &AuctionId) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        let entry = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if entry.record.status != AuctionStatus::Active {
            return Ok(false);
        }
        entry.record.status = AuctionStatus::Completed;
        entry.version += 1;
        Ok(true)
    }
}

#[async_trait]
impl VersionedAuctionStore for InMemoryAuctionStore {
    async fn insert(&self, auction: &Auction) -> Result<(), StoreError> {
        AuctionStore::create(self, auction).await
    }

    async fn load_versioned(&self, id: &AuctionId) -> Result<Versioned<Auction>, StoreError> {
        self.records
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn scan(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        AuctionStore::find_auctions(self, filter).await
    }

    async fn scan_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        AuctionStore::find_expired_active(self, now).await
    }

    async fn replace_if_version(
        &self,
        id: &AuctionId,
        expected_version: u64,
        auction: &Auction,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        let entry = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if entry.version != expected_version {
            return Ok(false);
        }
        entry.record = auction.clone();
        entry.version += 1;
        Ok(true)
    }
}
// endregion: --- In-Memory Store

// endregion: --- Tests
