// region:    --- Imports
use super::queries;
use super::{AuctionStore, StoreError};
use crate::auction::{Auction, AuctionCondition, AuctionFilter, AuctionId, AuctionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Row Model
/// 테이블 행 (상태/컨디션은 TEXT 로 저장)
#[derive(Debug, FromRow)]
struct AuctionRow {
    id: String,
    product_name: String,
    category: String,
    description: String,
    condition: String,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = StoreError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        let invalid = |reason: String| StoreError::InvalidRecord {
            id: row.id.clone(),
            reason,
        };
        let condition = row
            .condition
            .parse::<AuctionCondition>()
            .map_err(|e| invalid(e.to_string()))?;
        let status = row
            .status
            .parse::<AuctionStatus>()
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Auction {
            id: AuctionId::from(row.id),
            product_name: row.product_name,
            category: row.category,
            description: row.description,
            condition,
            status,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

fn into_auctions(rows: Vec<AuctionRow>) -> Result<Vec<Auction>, StoreError> {
    rows.into_iter().map(Auction::try_from).collect()
}
// 이름 부분 일치 패턴 (LIKE 와일드카드는 문자 그대로 비교)
fn like_pattern(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len() + 2);
    pattern.push('%');
    for c in name.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
// endregion: --- Row Model

// region:    --- Postgres Store
/// PostgreSQL 경매 저장소
pub struct PostgresAuctionStore {
    pool: Arc<PgPool>,
}

impl PostgresAuctionStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn create(&self, auction: &Auction) -> Result<(), StoreError> {
        info!("{:<12} --> 경매 생성 id: {}", "Store", auction.id);
        sqlx::query_scalar::<_, String>(queries::INSERT_AUCTION)
            .bind(auction.id.as_str())
            .bind(&auction.product_name)
            .bind(&auction.category)
            .bind(&auction.description)
            .bind(auction.condition.as_str())
            .bind(auction.status.as_str())
            .bind(auction.created_at)
            .bind(auction.expires_at)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| StoreError::DuplicateId(auction.id.clone()))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &AuctionId) -> Result<Auction, StoreError> {
        debug!("{:<12} --> 경매 조회 id: {}", "Store", id);
        sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?
            .try_into()
    }

    async fn find_auctions(&self, filter: &AuctionFilter) -> Result<Vec<Auction>, StoreError> {
        debug!("{:<12} --> 경매 목록 조회 {:?}", "Store", filter);
        let mut builder = QueryBuilder::<Postgres>::new(queries::LIST_AUCTIONS);
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = &filter.category {
            builder.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(name) = &filter.product_name {
            builder
                .push(" AND product_name ILIKE ")
                .push_bind(like_pattern(name))
                .push(" ESCAPE '\\'");
        }
        builder.push(" ORDER BY created_at DESC");

        let rows = builder
            .build_query_as::<AuctionRow>()
            .fetch_all(&*self.pool)
            .await?;
        into_auctions(rows)
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, StoreError> {
        let rows = sqlx::query_as::<_, AuctionRow>(queries::GET_EXPIRED_ACTIVE)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?;
        into_auctions(rows)
    }

    async fn compare_and_set_completed(&self, id: &AuctionId) -> Result<bool, StoreError> {
        let updated = sqlx::query_scalar::<_, String>(queries::COMPLETE_IF_ACTIVE)
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await?;
        if updated.is_some() {
            return Ok(true);
        }

        // 변경되지 않은 경우: 이미 종료됐거나 존재하지 않음
        let exists = sqlx::query_scalar::<_, bool>(queries::AUCTION_EXISTS)
            .bind(id.as_str())
            .fetch_one(&*self.pool)
            .await?;
        if exists {
            Ok(false)
        } else {
            Err(StoreError::NotFound(id.clone()))
        }
    }
}
// endregion: --- Postgres Store

// endregion: --- Tests
