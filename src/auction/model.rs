// region:    --- Imports
use super::expiry::ExpiryPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Auction Id
/// 경매 식별자 (생성 시 부여, 불변)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuctionId(String);

impl AuctionId {
    /// 새 식별자 생성 (UUID v4)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AuctionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AuctionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
// endregion: --- Auction Id

// region:    --- Enums
/// 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionCondition {
    New,
    Used,
    Refurbished,
}

/// 경매 상태 (ACTIVE -> COMPLETED 단방향)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Completed,
}

/// 저장된 문자열을 열거형으로 변환할 수 없을 때
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl AuctionCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionCondition::New => "NEW",
            AuctionCondition::Used => "USED",
            AuctionCondition::Refurbished => "REFURBISHED",
        }
    }
}

impl FromStr for AuctionCondition {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(AuctionCondition::New),
            "USED" => Ok(AuctionCondition::Used),
            "REFURBISHED" => Ok(AuctionCondition::Refurbished),
            other => Err(UnknownVariant {
                kind: "condition",
                value: other.to_string(),
            }),
        }
    }
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "ACTIVE",
            AuctionStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for AuctionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(AuctionStatus::Active),
            "COMPLETED" => Ok(AuctionStatus::Completed),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
// endregion: --- Enums

// region:    --- Auction Model
/// 경매 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: AuctionCondition,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// 경매 생성 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: AuctionCondition,
}

/// 경매 생성 요청 검증 오류
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("product name must not be empty")]
    EmptyProductName,

    #[error("category must be at least 2 characters")]
    CategoryTooShort,

    #[error("description must be between 10 and 200 characters (got {0})")]
    DescriptionLength(usize),
}

impl NewAuction {
    /// 생성 요청 검증
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_name.trim().is_empty() {
            return Err(ValidationError::EmptyProductName);
        }
        if self.category.trim().chars().count() < 2 {
            return Err(ValidationError::CategoryTooShort);
        }
        let len = self.description.trim().chars().count();
        if !(10..=200).contains(&len) {
            return Err(ValidationError::DescriptionLength(len));
        }
        Ok(())
    }
}

impl Auction {
    /// 요청을 검증하고 ACTIVE 상태의 경매를 연다
    ///
    /// 마감 시각은 생성 시각과 만료 정책으로 계산된다.
    pub fn open(
        new: NewAuction,
        policy: &ExpiryPolicy,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        new.validate()?;
        Ok(Self {
            id: AuctionId::generate(),
            product_name: new.product_name,
            category: new.category,
            description: new.description,
            condition: new.condition,
            status: AuctionStatus::Active,
            created_at: now,
            expires_at: policy.expires_at(now),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == AuctionStatus::Active
    }
}

/// 경매 목록 조회 필터
#[derive(Debug, Clone, Default)]
pub struct AuctionFilter {
    pub status: Option<AuctionStatus>,
    pub category: Option<String>,
    /// 대소문자 구분 없는 부분 일치
    pub product_name: Option<String>,
}

impl AuctionFilter {
    pub fn matches(&self, auction: &Auction) -> bool {
        if let Some(status) = self.status {
            if auction.status != status {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &auction.category != category {
                return false;
            }
        }
        if let Some(name) = &self.product_name {
            if !auction
                .product_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}
// endregion: --- Auction Model

// endregion: --- Tests
