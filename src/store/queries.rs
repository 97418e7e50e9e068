/// 경매 생성 (id 충돌 시 아무것도 하지 않음)
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (id, product_name, category, description, condition, status, created_at, expires_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (id) DO NOTHING
    RETURNING id
"#;

/// 경매 조회
pub const GET_AUCTION: &str = "SELECT id, product_name, category, description, condition, status, created_at, expires_at FROM auctions WHERE id = $1";

/// 경매 목록 조회 (조건은 QueryBuilder 로 덧붙임)
pub const LIST_AUCTIONS: &str = "SELECT id, product_name, category, description, condition, status, created_at, expires_at FROM auctions WHERE 1 = 1";

/// 만료된 진행 중 경매 조회
pub const GET_EXPIRED_ACTIVE: &str = r#"
    SELECT id, product_name, category, description, condition, status, created_at, expires_at
    FROM auctions
    WHERE status = 'ACTIVE' AND expires_at <= $1
    ORDER BY expires_at
"#;

/// ACTIVE -> COMPLETED 조건부 변경
pub const COMPLETE_IF_ACTIVE: &str =
    "UPDATE auctions SET status = 'COMPLETED' WHERE id = $1 AND status = 'ACTIVE' RETURNING id";

/// 경매 존재 여부
pub const AUCTION_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM auctions WHERE id = $1)";
