// region:    --- Imports
use auction_lifecycle::config::AppConfig;
use auction_lifecycle::database::DatabaseManager;
use auction_lifecycle::scheduler::AuctionScheduler;
use auction_lifecycle::store::PostgresAuctionStore;
use std::sync::Arc;
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일이 있으면 환경 변수로 로드
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // 설정 로드 (시작 시 한 번)
    let config = AppConfig::from_env()?;
    info!("{:<12} --> 설정 로드: {:?}", "Main", config.scheduler);

    // DatabaseManager 생성
    let db_manager =
        DatabaseManager::new(config.require_database_url()?, config.database_max_connections)
            .await?;

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 경매 상태 업데이트 스케줄러 시작
    let store = Arc::new(PostgresAuctionStore::new(db_manager.get_pool()));
    let scheduler = AuctionScheduler::new(store, config.scheduler);
    scheduler.start().await?;

    // 종료 신호 대기
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("{:<12} --> 종료 신호 수신 실패: {:?}", "Main", e);
    }
    info!("{:<12} --> 종료 신호 수신, 스케줄러 중지 대기", "Main");

    scheduler.stop().await;
    db_manager.pool().close().await;
    info!("{:<12} --> 종료", "Main");
    Ok(())
}
// endregion: --- Main
