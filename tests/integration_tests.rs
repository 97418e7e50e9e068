use auction_lifecycle::auction::{
    Auction, AuctionCondition, AuctionFilter, AuctionStatus, ExpiryPolicy, NewAuction,
};
use auction_lifecycle::config::{
    AppConfig, SchedulerConfig, AUCTION_INTERVAL, AUCTION_SWEEP_PERIOD,
};
use auction_lifecycle::scheduler::AuctionScheduler;
use auction_lifecycle::store::{
    AuctionStore, InMemoryAuctionStore, OptimisticAuctionStore, StoreError,
};
use chrono::Utc;
use std::sync::{Arc, Once};
use std::time::Duration;
use tracing::info;

static TRACING: Once = Once::new();

/// 트레이싱 초기화
fn init_tracing() {
    TRACING.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .without_time()
            .with_target(false)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).expect("트레이싱 구독자 설정 실패");
    });
}

fn test_request(product_name: &str) -> NewAuction {
    NewAuction {
        product_name: product_name.to_string(),
        category: "General".to_string(),
        description: "Test description for lifecycle checks".to_string(),
        condition: AuctionCondition::New,
    }
}

/// 테스트용 경매 생성
async fn create_test_auction<S: AuctionStore>(
    store: &S,
    policy: &ExpiryPolicy,
    product_name: &str,
) -> Auction {
    let auction = Auction::open(test_request(product_name), policy, Utc::now()).unwrap();
    store.create(&auction).await.unwrap();
    auction
}

/// 경매 자동 종료 테스트 (경매 기간 1초)
#[tokio::test]
async fn test_create_auction_automatic_closure() {
    init_tracing();

    let config = AppConfig::from_lookup(|key| match key {
        AUCTION_INTERVAL => Some("1s".to_string()),
        AUCTION_SWEEP_PERIOD => Some("250ms".to_string()),
        _ => None,
    })
    .unwrap()
    .scheduler;
    let store = Arc::new(InMemoryAuctionStore::new());
    let scheduler = AuctionScheduler::new(Arc::clone(&store), config);
    scheduler.start().await.unwrap();

    let auction =
        create_test_auction(store.as_ref(), &scheduler.expiry_policy(), "Test Product").await;

    // 생성 직후 상태 확인
    let inserted = store.find_by_id(&auction.id).await.unwrap();
    assert_eq!(inserted.status, AuctionStatus::Active);

    tokio::time::sleep(Duration::from_secs(2)).await;

    // 경매 기간 경과 후 상태 확인
    let updated = store.find_by_id(&auction.id).await.unwrap();
    assert_eq!(updated.status, AuctionStatus::Completed);

    scheduler.stop().await;
}

/// 마감 전 경매는 ACTIVE 유지
#[tokio::test]
async fn test_auction_before_deadline_stays_active() {
    init_tracing();

    let config = SchedulerConfig {
        auction_interval: Duration::from_secs(3600),
        sweep_period: Duration::from_millis(50),
        sweep_concurrency: 4,
    };
    let store = Arc::new(InMemoryAuctionStore::new());
    let scheduler = AuctionScheduler::new(Arc::clone(&store), config);
    scheduler.start().await.unwrap();

    let auction =
        create_test_auction(store.as_ref(), &scheduler.expiry_policy(), "Long Auction").await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        store.find_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Active
    );
    scheduler.stop().await;
}

/// 재시작 시나리오: 이미 만료된 ACTIVE 경매가 있는 저장소
#[tokio::test]
async fn test_restart_closes_already_expired_auction() {
    init_tracing();

    let config = SchedulerConfig {
        auction_interval: Duration::from_millis(200),
        sweep_period: Duration::from_millis(100),
        sweep_concurrency: 4,
    };
    let store = Arc::new(InMemoryAuctionStore::new());

    // 첫 번째 프로세스: 마감 전에 중지
    let first = AuctionScheduler::new(Arc::clone(&store), config);
    first.start().await.unwrap();
    let auction = create_test_auction(store.as_ref(), &first.expiry_policy(), "Restart").await;
    first.stop().await;

    // 중지된 동안 마감 시각 경과
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        store.find_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Active
    );

    // 두 번째 프로세스: 한 주기 안에 종료
    let second = AuctionScheduler::new(Arc::clone(&store), config);
    second.start().await.unwrap();
    tokio::time::sleep(config.sweep_period + Duration::from_millis(100)).await;
    assert_eq!(
        store.find_by_id(&auction.id).await.unwrap().status,
        AuctionStatus::Completed
    );
    second.stop().await;
}

/// 여러 스케줄러 인스턴스가 같은 저장소를 스윕
#[tokio::test]
async fn test_multiple_schedulers_close_each_auction_once() {
    init_tracing();

    let config = SchedulerConfig {
        auction_interval: Duration::from_millis(100),
        sweep_period: Duration::from_millis(20),
        sweep_concurrency: 8,
    };
    let store = Arc::new(OptimisticAuctionStore::new(InMemoryAuctionStore::new()));
    let policy = ExpiryPolicy::new(config.auction_interval);

    let mut auctions = Vec::new();
    for i in 0..30 {
        auctions.push(create_test_auction(store.as_ref(), &policy, &format!("Item {}", i)).await);
    }

    let schedulers: Vec<_> = (0..3)
        .map(|_| AuctionScheduler::new(Arc::clone(&store), config))
        .collect();
    for scheduler in &schedulers {
        scheduler.start().await.unwrap();
    }

    // 조회 트래픽은 스케줄러와 동시에 진행
    let reader = {
        let store = Arc::clone(&store);
        let ids: Vec<_> = auctions.iter().map(|a| a.id.clone()).collect();
        tokio::spawn(async move {
            for _ in 0..20 {
                for id in &ids {
                    store.find_by_id(id).await.unwrap();
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    reader.await.unwrap();
    for scheduler in &schedulers {
        scheduler.stop().await;
    }

    let completed = store
        .find_auctions(&AuctionFilter {
            status: Some(AuctionStatus::Completed),
            ..Default::default()
        })
        .await
        .unwrap();
    info!("종료된 경매 수: {}", completed.len());
    assert_eq!(completed.len(), auctions.len());

    // 이미 종료된 경매를 다시 닫으면 no-op
    for auction in &auctions {
        assert!(!store.compare_and_set_completed(&auction.id).await.unwrap());
    }
}

/// 중복 id 생성 거부
#[tokio::test]
async fn test_duplicate_auction_rejected() {
    let store = InMemoryAuctionStore::new();
    let policy = ExpiryPolicy::new(Duration::from_secs(60));
    let auction = create_test_auction(&store, &policy, "Duplicate").await;

    let err = store.create(&auction).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateId(id) if id == auction.id));
}
