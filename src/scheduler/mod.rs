/// 경매 상태 업데이트 스케줄러
/// 마감 시각이 지난 ACTIVE 경매를 주기적으로 찾아 COMPLETED 로 변경한다.
/// 경매 데이터는 보관하지 않고 매 주기마다 저장소를 다시 조회한다.
/// 중복 종료 방지는 저장소의 조건부 업데이트에 맡긴다.
// region:    --- Imports
use crate::auction::{Auction, ExpiryPolicy};
use crate::config::{ConfigError, SchedulerConfig};
use crate::store::{AuctionStore, StoreError};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

// region:    --- Scheduler Error
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error("scheduler has been stopped")]
    Stopped,

    #[error("invalid scheduler configuration: {0}")]
    Config(#[from] ConfigError),
}
// endregion: --- Scheduler Error

// region:    --- Sweep Report
/// 한 번의 스윕 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub matched: usize,
    pub closed: usize,
    pub already_closed: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum CloseOutcome {
    Closed,
    AlreadyClosed,
    Skipped,
    Failed,
}

impl SweepReport {
    fn record(&mut self, outcome: CloseOutcome) {
        match outcome {
            CloseOutcome::Closed => self.closed += 1,
            CloseOutcome::AlreadyClosed => self.already_closed += 1,
            CloseOutcome::Skipped => self.skipped += 1,
            CloseOutcome::Failed => self.failed += 1,
        }
    }
}
// endregion: --- Sweep Report

// region:    --- Auction Scheduler
enum SchedulerState {
    NotStarted,
    Running {
        shutdown: CancellationToken,
        handle: JoinHandle<()>,
    },
    Stopped,
}

/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler<S> {
    store: Arc<S>,
    config: SchedulerConfig,
    state: Mutex<SchedulerState>,
}

impl<S> AuctionScheduler<S>
where
    S: AuctionStore + 'static,
{
    /// 경매 상태 업데이트 스케줄러 생성
    pub fn new(store: Arc<S>, config: SchedulerConfig) -> Self {
        Self {
            store,
            config,
            state: Mutex::new(SchedulerState::NotStarted),
        }
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.config.expiry_policy()
    }

    /// 스윕 작업이 살아 있는지 확인 (작업이 비정상 종료되면 `false`)
    pub async fn is_running(&self) -> bool {
        match &*self.state.lock().await {
            SchedulerState::Running { handle, .. } => !handle.is_finished(),
            _ => false,
        }
    }

    /// 경매 상태 업데이트 스케줄러 시작
    ///
    /// 설정 오류는 여기서 바로 반환되고 스윕은 시작되지 않는다.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut state = self.state.lock().await;
        match *state {
            SchedulerState::Running { .. } => return Err(SchedulerError::AlreadyRunning),
            SchedulerState::Stopped => return Err(SchedulerError::Stopped),
            SchedulerState::NotStarted => {}
        }
        self.config.validate()?;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(Self::run(
            Arc::clone(&self.store),
            self.config,
            shutdown.clone(),
        ));
        *state = SchedulerState::Running { shutdown, handle };

        info!(
            "{:<12} --> 스케줄러 시작 (주기: {:?}, 경매 기간: {:?})",
            "Scheduler", self.config.sweep_period, self.config.auction_interval
        );
        Ok(())
    }

    /// 경매 상태 업데이트 스케줄러 중지
    ///
    /// 진행 중인 스윕이 끝날 때까지 기다린다. 반환 이후에는 스윕이 실행되지 않는다.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        // 시작 전이면 상태를 바꾸지 않는다
        if !matches!(*state, SchedulerState::Running { .. }) {
            return;
        }
        let previous = std::mem::replace(&mut *state, SchedulerState::Stopped);
        if let SchedulerState::Running { shutdown, handle } = previous {
            shutdown.cancel();
            if let Err(e) = handle.await {
                error!("{:<12} --> 스케줄러 작업 종료 오류: {:?}", "Scheduler", e);
            }
            info!("{:<12} --> 스케줄러 중지", "Scheduler");
        }
    }

    /// 스윕 루프 (취소는 스윕 사이에서만 확인)
    async fn run(store: Arc<S>, config: SchedulerConfig, shutdown: CancellationToken) {
        let mut ticker = interval(config.sweep_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            Self::sweep(store.as_ref(), config.sweep_concurrency).await;
        }
    }

    /// 경매 상태 업데이트 (한 번의 스윕)
    pub(crate) async fn sweep(store: &S, concurrency: usize) -> SweepReport {
        let now = Utc::now();

        let expired = match store.find_expired_active(now).await {
            Ok(expired) => expired,
            Err(e) => {
                error!(
                    "{:<12} --> 만료 경매 조회 중 오류 발생: {:?}",
                    "Scheduler", e
                );
                return SweepReport::default();
            }
        };

        let mut report = SweepReport {
            matched: expired.len(),
            ..Default::default()
        };
        if expired.is_empty() {
            return report;
        }

        let outcomes: Vec<CloseOutcome> = stream::iter(expired)
            .map(move |auction| Self::close(store, auction, now))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;
        for outcome in outcomes {
            report.record(outcome);
        }

        if report.closed > 0 || report.failed > 0 {
            info!("{:<12} --> 스윕 완료: {:?}", "Scheduler", report);
        } else {
            debug!("{:<12} --> 스윕 완료: {:?}", "Scheduler", report);
        }
        report
    }

    /// ACTIVE -> COMPLETED 상태 변경
    async fn close(store: &S, auction: Auction, now: chrono::DateTime<Utc>) -> CloseOutcome {
        // 마감 전 레코드는 닫지 않는다
        if !ExpiryPolicy::is_expired(&auction, now) {
            warn!(
                "{:<12} --> 마감 전 경매가 조회됨, 건너뜀 id: {}",
                "Scheduler", auction.id
            );
            return CloseOutcome::Skipped;
        }

        match store.compare_and_set_completed(&auction.id).await {
            Ok(true) => {
                info!("{:<12} --> 경매 종료 id: {}", "Scheduler", auction.id);
                CloseOutcome::Closed
            }
            Ok(false) => {
                debug!("{:<12} --> 이미 종료된 경매 id: {}", "Scheduler", auction.id);
                CloseOutcome::AlreadyClosed
            }
            Err(StoreError::NotFound(id)) => {
                debug!("{:<12} --> 경매가 존재하지 않음 id: {}", "Scheduler", id);
                CloseOutcome::AlreadyClosed
            }
            Err(e) => {
                error!(
                    "{:<12} --> 경매 상태 업데이트 중 오류 발생 id: {}, {:?}",
                    "Scheduler", auction.id, e
                );
                CloseOutcome::Failed
            }
        }
    }
}

impl<S> Drop for AuctionScheduler<S> {
    fn drop(&mut self) {
        // stop() 없이 버려진 경우 다음 틱을 막는다
        if let SchedulerState::Running { shutdown, .. } = self.state.get_mut() {
            shutdown.cancel();
        }
    }
}
// endregion: --- Auction Scheduler

// endregion: --- Tests
