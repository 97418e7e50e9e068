/// 환경 변수 기반 설정
/// 프로세스 시작 시 한 번 읽어서 생성자로 전달한다.
// region:    --- Imports
use crate::auction::ExpiryPolicy;
use std::collections::HashMap;
use std::env::VarError;
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Keys & Defaults
pub const AUCTION_INTERVAL: &str = "AUCTION_INTERVAL";
pub const AUCTION_SWEEP_PERIOD: &str = "AUCTION_SWEEP_PERIOD";
pub const AUCTION_SWEEP_CONCURRENCY: &str = "AUCTION_SWEEP_CONCURRENCY";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS: &str = "DATABASE_MAX_CONNECTIONS";

pub const DEFAULT_AUCTION_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_SWEEP_CONCURRENCY: usize = 16;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
// endregion: --- Keys & Defaults

// region:    --- Config Error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is not a valid duration ({value:?}): {source}")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("{key} is not a valid number ({value:?})")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("sweep concurrency must be greater than zero")]
    ZeroConcurrency,

    #[error("sweep period {sweep_period:?} is longer than the auction interval {interval:?}")]
    SweepPeriodTooLong {
        sweep_period: Duration,
        interval: Duration,
    },

    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} is not valid unicode")]
    NotUnicode(&'static str),
}
// endregion: --- Config Error

// region:    --- Scheduler Config
/// 스케줄러 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub auction_interval: Duration,
    pub sweep_period: Duration,
    pub sweep_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            auction_interval: DEFAULT_AUCTION_INTERVAL,
            sweep_period: DEFAULT_SWEEP_PERIOD,
            sweep_concurrency: DEFAULT_SWEEP_CONCURRENCY,
        }
    }
}

impl SchedulerConfig {
    /// 스케줄러 시작 전 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auction_interval.is_zero() {
            return Err(ConfigError::ZeroDuration(AUCTION_INTERVAL));
        }
        if self.sweep_period.is_zero() {
            return Err(ConfigError::ZeroDuration(AUCTION_SWEEP_PERIOD));
        }
        if self.sweep_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.sweep_period > self.auction_interval {
            return Err(ConfigError::SweepPeriodTooLong {
                sweep_period: self.sweep_period,
                interval: self.auction_interval,
            });
        }
        Ok(())
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        ExpiryPolicy::new(self.auction_interval)
    }
}
// endregion: --- Scheduler Config

// region:    --- App Config
/// 서비스 전체 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
}

impl AppConfig {
    /// 프로세스 환경 변수에서 읽기
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for key in ENV_KEYS {
            if let Some(value) = env_value(key)? {
                values.insert(key, value);
            }
        }
        Self::from_lookup(|key| values.get(key).cloned())
    }

    /// 임의의 조회 함수에서 읽기 (값이 없으면 기본값)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auction_interval =
            parse_duration(&lookup, AUCTION_INTERVAL)?.unwrap_or(DEFAULT_AUCTION_INTERVAL);
        let sweep_period =
            parse_duration(&lookup, AUCTION_SWEEP_PERIOD)?.unwrap_or(DEFAULT_SWEEP_PERIOD);
        let sweep_concurrency = parse_number::<usize, _>(&lookup, AUCTION_SWEEP_CONCURRENCY)?
            .unwrap_or(DEFAULT_SWEEP_CONCURRENCY);
        let database_max_connections =
            parse_number::<u32, _>(&lookup, DATABASE_MAX_CONNECTIONS)?
                .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        Ok(Self {
            scheduler: SchedulerConfig {
                auction_interval,
                sweep_period,
                sweep_concurrency,
            },
            database_url: non_empty(lookup(DATABASE_URL)),
            database_max_connections,
        })
    }

    /// 데이터베이스 URL (바이너리에서는 필수)
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL))
    }
}

const ENV_KEYS: [&str; 5] = [
    AUCTION_INTERVAL,
    AUCTION_SWEEP_PERIOD,
    AUCTION_SWEEP_CONCURRENCY,
    DATABASE_URL,
    DATABASE_MAX_CONNECTIONS,
];

// 설정되지 않은 값은 `None`, 유니코드가 아닌 값은 오류
fn env_value(key: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode(key)),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_duration<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        None => Ok(None),
        Some(value) => humantime::parse_duration(&value)
            .map(Some)
            .map_err(|source| ConfigError::InvalidDuration { key, value, source }),
    }
}

fn parse_number<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}
// endregion: --- App Config

// region:    --- Tests
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.scheduler, SchedulerConfig::default());
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.database_url.is_none());
        assert!(matches!(
            config.require_database_url(),
            Err(ConfigError::Missing(DATABASE_URL))
        ));
    }

    #[test]
    fn test_parses_go_style_durations() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (AUCTION_INTERVAL, "20s"),
            (AUCTION_SWEEP_PERIOD, "500ms"),
            (AUCTION_SWEEP_CONCURRENCY, "4"),
            (DATABASE_URL, "postgres://localhost/auctions"),
        ]))
        .unwrap();

        assert_eq!(config.scheduler.auction_interval, Duration::from_secs(20));
        assert_eq!(config.scheduler.sweep_period, Duration::from_millis(500));
        assert_eq!(config.scheduler.sweep_concurrency, 4);
        assert_eq!(
            config.require_database_url().unwrap(),
            "postgres://localhost/auctions"
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(AUCTION_INTERVAL, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDuration {
                key: AUCTION_INTERVAL,
                ..
            }
        ));

        let err = AppConfig::from_lookup(lookup_from(&[(AUCTION_SWEEP_CONCURRENCY, "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_env_value_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        const KEY: &str = "AUCTION_LIFECYCLE_CONFIG_TEST_NON_UNICODE";
        std::env::set_var(KEY, OsStr::from_bytes(b"5\xffm"));
        let result = env_value(KEY);
        std::env::remove_var(KEY);

        assert!(matches!(result, Err(ConfigError::NotUnicode(KEY))));
        assert!(matches!(env_value(KEY), Ok(None)));
    }

    #[test]
    fn test_validate_scheduler_config() {
        assert!(SchedulerConfig::default().validate().is_ok());

        let config = SchedulerConfig {
            sweep_period: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration(AUCTION_SWEEP_PERIOD))
        ));

        let config = SchedulerConfig {
            sweep_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroConcurrency)));

        let config = SchedulerConfig {
            auction_interval: Duration::from_secs(1),
            sweep_period: Duration::from_secs(2),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SweepPeriodTooLong { .. })
        ));
    }
}
// endregion: --- Tests
