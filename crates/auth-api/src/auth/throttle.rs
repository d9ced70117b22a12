//! 로그인 실패 스로틀링.
//!
//! 식별자별 고정 윈도우 실패 카운터를 제공합니다.
//! 카운터는 식별자 단위로 독립적이므로 무관한 계정의 로그인 시도끼리
//! 경합하지 않습니다. 상태는 휘발성이며 성공 또는 윈도우 만료 시
//! 초기화됩니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// 스로틀 설정.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// 윈도우 내 허용되는 최대 실패 횟수
    pub max_failures: u32,
    /// 실패 카운트 윈도우
    pub window: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window: Duration::from_secs(300),
        }
    }
}

impl ThrottleConfig {
    /// 새 설정 생성.
    pub fn new(max_failures: u32, window_secs: u64) -> Self {
        Self {
            max_failures,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// 식별자별 실패 윈도우.
#[derive(Debug)]
struct FailureWindow {
    /// 윈도우 시작 이후 실패 횟수
    count: u32,
    /// 윈도우 시작 시각 (첫 실패)
    window_start: Instant,
}

/// 스로틀 판정 결과.
#[derive(Debug, Clone)]
pub enum ThrottleResult {
    /// 시도 허용
    Allowed,
    /// 실패 한도 초과
    Throttled {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// 로그인 실패 스로틀러.
///
/// 한도를 초과한 식별자는 윈도우가 끝날 때까지 저장소 조회 없이
/// 즉시 거부됩니다 (해시 비교 비용조차 쓰지 않음).
pub struct LoginThrottle {
    config: ThrottleConfig,
    windows: RwLock<HashMap<String, FailureWindow>>,
}

impl LoginThrottle {
    /// 새 스로틀러 생성.
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            windows: RwLock::new(HashMap::new()),
        }
    }

    /// 기본 설정으로 생성.
    pub fn with_defaults() -> Self {
        Self::new(ThrottleConfig::default())
    }

    /// 시도 허용 여부 확인.
    ///
    /// 한도 초과 상태면 `Throttled`를 반환하고, 윈도우가 이미 지난
    /// 엔트리는 제거 후 허용합니다.
    pub async fn check(&self, identifier: &str) -> ThrottleResult {
        let mut windows = self.windows.write().await;

        let Some(window) = windows.get(identifier) else {
            return ThrottleResult::Allowed;
        };

        let elapsed = window.window_start.elapsed();
        if elapsed >= self.config.window {
            // 윈도우 만료 - 카운터 리셋
            windows.remove(identifier);
            return ThrottleResult::Allowed;
        }

        if window.count >= self.config.max_failures {
            let retry_after = (self.config.window - elapsed).as_secs().max(1);
            metrics::counter!("auth_login_throttled_total").increment(1);
            return ThrottleResult::Throttled { retry_after };
        }

        ThrottleResult::Allowed
    }

    /// 실패 기록.
    pub async fn record_failure(&self, identifier: &str) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();

        let window = windows.entry(identifier.to_string()).or_insert(FailureWindow {
            count: 0,
            window_start: now,
        });

        // 만료된 윈도우면 새로 시작
        if window.window_start.elapsed() >= self.config.window {
            window.count = 0;
            window.window_start = now;
        }

        window.count += 1;
    }

    /// 성공 시 카운터 초기화.
    pub async fn reset(&self, identifier: &str) {
        self.windows.write().await.remove(identifier);
    }

    /// 만료된 윈도우 정리.
    pub async fn cleanup(&self) {
        let mut windows = self.windows.write().await;
        let window_len = self.config.window;
        windows.retain(|_, w| w.window_start.elapsed() < window_len);
    }

    /// 현재 추적 중인 식별자 수.
    pub async fn tracked_identifiers(&self) -> usize {
        self.windows.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_under_threshold() {
        let throttle = LoginThrottle::new(ThrottleConfig::new(3, 60));

        for _ in 0..2 {
            throttle.record_failure("alice").await;
        }

        assert!(matches!(
            throttle.check("alice").await,
            ThrottleResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_throttles_at_threshold() {
        let throttle = LoginThrottle::new(ThrottleConfig::new(3, 60));

        for _ in 0..3 {
            throttle.record_failure("alice").await;
        }

        let result = throttle.check("alice").await;
        assert!(matches!(result, ThrottleResult::Throttled { retry_after } if retry_after <= 60));
    }

    #[tokio::test]
    async fn test_identifiers_are_independent() {
        let throttle = LoginThrottle::new(ThrottleConfig::new(1, 60));

        throttle.record_failure("alice").await;

        assert!(matches!(
            throttle.check("alice").await,
            ThrottleResult::Throttled { .. }
        ));
        assert!(matches!(
            throttle.check("bob").await,
            ThrottleResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_counter() {
        let throttle = LoginThrottle::new(ThrottleConfig::new(1, 60));

        throttle.record_failure("alice").await;
        throttle.reset("alice").await;

        assert!(matches!(
            throttle.check("alice").await,
            ThrottleResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_window_expiry_allows_again() {
        let throttle = LoginThrottle::new(ThrottleConfig {
            max_failures: 1,
            window: Duration::from_millis(20),
        });

        throttle.record_failure("alice").await;
        assert!(matches!(
            throttle.check("alice").await,
            ThrottleResult::Throttled { .. }
        ));

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(matches!(
            throttle.check("alice").await,
            ThrottleResult::Allowed
        ));
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired_windows() {
        let throttle = LoginThrottle::new(ThrottleConfig {
            max_failures: 5,
            window: Duration::from_millis(10),
        });

        throttle.record_failure("alice").await;
        assert_eq!(throttle.tracked_identifiers().await, 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        throttle.cleanup().await;

        assert_eq!(throttle.tracked_identifiers().await, 0);
    }
}
