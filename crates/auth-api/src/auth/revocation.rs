//! 토큰 조기 무효화 레지스트리.
//!
//! 자연 만료 전에 죽은 토큰(`jti`)을 추적하는, 인가 핫패스의 유일한
//! 공유 가변 상태입니다. 읽기(모든 보호 요청)가 쓰기(로그아웃)보다
//! 압도적으로 많으므로 RwLock 기반으로 구성합니다.
//!
//! 만료 시각이 지난 엔트리는 쓰레기입니다 - 만료 검사는 코덱이 독립적으로
//! 수행하므로 `sweep`으로 제거해도 정확성에 영향이 없습니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::Claims;

/// 무효화 레지스트리.
///
/// 두 가지 무효화 경로를 지원합니다:
/// - `jti` 단위: 로그아웃된 개별 토큰
/// - 계정 워터마크: "T 이전에 발급된 토큰은 모두 무효"
///   (비밀번호 변경 시 해당 계정의 미회수 토큰 전체를 죽이는 용도)
#[derive(Default)]
pub struct RevocationRegistry {
    /// jti → 원래 만료 시각 (Unix timestamp)
    revoked: RwLock<HashMap<String, i64>>,
    /// 계정 식별자 → 발급 시각 워터마크 (이전 발급분 무효)
    watermarks: RwLock<HashMap<String, i64>>,
}

impl RevocationRegistry {
    /// 새 레지스트리 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 토큰 무효화 등록.
    ///
    /// 멱등적 - 같은 `jti`를 두 번 등록해도 효과는 동일합니다.
    pub async fn revoke(&self, jti: &str, original_exp: i64) {
        let mut revoked = self.revoked.write().await;
        revoked.insert(jti.to_string(), original_exp);
        metrics::counter!("auth_tokens_revoked_total").increment(1);
    }

    /// 무효화 여부 확인 (O(1) 조회).
    pub async fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.read().await.contains_key(jti)
    }

    /// 계정 워터마크 설정.
    ///
    /// `before` 이전에 발급된 해당 계정의 모든 토큰을 무효로 만듭니다.
    /// 계정별 미회수 `jti` 전체를 추적하는 대신 타임스탬프 하나로
    /// 메모리를 상수로 유지합니다.
    pub async fn void_issued_before(&self, subject: &str, before: i64) {
        let mut watermarks = self.watermarks.write().await;
        let entry = watermarks.entry(subject.to_string()).or_insert(before);
        // 워터마크는 단조 증가만 허용
        if *entry < before {
            *entry = before;
        }
    }

    /// 페이로드 기준 무효화 판정.
    ///
    /// `jti` 무효화 또는 계정 워터마크 중 하나라도 걸리면 무효입니다.
    pub async fn is_invalidated(&self, claims: &Claims) -> bool {
        if self.is_revoked(&claims.jti).await {
            return true;
        }

        let watermarks = self.watermarks.read().await;
        matches!(watermarks.get(&claims.sub), Some(&before) if claims.iat < before)
    }

    /// 만료가 지난 엔트리 정리.
    ///
    /// `original_exp <= now`인 jti 엔트리와, 최대 토큰 수명보다 오래된
    /// 워터마크를 제거합니다 (그 이전 발급분은 이미 만료 검사에서 죽음).
    pub async fn sweep(&self, now: i64, max_token_ttl_secs: i64) {
        let removed = {
            let mut revoked = self.revoked.write().await;
            let before = revoked.len();
            revoked.retain(|_, exp| *exp > now);
            before - revoked.len()
        };

        {
            let mut watermarks = self.watermarks.write().await;
            watermarks.retain(|_, before| *before > now - max_token_ttl_secs);
        }

        if removed > 0 {
            debug!(removed, "Swept expired revocation entries");
        }
    }

    /// 현재 추적 중인 무효화 엔트리 수.
    pub async fn len(&self) -> usize {
        self.revoked.read().await.len()
    }

    /// 레지스트리가 비어 있는지 확인.
    pub async fn is_empty(&self) -> bool {
        self.revoked.read().await.is_empty()
    }
}

/// 주기적 sweep 백그라운드 태스크 시작.
///
/// # Arguments
///
/// * `registry` - 대상 레지스트리
/// * `interval` - 정리 주기
/// * `max_token_ttl` - 발급되는 토큰의 최대 수명 (워터마크 정리 기준)
/// * `shutdown` - graceful shutdown을 위한 CancellationToken
pub fn start_revocation_sweeper(
    registry: Arc<RevocationRegistry>,
    interval: Duration,
    max_token_ttl: Duration,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = chrono::Utc::now().timestamp();
                    registry.sweep(now, max_token_ttl.as_secs() as i64).await;
                }
                _ = shutdown.cancelled() => {
                    info!("Revocation sweeper stopped");
                    break;
                }
            }
        }
    })
}
