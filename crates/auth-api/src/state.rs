//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 모든 API 핸들러에서 공유되는 상태를 관리합니다.
//! Arc로 래핑되어 여러 요청 간에 안전하게 공유됩니다.

use std::sync::Arc;

use auth_core::AuthConfig;

use crate::auth::{AuthContext, AuthenticationGate, RevocationRegistry, TokenCodec};
use crate::repository::AccountStore;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 계정 저장소 (PostgreSQL 또는 인메모리)
    pub store: Arc<dyn AccountStore>,

    /// 인증 게이트 - 가입/로그인/로그아웃/비밀번호 변경
    pub gate: Arc<AuthenticationGate>,

    /// 토큰 코덱 (extractor 컨텍스트용)
    pub codec: Arc<TokenCodec>,

    /// 무효화 레지스트리
    pub revocations: Arc<RevocationRegistry>,

    /// 데이터베이스 연결 풀 (인메모리 저장소 사용 시 None)
    pub db_pool: Option<sqlx::PgPool>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(
        store: Arc<dyn AccountStore>,
        codec: Arc<TokenCodec>,
        config: &AuthConfig,
    ) -> Result<Self, auth_core::AuthError> {
        let revocations = Arc::new(RevocationRegistry::new());
        let gate = Arc::new(AuthenticationGate::new(
            Arc::clone(&store),
            Arc::clone(&codec),
            Arc::clone(&revocations),
            config,
        )?);

        Ok(Self {
            store,
            gate,
            codec,
            revocations,
            db_pool: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 데이터베이스 풀 설정 (builder 패턴).
    #[must_use]
    pub fn with_db_pool(mut self, pool: sqlx::PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// extractor가 사용할 인가 컨텍스트.
    pub fn auth_context(&self) -> AuthContext {
        AuthContext {
            codec: Arc::clone(&self.codec),
            revocations: Arc::clone(&self.revocations),
        }
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => false,
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 AppState 생성 (인메모리 저장소).
#[cfg(test)]
pub fn create_test_state() -> AppState {
    use crate::repository::MemoryAccountStore;

    let config = AuthConfig::default();
    let codec = Arc::new(TokenCodec::new(
        "test-secret-key-for-jwt-testing-minimum-32-chars",
        config.token_ttl_minutes,
    ));

    AppState::new(Arc::new(MemoryAccountStore::new()), codec, &config)
        .expect("test state construction")
}
