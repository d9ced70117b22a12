//! JWT 인증 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (가입/로그인/로그아웃/비밀번호 변경)
//! - JWT 발급/검증 및 조기 무효화
//! - 역할 기반 접근 제어 (user / admin)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰 코덱, 인증 게이트, 인가 extractor
//! - [`repository`]: 계정 영속화 (PostgreSQL / 인메모리)
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod state;

pub use auth::{
    AdminAuth, AuthContext, AuthRejection, AuthenticationGate, Claims, IssuedToken, JwtAuth,
    LoginThrottle, RevocationRegistry, ThrottleConfig, TokenCodec, UserAuth,
    start_revocation_sweeper,
};
pub use error::{auth_error_response, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use repository::{AccountStore, MemoryAccountStore, PgAccountStore};
pub use routes::*;
pub use state::AppState;

#[cfg(test)]
pub use state::create_test_state;
