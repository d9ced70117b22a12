//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/signup`, `/login`, `/logout`, `/password` - 인증
//! - `/api/user/test` - user 등급 이상
//! - `/api/admin/stats` - admin 전용
//! - `/api/public/info` - 공개 정보

pub mod auth;
pub mod health;
pub mod protected;

pub use auth::{auth_router, ChangePasswordRequest, LoginRequest, LoginResponse, SignupRequest};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use protected::{protected_router, AdminStatsResponse, PublicInfoResponse, UserTestResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
/// 인가 extractor가 사용하는 `AuthContext` Extension 레이어는
/// 호출 측(main)에서 상태와 함께 부착합니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // 인증 엔드포인트
        .merge(auth_router())
        // 역할 보호 구간
        .nest("/api", protected_router())
}
