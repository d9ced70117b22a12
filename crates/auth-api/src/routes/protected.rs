//! 역할 보호 endpoint.
//!
//! 역할별 접근 구간을 제공합니다:
//! - `/api/user/test` - user 등급 이상
//! - `/api/admin/stats` - admin 전용
//! - `/api/public/info` - 인증 불필요
//!
//! 인가는 핸들러 시그니처의 extractor(`UserAuth` / `AdminAuth`)가
//! 수행하므로 핸들러 본문에는 역할 검사가 없습니다.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::{AdminAuth, UserAuth};
use crate::error::{auth_error_response, ApiResult};
use crate::state::AppState;

/// user 구간 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserTestResponse {
    pub message: String,
    /// 토큰의 subject (계정 식별자)
    pub identifier: String,
    pub role: String,
}

/// admin 통계 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminStatsResponse {
    /// 전체 계정 수
    pub total_accounts: i64,
    /// 무효화 레지스트리에 남은 엔트리 수
    pub pending_revocations: usize,
    /// 서버 업타임 (초)
    pub uptime_secs: i64,
    /// 서버 상태
    pub server_status: String,
}

/// 공개 정보 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct PublicInfoResponse {
    pub service: String,
    pub version: String,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
}

/// user 구간 동작 확인.
///
/// GET /api/user/test
pub async fn user_test(UserAuth(claims): UserAuth) -> Json<UserTestResponse> {
    Json(UserTestResponse {
        message: "인증된 사용자입니다".to_string(),
        identifier: claims.sub,
        role: claims.role.to_string(),
    })
}

/// 운영 통계 조회.
///
/// GET /api/admin/stats
pub async fn admin_stats(
    AdminAuth(_claims): AdminAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AdminStatsResponse>> {
    let total_accounts = state.store.count().await.map_err(auth_error_response)?;

    Ok(Json(AdminStatsResponse {
        total_accounts,
        pending_revocations: state.revocations.len().await,
        uptime_secs: state.uptime_secs(),
        server_status: "running".to_string(),
    }))
}

/// 공개 서비스 정보.
///
/// GET /api/public/info
pub async fn public_info(State(state): State<Arc<AppState>>) -> Json<PublicInfoResponse> {
    Json(PublicInfoResponse {
        service: "auth-api".to_string(),
        version: state.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// 보호 구간 라우터 생성.
pub fn protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/test", get(user_test))
        .route("/admin/stats", get(admin_stats))
        .route("/public/info", get(public_info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use auth_core::Role;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Extension;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<AppState>) {
        let state = Arc::new(create_test_state());
        let router = Router::new()
            .nest("/api", protected_router())
            .layer(Extension(state.auth_context()))
            .with_state(Arc::clone(&state));
        (router, state)
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_user_route_requires_token() {
        let (app, _) = app();

        let response = app.oneshot(get_request("/api/user/test", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_route_with_user_token() {
        let (app, state) = app();
        let issued = state.codec.issue("alice", Role::User).unwrap();

        let response = app
            .oneshot(get_request("/api/user/test", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: UserTestResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.identifier, "alice");
        assert_eq!(json.role, "user");
    }

    #[tokio::test]
    async fn test_admin_route_forbidden_for_user() {
        let (app, state) = app();
        let issued = state.codec.issue("alice", Role::User).unwrap();

        let response = app
            .oneshot(get_request("/api/admin/stats", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_route_returns_stats() {
        let (app, state) = app();
        state
            .gate
            .signup("alice", "abcdef", "010-1234-5678")
            .await
            .unwrap();
        let issued = state.codec.issue("root", Role::Admin).unwrap();

        let response = app
            .oneshot(get_request("/api/admin/stats", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let stats: AdminStatsResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats.total_accounts, 1);
        assert_eq!(stats.server_status, "running");
    }

    #[tokio::test]
    async fn test_admin_token_passes_user_route() {
        let (app, state) = app();
        let issued = state.codec.issue("root", Role::Admin).unwrap();

        let response = app
            .oneshot(get_request("/api/user/test", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_public_info_without_token() {
        let (app, _) = app();

        let response = app
            .oneshot(get_request("/api/public/info", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_revoked_token_blocked_on_protected_route() {
        let (app, state) = app();
        let issued = state.codec.issue("alice", Role::User).unwrap();
        state
            .revocations
            .revoke(&issued.claims.jti, issued.claims.exp)
            .await;

        let response = app
            .oneshot(get_request("/api/user/test", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
