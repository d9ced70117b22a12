//! 인증 endpoint.
//!
//! 회원가입, 로그인, 로그아웃, 비밀번호 변경 엔드포인트를 제공합니다.
//!
//! 실패 응답은 `error::auth_error_response`를 통해 일관된 형식으로
//! 내려가며, 자격증명 실패는 계정 존재 여부를 드러내지 않습니다.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use auth_core::{Account, AuthError};

use crate::error::{auth_error_response, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 회원가입 요청.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// 계정 식별자 (로그인 ID)
    pub identifier: String,
    /// 비밀번호 (평문, 저장 전 해싱)
    pub password: String,
    /// 전화번호 (NNN-NNNN-NNNN)
    pub phone: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// 서명된 JWT
    pub token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// 만료 시각 (Unix timestamp)
    pub expires_at: i64,
}

/// 비밀번호 변경 요청.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub identifier: String,
    pub old_password: String,
    pub new_password: String,
}

/// 회원가입.
///
/// POST /signup
///
/// 성공 시 201과 생성된 계정(해시 제외)을 반환합니다.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let account = state
        .gate
        .signup(&req.identifier, &req.password, &req.phone)
        .await
        .map_err(auth_error_response)?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// 로그인.
///
/// POST /login
///
/// 스로틀 거부(429)에는 `Retry-After` 헤더가 실립니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    match state.gate.login(&req.identifier, &req.password).await {
        Ok(issued) => (
            StatusCode::OK,
            Json(LoginResponse {
                token: issued.token,
                token_type: "Bearer".to_string(),
                expires_at: issued.claims.exp,
            }),
        )
            .into_response(),
        Err(err) => {
            let retry_after = match &err {
                AuthError::Throttled { retry_after } => Some(*retry_after),
                _ => None,
            };
            let mut response = auth_error_response(err).into_response();
            if let Some(secs) = retry_after {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(secs));
            }
            response
        }
    }
}

/// 로그아웃.
///
/// POST /logout
///
/// Authorization 헤더의 Bearer 토큰을 무효화합니다. 멱등적이며,
/// 이미 만료된 토큰도 성공(204)으로 처리합니다.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let token = bearer_from_headers(&headers)?;

    state
        .gate
        .logout(token)
        .await
        .map_err(auth_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// 비밀번호 변경.
///
/// POST /password
///
/// 기존 비밀번호로 재인증 후 변경하며, 성공 시 해당 계정의 기존
/// 토큰이 전부 무효화됩니다.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .gate
        .change_password(&req.identifier, &req.old_password, &req.new_password)
        .await
        .map_err(auth_error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Authorization 헤더에서 Bearer 토큰 추출.
fn bearer_from_headers(
    headers: &HeaderMap,
) -> Result<&str, (StatusCode, Json<ApiErrorResponse>)> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorResponse::new(
                    "INVALID_AUTH_HEADER",
                    "Authorization 헤더에 Bearer 토큰이 필요합니다",
                )),
            )
        })
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password", post(change_password))
}
