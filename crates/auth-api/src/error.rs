//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 도메인 에러(`AuthError`)를 HTTP 상태 코드와 에러 코드로 변환하는
//! 단일 지점이기도 합니다.

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use auth_core::AuthError;

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "WEAK_PASSWORD",
///   "message": "비밀번호는 최소 6자 이상이어야 합니다",
///   "timestamp": 1756000000
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_CREDENTIALS", "DUPLICATE")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details),
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 에러 코드 반환.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// 에러 메시지 반환.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, (StatusCode, Json<ApiErrorResponse>)>;

/// 도메인 에러 → HTTP 응답 변환.
///
/// 자격증명 관련 실패는 계정 존재 여부가 새지 않도록 모두 동일한
/// `INVALID_CREDENTIALS` 메시지로 납작해집니다. 내부/저장소 에러의
/// 상세 내용은 로그에만 남기고 응답에는 싣지 않습니다.
pub fn auth_error_response(err: AuthError) -> (StatusCode, Json<ApiErrorResponse>) {
    let (status, code, message) = match &err {
        AuthError::WeakPassword { min } => (
            StatusCode::BAD_REQUEST,
            "WEAK_PASSWORD",
            format!("비밀번호는 최소 {min}자 이상이어야 합니다"),
        ),
        AuthError::InvalidPhoneFormat => (
            StatusCode::BAD_REQUEST,
            "INVALID_PHONE_FORMAT",
            "전화번호 형식이 올바르지 않습니다 (예: 010-1234-5678)".to_string(),
        ),
        AuthError::Duplicate => (
            StatusCode::CONFLICT,
            "DUPLICATE",
            "이미 사용 중인 계정 정보입니다".to_string(),
        ),
        AuthError::InvalidCredentials | AuthError::NotFound => (
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            "아이디 또는 비밀번호가 올바르지 않습니다".to_string(),
        ),
        AuthError::Throttled { retry_after } => (
            StatusCode::TOO_MANY_REQUESTS,
            "THROTTLED",
            format!("로그인 시도가 너무 많습니다. {retry_after}초 후 다시 시도하세요"),
        ),
        AuthError::Malformed => (
            StatusCode::BAD_REQUEST,
            "MALFORMED_TOKEN",
            "토큰 형식이 올바르지 않습니다".to_string(),
        ),
        AuthError::BadSignature => (
            StatusCode::BAD_REQUEST,
            "BAD_SIGNATURE",
            "토큰 서명이 유효하지 않습니다".to_string(),
        ),
        AuthError::Expired => (
            StatusCode::UNAUTHORIZED,
            "TOKEN_EXPIRED",
            "토큰이 만료되었습니다".to_string(),
        ),
        AuthError::Revoked => (
            StatusCode::UNAUTHORIZED,
            "TOKEN_REVOKED",
            "무효화된 토큰입니다".to_string(),
        ),
        AuthError::Forbidden => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "접근 권한이 없습니다".to_string(),
        ),
        AuthError::Unavailable(reason) => {
            tracing::warn!(%reason, "Storage unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                "일시적으로 요청을 처리할 수 없습니다. 잠시 후 다시 시도하세요".to_string(),
            )
        }
        AuthError::Internal(reason) => {
            tracing::error!(%reason, "Internal error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "서버 내부 오류가 발생했습니다".to_string(),
            )
        }
    };

    (status, Json(ApiErrorResponse::new(code, message)))
}
