//! 인가 미들웨어 (extractor 기반).
//!
//! 보호 라우트는 핸들러 시그니처에 `UserAuth` / `AdminAuth`를 선언하는
//! 것만으로 인가됩니다. 추출 순서는 항상 인증(토큰 검증 + 무효화 확인)
//! 후 인가(역할 비교)이며, 실패 지점에 따라 401과 403이 구분됩니다.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use auth_core::{AuthError, Role};

use super::revocation::RevocationRegistry;
use super::token::{Claims, TokenCodec};
use crate::error::ApiErrorResponse;

/// 라우터 전체에 주입되는 인가 컨텍스트.
///
/// `Extension` 레이어로 요청 확장에 실려 extractor가 꺼내 씁니다.
#[derive(Clone)]
pub struct AuthContext {
    pub codec: Arc<TokenCodec>,
    pub revocations: Arc<RevocationRegistry>,
}

/// 인가 실패 사유.
///
/// 401 계열(누가인지 모름)과 403(누군지는 알지만 권한 부족)을
/// 구분합니다.
#[derive(Debug)]
pub enum AuthRejection {
    /// Authorization 헤더 없음
    MissingToken,
    /// Bearer 형식이 아닌 헤더
    InvalidAuthHeader,
    /// 토큰 구조 훼손
    Malformed,
    /// 서명 불일치
    BadSignature,
    /// 만료된 토큰
    Expired,
    /// 조기 무효화된 토큰
    Revoked,
    /// 역할 부족
    Forbidden,
    /// 컨텍스트 미주입 (라우터 구성 오류)
    ContextMissing,
}

impl AuthRejection {
    fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::ContextMissing => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::InvalidAuthHeader => "INVALID_AUTH_HEADER",
            Self::Malformed => "MALFORMED_TOKEN",
            Self::BadSignature => "BAD_SIGNATURE",
            Self::Expired => "TOKEN_EXPIRED",
            Self::Revoked => "TOKEN_REVOKED",
            Self::Forbidden => "FORBIDDEN",
            Self::ContextMissing => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::MissingToken => "인증 토큰이 필요합니다",
            Self::InvalidAuthHeader => "Authorization 헤더 형식이 올바르지 않습니다",
            Self::Malformed => "토큰 형식이 올바르지 않습니다",
            Self::BadSignature => "토큰 서명이 유효하지 않습니다",
            Self::Expired => "토큰이 만료되었습니다",
            Self::Revoked => "무효화된 토큰입니다",
            Self::Forbidden => "접근 권한이 없습니다",
            Self::ContextMissing => "서버 내부 오류가 발생했습니다",
        }
    }
}

impl From<AuthError> for AuthRejection {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired => Self::Expired,
            AuthError::BadSignature => Self::BadSignature,
            AuthError::Revoked => Self::Revoked,
            AuthError::Forbidden => Self::Forbidden,
            _ => Self::Malformed,
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!(
            "auth_rejections_total",
            "code" => self.code()
        )
        .increment(1);
        (
            status,
            Json(ApiErrorResponse::new(self.code(), self.message())),
        )
            .into_response()
    }
}

/// Authorization 헤더에서 Bearer 토큰을 꺼냅니다.
fn bearer_token(parts: &Parts) -> Result<&str, AuthRejection> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthRejection::MissingToken)?;

    let value = header
        .to_str()
        .map_err(|_| AuthRejection::InvalidAuthHeader)?;

    value
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthRejection::InvalidAuthHeader)
}

/// 토큰 검증 + 무효화 확인까지 통과한 페이로드 추출.
async fn authenticate(parts: &mut Parts) -> Result<Claims, AuthRejection> {
    let context = parts
        .extensions
        .get::<AuthContext>()
        .cloned()
        .ok_or(AuthRejection::ContextMissing)?;

    let token = bearer_token(parts)?;
    let claims = context.codec.verify(token)?;

    if context.revocations.is_invalidated(&claims).await {
        return Err(AuthRejection::Revoked);
    }

    Ok(claims)
}

/// 역할 비교.
///
/// 보유 역할의 등급이 요구 등급 이상이면 통과합니다.
pub fn require_role(claims: &Claims, required: Role) -> Result<(), AuthRejection> {
    if claims.role.satisfies(required) {
        Ok(())
    } else {
        Err(AuthRejection::Forbidden)
    }
}

/// 유효한 토큰만 요구하는 extractor (역할 무관).
pub struct JwtAuth(pub Claims);

impl<S> FromRequestParts<S> for JwtAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts).await?))
    }
}

/// user 등급 이상을 요구하는 extractor.
pub struct UserAuth(pub Claims);

impl<S> FromRequestParts<S> for UserAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = authenticate(parts).await?;
        require_role(&claims, Role::User)?;
        Ok(Self(claims))
    }
}

/// admin 등급을 요구하는 extractor.
pub struct AdminAuth(pub Claims);

impl<S> FromRequestParts<S> for AdminAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = authenticate(parts).await?;
        require_role(&claims, Role::Admin)?;
        Ok(Self(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::{Extension, Router};
    use chrono::Utc;
    use tower::ServiceExt;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn test_context() -> (AuthContext, Arc<TokenCodec>, Arc<RevocationRegistry>) {
        let codec = Arc::new(TokenCodec::new(TEST_SECRET, 60));
        let revocations = Arc::new(RevocationRegistry::new());
        (
            AuthContext {
                codec: Arc::clone(&codec),
                revocations: Arc::clone(&revocations),
            },
            codec,
            revocations,
        )
    }

    fn test_router(context: AuthContext) -> Router {
        async fn user_handler(UserAuth(claims): UserAuth) -> String {
            claims.sub
        }
        async fn admin_handler(AdminAuth(claims): AdminAuth) -> String {
            claims.sub
        }

        Router::new()
            .route("/user", get(user_handler))
            .route("/admin", get(admin_handler))
            .layer(Extension(context))
    }

    fn request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_rejected_with_401() {
        let (context, _, _) = test_context();
        let app = test_router(context);

        let response = app.oneshot(request("/user", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_header_rejected() {
        let (context, _, _) = test_context();
        let app = test_router(context);

        let req = Request::builder()
            .uri("/user")
            .header(header::AUTHORIZATION, "Basic abcdef")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_token_passes_user_route() {
        let (context, codec, _) = test_context();
        let app = test_router(context);
        let issued = codec.issue("alice", Role::User).unwrap();

        let response = app
            .oneshot(request("/user", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_user_token_forbidden_on_admin_route() {
        let (context, codec, _) = test_context();
        let app = test_router(context);
        let issued = codec.issue("alice", Role::User).unwrap();

        let response = app
            .oneshot(request("/admin", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_token_passes_both_routes() {
        let (context, codec, _) = test_context();
        let issued = codec.issue("root", Role::Admin).unwrap();

        let app = test_router(test_context().0);
        // 같은 코덱 시크릿이므로 어느 컨텍스트에서도 검증 가능
        let response = app
            .oneshot(request("/admin", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let app = test_router(test_context().0);
        let response = app
            .oneshot(request("/user", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_revoked_token_rejected() {
        let (context, codec, revocations) = test_context();
        let app = test_router(context);
        let issued = codec.issue("alice", Role::User).unwrap();

        revocations.revoke(&issued.claims.jti, issued.claims.exp).await;

        let response = app
            .oneshot(request("/user", Some(&issued.token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let (context, codec, _) = test_context();
        let app = test_router(context);

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "alice".to_string(),
            role: Role::User,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = codec.sign(&claims).unwrap();

        let response = app.oneshot(request("/user", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_role_ordering() {
        let claims = |role| Claims {
            sub: "x".to_string(),
            role,
            jti: "j".to_string(),
            iat: 0,
            exp: i64::MAX,
        };

        assert!(require_role(&claims(Role::Admin), Role::User).is_ok());
        assert!(require_role(&claims(Role::Admin), Role::Admin).is_ok());
        assert!(require_role(&claims(Role::User), Role::User).is_ok());
        assert!(require_role(&claims(Role::User), Role::Admin).is_err());
    }
}
