//! JWT 토큰 처리.
//!
//! 서명된 세션 토큰의 생성(issue)과 검증(verify) 로직.
//! 토큰은 표준 compact JWS(헤더.페이로드.서명, base64url) 형식이므로
//! 외부의 표준 검증기와 상호 호환됩니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use auth_core::{AuthError, AuthResult, Role};

/// JWT 페이로드.
///
/// 토큰 자체가 신원과 역할을 증명하므로 검증 시 저장소 조회가 필요 없습니다.
/// 발급 이후 불변이며, 역할 변경은 재발급으로만 반영됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 계정 식별자
    pub sub: String,
    /// 사용자 역할
    pub role: Role,
    /// JWT ID - 토큰 고유 식별자 (조기 무효화의 키)
    pub jti: String,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// 새로운 Claims 생성.
    ///
    /// `exp = iat + ttl`이며 `jti`는 매번 새로 생성됩니다.
    pub fn new(subject: impl Into<String>, role: Role, ttl_minutes: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            role,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ttl_minutes)).timestamp(),
        }
    }

    /// 토큰이 만료되었는지 확인.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// 특정 역할 이상인지 확인.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.satisfies(required)
    }
}

/// 발급된 토큰과 그 페이로드.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// 인코딩된 JWT 문자열
    pub token: String,
    /// 발급 시점의 페이로드
    pub claims: Claims,
}

/// JWT 서명/검증기.
///
/// 서버가 보유한 대칭 비밀 키로 HS256 서명을 생성/검증합니다.
/// 공유 상태가 없는 순수 연산이므로 동기화 없이 동시 사용이 안전합니다.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl TokenCodec {
    /// 새 코덱 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - 서버 보유 비밀 키
    /// * `ttl_minutes` - 발급 토큰의 기본 수명 (분)
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// 토큰 수명 (분).
    pub fn ttl_minutes(&self) -> i64 {
        self.ttl_minutes
    }

    /// 주어진 페이로드에 서명.
    pub fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("토큰 인코딩 실패: {}", e)))
    }

    /// 새 토큰 발급.
    ///
    /// subject와 role로 fresh한 `jti`를 가진 페이로드를 만들고 서명합니다.
    pub fn issue(&self, subject: &str, role: Role) -> AuthResult<IssuedToken> {
        let claims = Claims::new(subject, role, self.ttl_minutes);
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// 토큰 디코딩 및 검증.
    ///
    /// 서명 검증과 만료 검사는 독립적인 관문입니다:
    /// 서명이 온전한 만료 토큰은 `Expired`로, 변조는 `BadSignature`로,
    /// 구조적 오류는 `Malformed`로 구분되어 실패합니다.
    /// 서명 비교는 내부적으로 constant-time으로 수행됩니다.
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // 만료 판정은 정확한 시각 기준 (기본 60초 leeway 제거)
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::BadSignature,
                _ => AuthError::Malformed,
            })
    }
}
