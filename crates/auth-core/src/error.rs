//! 인증 시스템의 에러 타입.
//!
//! 이 모듈은 인증/권한 부여 전반에서 사용되는 에러 타입을 정의합니다.
//! 각 variant는 호출자에게 그대로 노출되는 안정적인 분류이며,
//! 내부 해시나 비밀 키 정보는 절대 메시지에 포함하지 않습니다.

use thiserror::Error;

/// 핵심 인증 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 중복된 계정 식별자 또는 전화번호
    #[error("이미 사용 중인 계정입니다")]
    Duplicate,

    /// 계정을 찾을 수 없음
    #[error("계정을 찾을 수 없습니다")]
    NotFound,

    /// 비밀번호 강도 미달
    #[error("비밀번호는 최소 {min}자 이상이어야 합니다")]
    WeakPassword {
        /// 최소 길이
        min: usize,
    },

    /// 전화번호 형식 오류
    #[error("전화번호 형식이 올바르지 않습니다 (예: 010-1234-5678)")]
    InvalidPhoneFormat,

    /// 잘못된 자격증명 (존재하지 않는 계정과 구분되지 않음)
    #[error("아이디 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    /// 로그인 실패 횟수 초과
    #[error("로그인 시도 횟수를 초과했습니다. {retry_after}초 후 다시 시도하세요")]
    Throttled {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },

    /// 구조적으로 잘못된 토큰
    #[error("잘못된 토큰 형식")]
    Malformed,

    /// 서명 불일치 (변조 의심)
    #[error("토큰 서명이 유효하지 않습니다")]
    BadSignature,

    /// 토큰 만료
    #[error("토큰이 만료되었습니다")]
    Expired,

    /// 조기 무효화된 토큰
    #[error("무효화된 토큰입니다")]
    Revoked,

    /// 권한 부족
    #[error("권한이 부족합니다")]
    Forbidden,

    /// 저장소 타임아웃 등 일시적 장애
    #[error("저장소에 접근할 수 없습니다: {0}")]
    Unavailable(String),

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// `Unavailable`만 자동 재시도 대상입니다. 검증/권한 실패는
    /// 호출자가 수정해야 하는 조건이므로 재시도하지 않습니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Unavailable(_))
    }

    /// 호출자 측 원인(4xx 계열)인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Unavailable(_) | AuthError::Internal(_))
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(AuthError::Unavailable("timeout".into()).is_retryable());
        assert!(!AuthError::InvalidCredentials.is_retryable());
        assert!(!AuthError::Expired.is_retryable());
        assert!(!AuthError::Throttled { retry_after: 30 }.is_retryable());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AuthError::WeakPassword { min: 6 }.is_client_error());
        assert!(AuthError::Forbidden.is_client_error());
        assert!(!AuthError::Unavailable("down".into()).is_client_error());
        assert!(!AuthError::Internal("bug".into()).is_client_error());
    }

    #[test]
    fn test_error_messages_do_not_leak_internals() {
        // 자격증명 에러는 계정 존재 여부를 드러내지 않아야 함
        let not_found = AuthError::InvalidCredentials.to_string();
        let wrong_password = AuthError::InvalidCredentials.to_string();
        assert_eq!(not_found, wrong_password);
    }
}
