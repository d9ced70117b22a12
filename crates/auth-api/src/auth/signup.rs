//! 회원가입 입력 검증.
//!
//! 클라이언트 측 검사와 무관하게 서버에서 항상 다시 검증합니다.
//! 순수 함수이므로 같은 입력은 항상 같은 판정을 냅니다.
//! 식별자/전화번호 유일성은 여기가 아니라 저장소의 unique 제약이
//! 최종 관문입니다 (동시 가입 레이스는 저장소 수준에서 해소).

use auth_core::{AuthError, AuthResult};

/// 비밀번호 최소 길이 기본값.
pub const DEFAULT_PASSWORD_MIN_LENGTH: usize = 6;

/// 비밀번호 강도 검증.
///
/// 최소 길이(문자 수 기준)를 충족하는지 확인합니다.
pub fn validate_password(password: &str, min_length: usize) -> AuthResult<()> {
    if password.chars().count() < min_length {
        return Err(AuthError::WeakPassword { min: min_length });
    }
    Ok(())
}

/// 전화번호 형식 검증.
///
/// 정규화된 `NNN-NNNN-NNNN` 형식(3자리-4자리-4자리, `-` 구분)만 허용합니다.
/// 예: `010-1234-5678`
pub fn validate_phone(phone: &str) -> AuthResult<()> {
    let parts: Vec<&str> = phone.split('-').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidPhoneFormat);
    }

    let lengths = [3usize, 4, 4];
    for (part, expected_len) in parts.iter().zip(lengths) {
        if part.len() != expected_len || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AuthError::InvalidPhoneFormat);
        }
    }

    Ok(())
}

/// 회원가입 입력 전체 검증.
///
/// 비밀번호 → 전화번호 순으로 검사하고 첫 번째 위반을 반환합니다.
pub fn validate_signup(password: &str, phone: &str, password_min_length: usize) -> AuthResult<()> {
    validate_password(password, password_min_length)?;
    validate_phone(phone)?;
    Ok(())
}
