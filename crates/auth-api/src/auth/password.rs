//! 비밀번호 해싱 유틸리티.
//!
//! Argon2 기반 비밀번호 해싱 및 검증.
//! 검증은 언어 기본 동등 비교가 아니라 argon2의 constant-time 비교를
//! 사용하므로 타이밍 부채널이 없습니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use auth_core::{AuthError, AuthResult};

/// 비밀번호 해싱.
///
/// Argon2id 알고리즘을 사용하며 솔트는 자동으로 생성됩니다.
///
/// # Returns
///
/// PHC 형식의 해시 문자열 (솔트 포함, 예: `$argon2id$v=19$...`)
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::Internal("비밀번호 해싱 실패".to_string()))?;

    Ok(hash.to_string())
}

/// 비밀번호 검증.
///
/// 저장된 PHC 해시와 입력 비밀번호를 비교합니다.
/// 불일치는 `InvalidCredentials`로만 표면화되어 계정 존재 여부를
/// 드러내지 않습니다.
pub fn verify_password(password: &str, hash: &str) -> AuthResult<()> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AuthError::Internal("잘못된 해시 형식".to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
