//! 인증 게이트.
//!
//! 회원가입, 로그인, 로그아웃, 비밀번호 변경의 단일 진입점.
//! 자격증명 검증 후 토큰 발급을 코덱에 위임하고, 실패 시도 스로틀링과
//! 조기 무효화 등록을 담당합니다.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use auth_core::{Account, AuthConfig, AuthError, AuthResult, Role};

use super::password::{hash_password, verify_password};
use super::revocation::RevocationRegistry;
use super::signup::{validate_password, validate_signup};
use super::throttle::{LoginThrottle, ThrottleConfig, ThrottleResult};
use super::token::{IssuedToken, TokenCodec};
use crate::repository::AccountStore;

/// 인증 게이트.
///
/// 저장소 조회 실패("없는 계정")와 비밀번호 불일치는 호출자에게
/// 동일한 `InvalidCredentials`로 보이며, 없는 계정에 대해서도 더미
/// 해시 검증을 수행해 타이밍으로 계정 존재가 새지 않게 합니다.
pub struct AuthenticationGate {
    store: Arc<dyn AccountStore>,
    codec: Arc<TokenCodec>,
    revocations: Arc<RevocationRegistry>,
    throttle: Arc<LoginThrottle>,
    password_min_length: usize,
    /// 없는 계정 로그인 시 비교할 더미 해시 (타이밍 균일화)
    dummy_hash: String,
}

impl AuthenticationGate {
    /// 새 게이트 생성.
    pub fn new(
        store: Arc<dyn AccountStore>,
        codec: Arc<TokenCodec>,
        revocations: Arc<RevocationRegistry>,
        config: &AuthConfig,
    ) -> AuthResult<Self> {
        let throttle = Arc::new(LoginThrottle::new(ThrottleConfig::new(
            config.throttle_max_failures,
            config.throttle_window_secs,
        )));
        let dummy_hash = hash_password("dummy-password-for-timing")?;

        Ok(Self {
            store,
            codec,
            revocations,
            throttle,
            password_min_length: config.password_min_length,
            dummy_hash,
        })
    }

    /// 스로틀러 공유 핸들 (백그라운드 정리 태스크용).
    pub fn throttle(&self) -> Arc<LoginThrottle> {
        Arc::clone(&self.throttle)
    }

    /// 회원가입.
    ///
    /// 서버 측 검증 → 해싱 → 저장 순서로 진행합니다.
    /// 저장소의 unique 제약이 중복의 최종 판정자이므로, 동시 가입
    /// 레이스는 여기서가 아니라 `create`에서 `Duplicate`로 끝납니다.
    #[instrument(skip(self, password), fields(identifier = %identifier))]
    pub async fn signup(
        &self,
        identifier: &str,
        password: &str,
        phone: &str,
    ) -> AuthResult<Account> {
        validate_signup(password, phone, self.password_min_length)?;

        let hash = hash_password(password)?;
        let account = self
            .store
            .create(Account::new(identifier, hash, phone, Role::User))
            .await?;

        metrics::counter!("auth_signups_total").increment(1);
        info!("Account created");
        Ok(account)
    }

    /// 로그인.
    ///
    /// 스로틀 검사가 가장 먼저입니다 - 한도를 초과한 식별자는 저장소를
    /// 건드리지 않고 즉시 `Throttled`로 거부됩니다.
    #[instrument(skip(self, password), fields(identifier = %identifier))]
    pub async fn login(&self, identifier: &str, password: &str) -> AuthResult<IssuedToken> {
        if let ThrottleResult::Throttled { retry_after } = self.throttle.check(identifier).await {
            metrics::counter!("auth_logins_total", "outcome" => "throttled").increment(1);
            return Err(AuthError::Throttled { retry_after });
        }

        let account = match self.store.find(identifier).await {
            Ok(account) => account,
            Err(AuthError::NotFound) => {
                // 없는 계정도 해시 비교 비용을 지불해 타이밍 균일화
                let _ = verify_password(password, &self.dummy_hash);
                return self.fail_login(identifier).await;
            }
            Err(e) => return Err(e),
        };

        if verify_password(password, &account.password_hash).is_err() {
            return self.fail_login(identifier).await;
        }

        if !account.is_active() {
            return self.fail_login(identifier).await;
        }

        self.throttle.reset(identifier).await;
        let issued = self.codec.issue(&account.identifier, account.role)?;

        metrics::counter!("auth_logins_total", "outcome" => "success").increment(1);
        info!(role = %account.role, "Login succeeded");
        Ok(issued)
    }

    /// 로그아웃.
    ///
    /// 토큰을 검증한 뒤 `jti`를 레지스트리에 등록합니다. 멱등적이며,
    /// 이미 만료된 토큰은 성공으로 처리합니다 (만료 검사만으로도 이미
    /// 거부되는 토큰이므로 등록할 것이 없음).
    pub async fn logout(&self, token: &str) -> AuthResult<()> {
        let claims = match self.codec.verify(token) {
            Ok(claims) => claims,
            Err(AuthError::Expired) => return Ok(()),
            Err(e) => return Err(e),
        };

        self.revocations.revoke(&claims.jti, claims.exp).await;
        info!(subject = %claims.sub, "Token revoked on logout");
        Ok(())
    }

    /// 비밀번호 변경.
    ///
    /// 기존 비밀번호로 재인증(로그인과 동일한 스로틀 적용) 후 새
    /// 비밀번호를 검증/저장하고, 계정 워터마크를 올려 기존에 발급된
    /// 토큰을 전부 무효화합니다.
    #[instrument(skip(self, old_password, new_password), fields(identifier = %identifier))]
    pub async fn change_password(
        &self,
        identifier: &str,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        if let ThrottleResult::Throttled { retry_after } = self.throttle.check(identifier).await {
            return Err(AuthError::Throttled { retry_after });
        }

        let account = match self.store.find(identifier).await {
            Ok(account) => account,
            Err(AuthError::NotFound) => {
                let _ = verify_password(old_password, &self.dummy_hash);
                return self.fail_login(identifier).await.map(|_| ());
            }
            Err(e) => return Err(e),
        };

        if verify_password(old_password, &account.password_hash).is_err() || !account.is_active() {
            return self.fail_login(identifier).await.map(|_| ());
        }

        validate_password(new_password, self.password_min_length)?;

        let new_hash = hash_password(new_password)?;
        self.store.update_password(identifier, &new_hash).await?;
        self.throttle.reset(identifier).await;

        // 기존 토큰은 이전 신뢰 결정을 담고 있으므로 전부 무효화
        self.revocations
            .void_issued_before(identifier, Utc::now().timestamp())
            .await;

        info!("Password changed, outstanding tokens voided");
        Ok(())
    }

    /// 실패 기록 후 `InvalidCredentials` 반환.
    async fn fail_login(&self, identifier: &str) -> AuthResult<IssuedToken> {
        self.throttle.record_failure(identifier).await;
        metrics::counter!("auth_logins_total", "outcome" => "failure").increment(1);
        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryAccountStore;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn gate() -> AuthenticationGate {
        gate_with_config(&AuthConfig::default())
    }

    fn gate_with_config(config: &AuthConfig) -> AuthenticationGate {
        AuthenticationGate::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(TokenCodec::new(TEST_SECRET, config.token_ttl_minutes)),
            Arc::new(RevocationRegistry::new()),
            config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_signup_then_login_roundtrip() {
        let gate = gate();
        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();

        let issued = gate.login("alice", "abcdef").await.unwrap();
        assert_eq!(issued.claims.sub, "alice");
        assert_eq!(issued.claims.role, Role::User);
    }

    #[tokio::test]
    async fn test_wrong_password_indistinguishable_from_missing_account() {
        let gate = gate();
        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();

        let wrong = gate.login("alice", "wrong-password").await;
        let missing = gate.login("nobody", "abcdef").await;

        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
        assert!(matches!(missing, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_signup_validation_boundaries() {
        let gate = gate();

        // 5자 비밀번호 거부
        assert!(matches!(
            gate.signup("alice", "abcde", "010-1234-5678").await,
            Err(AuthError::WeakPassword { .. })
        ));

        // 구분자 없는 전화번호 거부
        assert!(matches!(
            gate.signup("alice", "abcdef", "01012345678").await,
            Err(AuthError::InvalidPhoneFormat)
        ));

        // 6자 + 정규화된 전화번호 허용
        assert!(gate.signup("alice", "abcdef", "010-1234-5678").await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_signup_rejected() {
        let gate = gate();
        gate.signup("alice", "abcdef", "010-1111-1111").await.unwrap();

        assert!(matches!(
            gate.signup("alice", "abcdef", "010-2222-2222").await,
            Err(AuthError::Duplicate)
        ));
    }

    #[tokio::test]
    async fn test_disabled_account_cannot_login() {
        let store = Arc::new(MemoryAccountStore::new());
        let config = AuthConfig::default();
        let gate = AuthenticationGate::new(
            Arc::clone(&store) as Arc<dyn AccountStore>,
            Arc::new(TokenCodec::new(TEST_SECRET, 60)),
            Arc::new(RevocationRegistry::new()),
            &config,
        )
        .unwrap();

        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();
        store.disable("alice").await.unwrap();

        assert!(matches!(
            gate.login("alice", "abcdef").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_throttle_blocks_even_correct_password() {
        let config = AuthConfig {
            throttle_max_failures: 2,
            ..Default::default()
        };
        let gate = gate_with_config(&config);
        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();

        for _ in 0..2 {
            let _ = gate.login("alice", "wrong").await;
        }

        // 한도 초과 후에는 올바른 비밀번호도 Throttled
        assert!(matches!(
            gate.login("alice", "abcdef").await,
            Err(AuthError::Throttled { .. })
        ));
    }

    #[tokio::test]
    async fn test_successful_login_resets_throttle() {
        let config = AuthConfig {
            throttle_max_failures: 2,
            ..Default::default()
        };
        let gate = gate_with_config(&config);
        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();

        let _ = gate.login("alice", "wrong").await;
        gate.login("alice", "abcdef").await.unwrap();

        // 성공으로 카운터가 리셋되어 다시 실패 여유가 생김
        let _ = gate.login("alice", "wrong").await;
        assert!(matches!(
            gate.login("alice", "abcdef").await,
            Ok(_)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_and_is_idempotent() {
        let config = AuthConfig::default();
        let revocations = Arc::new(RevocationRegistry::new());
        let gate = AuthenticationGate::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(TokenCodec::new(TEST_SECRET, 60)),
            Arc::clone(&revocations),
            &config,
        )
        .unwrap();

        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();
        let issued = gate.login("alice", "abcdef").await.unwrap();

        gate.logout(&issued.token).await.unwrap();
        gate.logout(&issued.token).await.unwrap();

        assert!(revocations.is_invalidated(&issued.claims).await);

        // 로그아웃 이후 새로 발급된 토큰은 여전히 유효
        let fresh = gate.login("alice", "abcdef").await.unwrap();
        assert!(!revocations.is_invalidated(&fresh.claims).await);
    }

    #[tokio::test]
    async fn test_logout_rejects_malformed_token() {
        let gate = gate();
        assert!(matches!(
            gate.logout("garbage").await,
            Err(AuthError::Malformed)
        ));
    }

    #[tokio::test]
    async fn test_change_password_flow() {
        let config = AuthConfig::default();
        let revocations = Arc::new(RevocationRegistry::new());
        let codec = Arc::new(TokenCodec::new(TEST_SECRET, 60));
        let gate = AuthenticationGate::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::clone(&codec),
            Arc::clone(&revocations),
            &config,
        )
        .unwrap();

        gate.signup("alice", "abcdef", "010-1234-5678").await.unwrap();

        // 변경 전에 발급된 (과거 iat) 토큰
        let old_claims = super::super::token::Claims {
            sub: "alice".to_string(),
            role: Role::User,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp() - 60,
            exp: Utc::now().timestamp() + 3540,
        };

        // 잘못된 기존 비밀번호 거부
        assert!(matches!(
            gate.change_password("alice", "wrong", "newpass").await,
            Err(AuthError::InvalidCredentials)
        ));

        // 약한 새 비밀번호 거부
        assert!(matches!(
            gate.change_password("alice", "abcdef", "short").await,
            Err(AuthError::WeakPassword { .. })
        ));

        gate.change_password("alice", "abcdef", "newpass").await.unwrap();

        // 이전 비밀번호는 더 이상 통하지 않음
        assert!(matches!(
            gate.login("alice", "abcdef").await,
            Err(AuthError::InvalidCredentials)
        ));
        gate.login("alice", "newpass").await.unwrap();

        // 변경 전 발급분은 워터마크에 걸려 무효
        assert!(revocations.is_invalidated(&old_claims).await);
    }
}
