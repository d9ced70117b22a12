//! 계정 저장소.
//!
//! 계정 영속화를 위한 `AccountStore` trait과 두 구현을 제공합니다:
//! - [`PgAccountStore`]: PostgreSQL 기반, 프로세스 재시작에도 유지
//! - [`MemoryAccountStore`]: `DATABASE_URL` 미설정 시 및 테스트용
//!
//! 식별자/전화번호 유일성의 최종 관문은 저장소입니다. 검증기가 먼저
//! 걸러내더라도 동시 가입 레이스는 unique 제약으로만 해소됩니다.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::warn;

use auth_core::{Account, AccountStatus, AuthError, AuthResult, Role};

/// 계정 영속화 계약.
///
/// 모든 쓰기는 계정 단위로 원자적입니다 - 반쯤 쓰인 계정이 관측되는
/// 일은 없습니다. 계정은 물리 삭제되지 않고 `disable`로만 내려갑니다.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// 계정 생성. 식별자 또는 전화번호 중복이면 `Duplicate`.
    async fn create(&self, account: Account) -> AuthResult<Account>;

    /// 식별자로 계정 조회. 없으면 `NotFound`.
    async fn find(&self, identifier: &str) -> AuthResult<Account>;

    /// 비밀번호 해시 교체. 계정이 없으면 `NotFound`.
    async fn update_password(&self, identifier: &str, new_hash: &str) -> AuthResult<()>;

    /// 계정 비활성화 (soft-disable).
    async fn disable(&self, identifier: &str) -> AuthResult<()>;

    /// 전체 계정 수.
    async fn count(&self) -> AuthResult<i64>;
}

// ============================================================================
// PostgreSQL 구현
// ============================================================================

/// DB에서 조회한 계정 row.
#[derive(sqlx::FromRow)]
struct AccountRow {
    identifier: String,
    password_hash: String,
    phone: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AuthError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| AuthError::Internal(format!("알 수 없는 역할: {}", row.role)))?;
        let status = AccountStatus::parse(&row.status)
            .ok_or_else(|| AuthError::Internal(format!("알 수 없는 상태: {}", row.status)))?;

        Ok(Account {
            identifier: row.identifier,
            password_hash: row.password_hash,
            phone: row.phone,
            role,
            status,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL 계정 저장소.
///
/// 모든 쿼리는 타임아웃으로 제한됩니다. 저장소가 느려도 인가 핫패스가
/// 무한 대기하는 일은 없고, 타임아웃은 재시도 가능한 `Unavailable`로
/// 표면화됩니다 (1회 자동 재시도 후 503 상당).
pub struct PgAccountStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgAccountStore {
    /// 새 저장소 생성.
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    /// 쿼리 실행 (타임아웃 + 1회 재시도).
    ///
    /// `Unavailable`로 분류되는 실패만 재시도합니다. 검증/중복 등
    /// 호출자 원인 에러는 그대로 반환합니다.
    async fn exec<T, F>(&self, mut query: F) -> AuthResult<T>
    where
        F: FnMut(PgPool) -> BoxFuture<'static, Result<T, sqlx::Error>>,
        T: Send,
    {
        let mut last_err = None;

        for attempt in 0..2 {
            let result = tokio::time::timeout(self.query_timeout, query(self.pool.clone())).await;

            let err = match result {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => map_sqlx_error(e),
                Err(_) => AuthError::Unavailable("쿼리 타임아웃".to_string()),
            };

            if !err.is_retryable() {
                return Err(err);
            }

            if attempt == 0 {
                warn!("Account store query failed, retrying once");
            }
            last_err = Some(err);
        }

        Err(last_err.unwrap_or_else(|| AuthError::Unavailable("저장소 접근 실패".to_string())))
    }
}

/// sqlx 에러를 도메인 에러로 변환.
fn map_sqlx_error(e: sqlx::Error) -> AuthError {
    match &e {
        sqlx::Error::RowNotFound => AuthError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => AuthError::Duplicate,
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            AuthError::Unavailable("데이터베이스 연결 실패".to_string())
        }
        _ => AuthError::Internal("데이터베이스 에러".to_string()),
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: Account) -> AuthResult<Account> {
        let stored = account.clone();
        self.exec(move |pool| {
            let account = account.clone();
            Box::pin(async move {
                sqlx::query(
                    r#"
                    INSERT INTO accounts (identifier, password_hash, phone, role, status, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(&account.identifier)
                .bind(&account.password_hash)
                .bind(&account.phone)
                .bind(account.role.as_str())
                .bind(account.status.as_str())
                .bind(account.created_at)
                .execute(&pool)
                .await
                .map(|_| ())
            })
        })
        .await?;

        Ok(stored)
    }

    async fn find(&self, identifier: &str) -> AuthResult<Account> {
        let identifier = identifier.to_string();
        let row = self
            .exec(move |pool| {
                let identifier = identifier.clone();
                Box::pin(async move {
                    sqlx::query_as::<_, AccountRow>(
                        r#"
                        SELECT identifier, password_hash, phone, role, status, created_at
                        FROM accounts
                        WHERE identifier = $1
                        "#,
                    )
                    .bind(&identifier)
                    .fetch_optional(&pool)
                    .await
                })
            })
            .await?;

        row.ok_or(AuthError::NotFound)?.try_into()
    }

    async fn update_password(&self, identifier: &str, new_hash: &str) -> AuthResult<()> {
        let identifier = identifier.to_string();
        let new_hash = new_hash.to_string();
        let affected = self
            .exec(move |pool| {
                let identifier = identifier.clone();
                let new_hash = new_hash.clone();
                Box::pin(async move {
                    sqlx::query("UPDATE accounts SET password_hash = $2 WHERE identifier = $1")
                        .bind(&identifier)
                        .bind(&new_hash)
                        .execute(&pool)
                        .await
                        .map(|r| r.rows_affected())
                })
            })
            .await?;

        if affected == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn disable(&self, identifier: &str) -> AuthResult<()> {
        let identifier = identifier.to_string();
        let affected = self
            .exec(move |pool| {
                let identifier = identifier.clone();
                Box::pin(async move {
                    sqlx::query("UPDATE accounts SET status = 'disabled' WHERE identifier = $1")
                        .bind(&identifier)
                        .execute(&pool)
                        .await
                        .map(|r| r.rows_affected())
                })
            })
            .await?;

        if affected == 0 {
            return Err(AuthError::NotFound);
        }
        Ok(())
    }

    async fn count(&self) -> AuthResult<i64> {
        self.exec(move |pool| {
            Box::pin(async move {
                let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
                    .fetch_one(&pool)
                    .await?;
                Ok(row.0)
            })
        })
        .await
    }
}

// ============================================================================
// 인메모리 구현
// ============================================================================

/// 인메모리 계정 저장소.
///
/// `DATABASE_URL`이 없는 개발 환경과 테스트에서 사용합니다.
/// 쓰기는 맵 단위 write 락으로 원자성을 보장하며, 락 유지 구간은
/// 해당 변이에만 한정됩니다.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    /// 새 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: Account) -> AuthResult<Account> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.identifier) {
            return Err(AuthError::Duplicate);
        }
        if accounts.values().any(|a| a.phone == account.phone) {
            return Err(AuthError::Duplicate);
        }

        accounts.insert(account.identifier.clone(), account.clone());
        Ok(account)
    }

    async fn find(&self, identifier: &str) -> AuthResult<Account> {
        self.accounts
            .read()
            .await
            .get(identifier)
            .cloned()
            .ok_or(AuthError::NotFound)
    }

    async fn update_password(&self, identifier: &str, new_hash: &str) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(identifier).ok_or(AuthError::NotFound)?;
        account.password_hash = new_hash.to_string();
        Ok(())
    }

    async fn disable(&self, identifier: &str) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(identifier).ok_or(AuthError::NotFound)?;
        account.status = AccountStatus::Disabled;
        Ok(())
    }

    async fn count(&self) -> AuthResult<i64> {
        Ok(self.accounts.read().await.len() as i64)
    }
}
