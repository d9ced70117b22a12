//! 계정 도메인 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// 계정 상태.
///
/// 계정은 물리적으로 삭제되지 않고 비활성화만 됩니다 (감사 이력 보존).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// 정상 계정
    Active,
    /// 비활성화된 계정 - 로그인 불가
    Disabled,
}

impl AccountStatus {
    /// 문자열에서 상태 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "disabled" => Some(AccountStatus::Disabled),
            _ => None,
        }
    }

    /// DB 저장용 문자열 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Disabled => "disabled",
        }
    }
}

/// 계정.
///
/// 불변 조건:
/// - `identifier`와 `phone`은 전체 계정에서 유일
/// - `password_hash`는 솔트가 포함된 단방향 해시 (평문 저장/로깅 금지)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// 계정 식별자 (로그인 ID)
    pub identifier: String,
    /// 솔트 포함 단방향 비밀번호 해시 (PHC 형식)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// 전화번호 (정규화된 `NNN-NNNN-NNNN` 형식)
    pub phone: String,
    /// 역할
    pub role: Role,
    /// 계정 상태
    pub status: AccountStatus,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// 새 활성 계정 생성.
    pub fn new(
        identifier: impl Into<String>,
        password_hash: impl Into<String>,
        phone: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            password_hash: password_hash.into(),
            phone: phone.into(),
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// 로그인 가능한 계정인지 확인.
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
