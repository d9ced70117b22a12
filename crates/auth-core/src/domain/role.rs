//! 역할 기반 접근 제어 (RBAC).
//!
//! 사용자 역할 및 역할 간 순서 관계 정의.

use serde::{Deserialize, Serialize};

/// 사용자 역할.
///
/// 시스템에서 사용자의 권한 수준을 정의합니다.
/// 라우트별 문자열 비교 대신 [`Role::satisfies`] 하나로 순서를 판정하므로,
/// 역할이 추가되어도 이 타입만 수정하면 됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자 - 모든 라우트 접근 가능
    Admin,
    /// 일반 사용자 - user 레벨 라우트만 접근 가능
    User,
}

impl Role {
    /// 역할의 우선순위 레벨 반환 (높을수록 더 많은 권한).
    pub fn level(&self) -> u8 {
        match self {
            Role::Admin => 100,
            Role::User => 10,
        }
    }

    /// 이 역할이 요구 역할을 충족하는지 확인.
    ///
    /// `admin`은 `user` 레벨 라우트도 통과하지만 역은 성립하지 않습니다.
    pub fn satisfies(&self, required: Role) -> bool {
        self.level() >= required.level()
    }

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// DB 저장용 문자열 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
