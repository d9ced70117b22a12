//! 도메인 모델.
//!
//! 계정과 역할 등 인증 시스템의 핵심 도메인 타입을 정의합니다.

mod account;
mod role;

pub use account::{Account, AccountStatus};
pub use role::Role;
