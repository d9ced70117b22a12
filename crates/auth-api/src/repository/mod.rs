//! 영속화 계층.
//!
//! 계정 저장소 trait과 구현(PostgreSQL / 인메모리)을 제공합니다.

mod accounts;

pub use accounts::{AccountStore, MemoryAccountStore, PgAccountStore};
