//! 로그인 서비스의 핵심 도메인 모델과 타입.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 계정/역할 도메인 모델
//! - 에러 타입 분류 체계
//! - 설정 로딩
//! - 로깅 인프라
//!
//! I/O나 웹 프레임워크에는 의존하지 않습니다.

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig};
pub use domain::{Account, AccountStatus, Role};
pub use error::{AuthError, AuthResult};
pub use logging::{init_logging, init_logging_from_env, LogConfig, LogFormat};
