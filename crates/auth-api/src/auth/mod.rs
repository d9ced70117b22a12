//! 인증/인가 모듈.
//!
//! 토큰 코덱, 비밀번호 해싱, 가입 검증, 무효화 레지스트리, 스로틀링,
//! 인증 게이트와 extractor 미들웨어를 제공합니다.

pub mod gate;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod signup;
pub mod throttle;
pub mod token;

pub use gate::AuthenticationGate;
pub use middleware::{AdminAuth, AuthContext, AuthRejection, JwtAuth, UserAuth};
pub use revocation::{start_revocation_sweeper, RevocationRegistry};
pub use throttle::{LoginThrottle, ThrottleConfig, ThrottleResult};
pub use token::{Claims, IssuedToken, TokenCodec};
