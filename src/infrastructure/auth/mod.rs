//! Authentication: JWTs, refresh sessions and account entry points

mod jwt;
mod service;

pub use jwt::{IssuedRefresh, JwtClaims, JwtConfig, JwtService, TokenType};
pub use service::{AuthService, LoginRequest, LoginResult, SignupRequest, TokenPair};
