//! Authentication module for Petsit

pub mod jwt;
pub mod middleware;

pub use jwt::{JwtError, JwtManager, SupabaseClaims};
pub use middleware::{require_admin, require_auth, AuthState, AuthUser};
