//! Authentication Module
//!
//! JWT issuing and validation plus the request extractor that guards
//! protected routes.

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
