//! # QRest Security
//!
//! Security utilities: JWT, password hashing, opaque tokens.

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{Claims, JwtError, JwtService, PreviewClaims, TokenSubject};
pub use password::{PasswordError, PasswordService};
