pub mod jwt;

pub use jwt::{JwtClaims, JwtError, JwtService};
