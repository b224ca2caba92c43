//! Durable storage for refresh tokens.

pub mod connection;
pub mod repositories;

pub use connection::create_mysql_pool;
pub use repositories::RefreshTokenRepository;
