//! Database repository modules

pub mod refresh_token_repository;

pub use refresh_token_repository::RefreshTokenRepository;
