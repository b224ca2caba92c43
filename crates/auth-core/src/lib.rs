//! Token lifecycle engine: the write-coalescing pipeline that sits between
//! the HTTP request path and the relational store.

pub mod error;
pub mod models;
pub mod services;

pub use error::AuthError;
pub use models::RefreshToken;
pub use services::{
    InsertBuffer, RevokeBuffer, Scheduler, SchedulerConfig, Store, Sweeper, TokenService,
    TokenServiceConfig,
};
