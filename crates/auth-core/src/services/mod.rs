pub mod insert_buffer;
pub mod revoke_buffer;
pub mod scheduler;
pub mod store;
pub mod sweeper;
pub mod token_service;

pub use insert_buffer::InsertBuffer;
pub use revoke_buffer::RevokeBuffer;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use store::Store;
pub use sweeper::Sweeper;
pub use token_service::{TokenService, TokenServiceConfig};

use crate::error::AuthError;
use async_trait::async_trait;

/// A periodic background worker that can be asked to flush its buffered
/// state into durable storage. Implemented by [`InsertBuffer`],
/// [`RevokeBuffer`], and [`Sweeper`] so the [`Scheduler`] can drive all
/// three uniformly.
#[async_trait]
pub trait Drain: Send + Sync {
    async fn drain(&self) -> Result<(), AuthError>;
}
