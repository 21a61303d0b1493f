pub mod audit;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod error_translation;
pub mod gateway;
pub mod git;
pub mod security;

// Re-export commonly used types for convenience
pub use checkpoint::{Checkpoint, CheckpointOutcome, CheckpointRequest};
pub use error::{AppError, ErrorCategory, GatewayError, GatewayResult};
pub use gateway::{Gateway, GatewayRequest, RepositoryListing};
pub use git::{RepositoryResolver, RepositorySnapshot, ResolvedRepository};
