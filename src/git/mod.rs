pub mod executor;
pub mod repository;

// Re-export commonly used types
pub use executor::{FailedRun, GitExecutor, GitRunner, Invocation, InvocationFailure};
pub use repository::{
    RepositoryEntry, RepositoryResolver, RepositorySnapshot, ResolvedRepository,
    SHADOW_STORE_MARKER,
};
