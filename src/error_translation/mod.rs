pub mod classifier;
pub mod translator;

pub use classifier::FailureClassifier;
pub use translator::{OutcomeRenderer, EMPTY_OUTPUT_PLACEHOLDER};
