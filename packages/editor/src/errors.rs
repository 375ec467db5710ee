//! Error types for the editor

use stagecraft_metadata::CoercionError;
use stagecraft_model::MutationError;
use thiserror::Error;

/// Recoverable failure of a job or of the job manager
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("Job is not executable: {0}")]
    NotExecutable(String),

    #[error("Sub-job '{job}' of '{batch}' is not executable")]
    SubJobNotExecutable { batch: String, job: String },

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
