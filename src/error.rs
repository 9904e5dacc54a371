use thiserror::Error;

/// Errors reported by the prepack and cast kernels.
///
/// Every variant is a configuration or contract problem on the caller's side;
/// there are no transient failures and no partial output. A kernel either
/// transforms the full buffer or returns an error before mutating anything.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported kernel feature: {0}")]
    Unsupported(&'static str),
}

pub type KernelResult<T> = Result<T, KernelError>;
