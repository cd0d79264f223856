#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("{0}")]
    Generic(String),
    #[error("Config error: {0}")]
    ConfigError(#[from] evmstate_config::error::Error),
    #[error("State error: {0}")]
    StateError(#[from] evmstate_vm::Error),
}
