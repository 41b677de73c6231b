pub mod config;
pub mod handle;
pub mod lifecycle;

pub use config::ConfigError;
pub use handle::HandleError;
pub use lifecycle::LifecycleError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Handle(#[from] handle::HandleError),

    #[error(transparent)]
    Lifecycle(#[from] lifecycle::LifecycleError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
