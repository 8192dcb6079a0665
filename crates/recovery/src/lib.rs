pub mod classify;
pub mod creation;
pub mod engine;
pub mod execute;
pub mod module;
pub mod state;

pub use classify::*;
pub use creation::*;
pub use engine::*;
pub use execute::*;
pub use module::*;
pub use state::*;

use thiserror::Error;

use safekit_gateway::{ChainError, GatewayError};

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("delay module read failed: {0}")]
    Module(String),

    #[error("creation transaction for the account was never mined")]
    CreationNotMined,
}
