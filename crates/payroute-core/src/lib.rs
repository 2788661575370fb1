//! PayRoute core: order/result types shared across the engine, deployment
//! configuration and logging setup.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use alloy_primitives::{Address, Bytes, B256, U256};

pub use config::{AcceptedTokenConfig, AdapterConfig, DeploymentConfig, LoggingConfig};
pub use error::CoreError;
pub use types::{SwapOrder, SwapResult, SwapType, NATIVE_TOKEN};
