//! PayRoute settlement engine.
//!
//! Resolves a payer's funds through one of several authorization paths,
//! optionally swaps them through a pluggable exchange adapter under
//! balance-delta accounting, and settles through an append-only ledger.
//! Everything runs against the deterministic host in [`host`].

pub mod adapters;
pub mod allowance_hub;
pub mod authorization;
pub mod deployment;
pub mod error;
pub mod host;
pub mod ledger;
pub mod ownable;
pub mod payload;
pub mod permit;
pub mod registry;
pub mod router;
pub mod token;
pub mod traits;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use adapters::{AggregatorAdapter, ExchangeDirectory, SettlerAdapter, SwapEngine};
pub use allowance_hub::SharedAllowance;
pub use authorization::{Authorization, AuthorizationResolver};
pub use deployment::Deployment;
pub use error::SettlementError;
pub use host::{BlockEnv, CallContext, Chain, WorldState};
pub use ledger::SettlementLedger;
pub use ownable::Ownable;
pub use permit::{PermitTerms, SignedPermit};
pub use registry::TokenRegistry;
pub use router::PaymentRouter;
pub use token::{TokenKind, UNLIMITED_ALLOWANCE};
pub use traits::{Exchange, SwapExecutor};
pub use types::{Event, Log, SettlementRecord};
