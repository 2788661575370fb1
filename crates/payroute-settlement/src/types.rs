use alloy_primitives::{Address, B256};
use payroute_core::SwapType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Append-only reconciliation record emitted by the settlement ledger.
///
/// `payer`, `source_token` and `reference` are the fields off-chain indexers
/// key on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub recipient: Address,
    pub payer: Address,
    pub source_token: Address,
    pub source_amount: u128,
    pub payment_token: Address,
    pub payment_amount: u128,
    /// Caller-supplied reference (invoice or order id).
    pub reference: B256,
}

/// Events logged by the engine's contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Settled(SettlementRecord),
    TokenAccepted {
        token: Address,
        recipient: Address,
    },
    RecipientUpdated {
        token: Address,
        previous: Address,
        recipient: Address,
    },
    TokenRemoved {
        token: Address,
    },
    AdapterUpdated {
        previous: Option<Address>,
        adapter: Option<Address>,
    },
    OwnershipTransferred {
        previous: Address,
        new_owner: Address,
    },
    Swept {
        token: Address,
        to: Address,
        amount: u128,
    },
    Swapped {
        swap_type: SwapType,
        input_token: Address,
        output_token: Address,
        input_amount_spent: u128,
        output_amount_received: u128,
        to: Address,
        refund_to: Address,
    },
    DirectoryUpgraded {
        previous: Address,
        target: Address,
    },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settled(_) => write!(f, "Settled"),
            Self::TokenAccepted { .. } => write!(f, "TokenAccepted"),
            Self::RecipientUpdated { .. } => write!(f, "RecipientUpdated"),
            Self::TokenRemoved { .. } => write!(f, "TokenRemoved"),
            Self::AdapterUpdated { .. } => write!(f, "AdapterUpdated"),
            Self::OwnershipTransferred { .. } => write!(f, "OwnershipTransferred"),
            Self::Swept { .. } => write!(f, "Swept"),
            Self::Swapped { .. } => write!(f, "Swapped"),
            Self::DirectoryUpgraded { .. } => write!(f, "DirectoryUpgraded"),
        }
    }
}

/// An event together with the contract that emitted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub event: Event,
}
