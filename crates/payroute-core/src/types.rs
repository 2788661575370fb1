use alloy_primitives::{address, Address, Bytes};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel used in a [`SwapOrder`] to denote the chain's native currency.
pub const NATIVE_TOKEN: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Accounting mode of a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapType {
    /// Spend exactly `input_amount`, receive at least `output_amount`.
    ExactInput,
    /// Receive exactly `output_amount`, spend at most `input_amount`.
    ExactOutput,
}

impl fmt::Display for SwapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactInput => write!(f, "ExactInput"),
            Self::ExactOutput => write!(f, "ExactOutput"),
        }
    }
}

/// A single swap request handed to a swap adapter.
///
/// Orders are per-call values and never persisted. The router overwrites
/// `to` and `refund_to` before handing an order to an adapter, so whatever a
/// caller puts there is ignored on the payment paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOrder {
    pub swap_type: SwapType,
    /// Token spent, or [`NATIVE_TOKEN`].
    pub input_token: Address,
    /// Token delivered to `to`.
    pub output_token: Address,
    /// Exact spend (ExactInput) or spend ceiling (ExactOutput).
    pub input_amount: u128,
    /// Output floor (ExactInput) or exact target (ExactOutput).
    pub output_amount: u128,
    /// Last valid block timestamp, in unix seconds (inclusive).
    pub deadline: u64,
    /// Receiver of the swap output.
    pub to: Address,
    /// Receiver of unspent input and surplus output.
    pub refund_to: Address,
    /// Opaque routing payload produced by the quoting service:
    /// `abi.encode(bytes rawCall, address target)`.
    pub payload: Bytes,
}

impl SwapOrder {
    /// Whether the order spends the native currency.
    pub fn is_native_input(&self) -> bool {
        self.input_token == NATIVE_TOKEN
    }

    /// Return a copy of this order delivering to `to` and refunding to `refund_to`.
    pub fn routed(&self, to: Address, refund_to: Address) -> Self {
        Self {
            to,
            refund_to,
            ..self.clone()
        }
    }
}

/// Outcome of a swap, measured from balance deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwapResult {
    /// Input units that left the adapter during the exchange call.
    pub input_amount_spent: u128,
    /// Output units delivered to the order's `to` address.
    pub output_amount_received: u128,
}
