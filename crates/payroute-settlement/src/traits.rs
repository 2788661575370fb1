use alloy_primitives::{Address, Bytes};
use payroute_core::{SwapOrder, SwapResult};

use crate::error::SettlementError;
use crate::host::CallContext;

/// Swap execution adapter interface.
///
/// Each implementation bridges the router to one concrete exchange. The
/// adapter must already hold the order's input when `swap` is called and
/// must hold none of the involved tokens when it returns successfully.
pub trait SwapExecutor: Send + Sync {
    /// Address the adapter is deployed at.
    fn address(&self) -> Address;

    /// Return the unique identifier of this adapter (e.g. "aggregator").
    fn adapter_id(&self) -> &str;

    /// Execute a token-input swap.
    fn swap(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<SwapResult, SettlementError>;

    /// Execute a native-input swap; `ctx.value` carries the input.
    fn swap_native(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<SwapResult, SettlementError>;
}

/// Code of an external exchange contract.
pub trait Exchange: Send + Sync {
    /// Run `calldata` against the exchange deployed at `this`.
    ///
    /// `ctx.caller` is the account that invoked the exchange. Errors are
    /// surfaced to the caller unchanged.
    fn execute(
        &self,
        ctx: &mut CallContext<'_>,
        this: Address,
        calldata: &Bytes,
    ) -> Result<Bytes, SettlementError>;
}
