use alloy_primitives::Address;
use payroute_core::{SwapOrder, SwapResult};

use crate::adapters::SwapEngine;
use crate::error::SettlementError;
use crate::host::CallContext;
use crate::traits::SwapExecutor;

/// Adapter bound to a single, immutable exchange address.
#[derive(Debug, Clone)]
pub struct AggregatorAdapter {
    engine: SwapEngine,
    exchange: Address,
}

impl AggregatorAdapter {
    pub fn new(
        address: Address,
        exchange: Address,
        wrapped_native: Address,
    ) -> Result<Self, SettlementError> {
        if exchange.is_zero() {
            return Err(SettlementError::ZeroAddress("exchange"));
        }
        let engine = SwapEngine::new(address, wrapped_native)?;
        tracing::info!(adapter = %address, exchange = %exchange, "Aggregator adapter created");
        Ok(Self { engine, exchange })
    }

    pub fn exchange(&self) -> Address {
        self.exchange
    }

    pub fn wrapped_native(&self) -> Address {
        self.engine.wrapped_native()
    }
}

impl SwapExecutor for AggregatorAdapter {
    fn address(&self) -> Address {
        self.engine.address()
    }

    fn adapter_id(&self) -> &str {
        "aggregator"
    }

    fn swap(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<SwapResult, SettlementError> {
        self.engine.swap(ctx, order, self.exchange)
    }

    fn swap_native(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<SwapResult, SettlementError> {
        self.engine.swap_native(ctx, order, self.exchange)
    }
}
