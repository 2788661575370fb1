//! Swap execution adapters.
//!
//! Both adapters share [`SwapEngine`], which performs the single exchange
//! call and does all accounting from balance deltas. They differ only in
//! how the permitted exchange target is found.

pub mod aggregator;
pub mod settler;

use alloy_primitives::Address;
use payroute_core::{SwapOrder, SwapResult, SwapType};

use crate::error::SettlementError;
use crate::host::CallContext;
use crate::payload;
use crate::token::UNLIMITED_ALLOWANCE;
use crate::types::Event;

pub use aggregator::AggregatorAdapter;
pub use settler::{ExchangeDirectory, SettlerAdapter};

/// Balance-delta swap executor shared by the concrete adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapEngine {
    address: Address,
    wrapped_native: Address,
}

impl SwapEngine {
    pub fn new(address: Address, wrapped_native: Address) -> Result<Self, SettlementError> {
        if address.is_zero() {
            return Err(SettlementError::ZeroAddress("adapter"));
        }
        if wrapped_native.is_zero() {
            return Err(SettlementError::ZeroAddress("wrapped native"));
        }
        Ok(Self {
            address,
            wrapped_native,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }

    /// Token-input swap against `allowed_target`.
    pub fn swap(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        allowed_target: Address,
    ) -> Result<SwapResult, SettlementError> {
        if order.is_native_input() {
            return Err(SettlementError::InvalidNativeInput);
        }
        if ctx.value != 0 {
            return Err(SettlementError::NativeValueMismatch {
                expected: 0,
                sent: ctx.value,
            });
        }
        self.execute(ctx, order, order.input_token, allowed_target)
    }

    /// Native-input swap: wraps `ctx.value` and swaps the wrapped token.
    pub fn swap_native(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        allowed_target: Address,
    ) -> Result<SwapResult, SettlementError> {
        if !order.is_native_input() {
            return Err(SettlementError::InvalidNativeInput);
        }
        if ctx.value != order.input_amount {
            return Err(SettlementError::NativeValueMismatch {
                expected: order.input_amount,
                sent: ctx.value,
            });
        }
        if self.wrapped_native == order.output_token {
            return Err(SettlementError::IdenticalTokens(order.output_token));
        }
        ctx.state
            .deposit(self.wrapped_native, self.address, ctx.value)?;
        self.execute(ctx, order, self.wrapped_native, allowed_target)
    }

    fn execute(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        input_token: Address,
        allowed_target: Address,
    ) -> Result<SwapResult, SettlementError> {
        let output_token = order.output_token;
        if input_token == output_token {
            return Err(SettlementError::IdenticalTokens(input_token));
        }

        let (raw_call, target) = payload::decode(&order.payload)?;
        if target != allowed_target {
            return Err(SettlementError::InvalidSwapTarget(target));
        }
        let exchange = ctx
            .state
            .code_at(target)
            .ok_or(SettlementError::NotAContract(target))?;

        if ctx.state.allowance(input_token, self.address, target) < order.input_amount {
            ctx.state
                .approve(input_token, self.address, target, UNLIMITED_ALLOWANCE)?;
        }

        let input_before = ctx.state.balance_of(input_token, self.address);
        let output_before = ctx.state.balance_of(output_token, self.address);

        // Return data is ignored; only balances count.
        ctx.call(self.address, target, 0, |inner| {
            exchange.execute(inner, target, &raw_call)
        })?;

        let input_after = ctx.state.balance_of(input_token, self.address);
        let output_after = ctx.state.balance_of(output_token, self.address);
        let spent = input_before.saturating_sub(input_after);
        let received = output_after.saturating_sub(output_before);

        tracing::debug!(
            adapter = %self.address,
            target = %target,
            swap_type = %order.swap_type,
            spent,
            received,
            "Exchange call completed"
        );

        if received < order.output_amount {
            return Err(SettlementError::InsufficientOutput {
                expected: order.output_amount,
                received,
            });
        }
        if order.swap_type == SwapType::ExactOutput && spent > order.input_amount {
            return Err(SettlementError::InsufficientInput {
                max: order.input_amount,
                spent,
            });
        }

        let delivered = match order.swap_type {
            SwapType::ExactInput => received,
            SwapType::ExactOutput => order.output_amount,
        };
        ctx.state
            .transfer(output_token, self.address, order.to, delivered)?;

        let surplus = received - delivered;
        if surplus > 0 {
            ctx.state
                .transfer(output_token, self.address, order.refund_to, surplus)?;
        }

        self.refund_input(ctx, order, input_token)?;

        ctx.state.emit(
            self.address,
            Event::Swapped {
                swap_type: order.swap_type,
                input_token: order.input_token,
                output_token,
                input_amount_spent: spent,
                output_amount_received: delivered,
                to: order.to,
                refund_to: order.refund_to,
            },
        );

        Ok(SwapResult {
            input_amount_spent: spent,
            output_amount_received: delivered,
        })
    }

    /// Return whatever input the adapter still holds to `order.refund_to`.
    fn refund_input(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        input_token: Address,
    ) -> Result<(), SettlementError> {
        let leftover = ctx.state.balance_of(input_token, self.address);
        if leftover == 0 {
            return Ok(());
        }

        if order.is_native_input() {
            ctx.state
                .withdraw(self.wrapped_native, self.address, leftover)?;
            ctx.state
                .transfer_native(self.address, order.refund_to, leftover)?;
        } else {
            ctx.state
                .transfer(input_token, self.address, order.refund_to, leftover)?;
        }
        tracing::debug!(
            adapter = %self.address,
            refund_to = %order.refund_to,
            amount = leftover,
            "Unspent input refunded"
        );
        Ok(())
    }
}
