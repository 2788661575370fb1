//! Programmable mock exchange and calldata builders for tests.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolInterface, SolValue};
use payroute_core::SwapOrder;
use std::sync::Arc;

use crate::error::SettlementError;
use crate::host::CallContext;
use crate::router::PaymentRouter;
use crate::traits::Exchange;

sol! {
    interface IMockExchange {
        function swapExactInput(
            address tokenIn,
            address tokenOut,
            uint256 amountIn,
            uint256 minAmountOut,
            address recipient
        ) external returns (uint256 amountOut);

        function swapExactOutput(
            address tokenIn,
            address tokenOut,
            uint256 amountOut,
            uint256 maxAmountIn,
            address recipient
        ) external returns (uint256 amountIn);
    }
}

/// Behaviour of a [`MockExchange`].
#[derive(Clone)]
pub enum ExchangeMode {
    /// Fill at the configured rate.
    Honest,
    /// Fill honestly but report `u128::MAX` as the output amount.
    MisreportOutput,
    /// Deliver half of the computed output while reporting the full amount.
    ShortChange,
    /// Fail with the given revert data.
    Revert(Bytes),
    /// Call back into the router's swap entry point before filling.
    Reenter {
        router: Arc<PaymentRouter>,
        order: SwapOrder,
    },
}

/// Exchange filling orders at `rate_num / rate_den` output per input unit
/// from its own inventory.
#[derive(Clone)]
pub struct MockExchange {
    mode: ExchangeMode,
    rate_num: u128,
    rate_den: u128,
}

impl MockExchange {
    pub fn new(mode: ExchangeMode, rate_num: u128, rate_den: u128) -> Self {
        Self {
            mode,
            rate_num,
            rate_den,
        }
    }

    fn quote_out(&self, amount_in: u128) -> u128 {
        amount_in.saturating_mul(self.rate_num) / self.rate_den
    }

    fn quote_in(&self, amount_out: u128) -> u128 {
        amount_out
            .saturating_mul(self.rate_den)
            .div_ceil(self.rate_num)
    }

    fn fill(
        &self,
        ctx: &mut CallContext<'_>,
        this: Address,
        leg: Leg,
    ) -> Result<u128, SettlementError> {
        let payer = ctx.caller;
        ctx.call(this, leg.token_in, 0, |token| {
            token.transfer_from(leg.token_in, payer, this, leg.amount_in)
        })?;
        let delivered = match self.mode {
            ExchangeMode::ShortChange => leg.amount_out / 2,
            _ => leg.amount_out,
        };
        ctx.state
            .transfer(leg.token_out, this, leg.recipient, delivered)?;
        Ok(match self.mode {
            ExchangeMode::MisreportOutput => u128::MAX,
            _ => leg.amount_out,
        })
    }
}

struct Leg {
    token_in: Address,
    token_out: Address,
    amount_in: u128,
    amount_out: u128,
    recipient: Address,
}

fn to_u128(value: U256) -> Result<u128, SettlementError> {
    u128::try_from(value)
        .map_err(|_| SettlementError::ExchangeReverted(Bytes::from_static(b"amount overflow")))
}

impl Exchange for MockExchange {
    fn execute(
        &self,
        ctx: &mut CallContext<'_>,
        this: Address,
        calldata: &Bytes,
    ) -> Result<Bytes, SettlementError> {
        match &self.mode {
            ExchangeMode::Revert(data) => {
                return Err(SettlementError::ExchangeReverted(data.clone()))
            }
            ExchangeMode::Reenter { router, order } => {
                let router = Arc::clone(router);
                let order = order.clone();
                ctx.call(this, router.address(), 0, |inner| {
                    router.pay_with_swap(inner, &order, B256::ZERO)
                })?;
            }
            _ => {}
        }

        let call = IMockExchange::IMockExchangeCalls::abi_decode(calldata)
            .map_err(|_| SettlementError::ExchangeReverted(Bytes::from_static(b"bad calldata")))?;

        let reported = match call {
            IMockExchange::IMockExchangeCalls::swapExactInput(c) => {
                let amount_in = to_u128(c.amountIn)?;
                let amount_out = self.quote_out(amount_in);
                if amount_out < to_u128(c.minAmountOut)? {
                    return Err(SettlementError::ExchangeReverted(Bytes::from_static(
                        b"too little received",
                    )));
                }
                let leg = Leg {
                    token_in: c.tokenIn,
                    token_out: c.tokenOut,
                    amount_in,
                    amount_out,
                    recipient: c.recipient,
                };
                self.fill(ctx, this, leg)?
            }
            IMockExchange::IMockExchangeCalls::swapExactOutput(c) => {
                let amount_out = to_u128(c.amountOut)?;
                let amount_in = self.quote_in(amount_out);
                if amount_in > to_u128(c.maxAmountIn)? {
                    return Err(SettlementError::ExchangeReverted(Bytes::from_static(
                        b"too much requested",
                    )));
                }
                let leg = Leg {
                    token_in: c.tokenIn,
                    token_out: c.tokenOut,
                    amount_in,
                    amount_out,
                    recipient: c.recipient,
                };
                self.fill(ctx, this, leg)?;
                amount_in
            }
        };

        Ok(U256::from(reported).abi_encode().into())
    }
}

/// Calldata for an exact-input fill.
pub fn exact_input_call(
    token_in: Address,
    token_out: Address,
    amount_in: u128,
    min_amount_out: u128,
    recipient: Address,
) -> Bytes {
    IMockExchange::swapExactInputCall {
        tokenIn: token_in,
        tokenOut: token_out,
        amountIn: U256::from(amount_in),
        minAmountOut: U256::from(min_amount_out),
        recipient,
    }
    .abi_encode()
    .into()
}

/// Calldata for an exact-output fill.
pub fn exact_output_call(
    token_in: Address,
    token_out: Address,
    amount_out: u128,
    max_amount_in: u128,
    recipient: Address,
) -> Bytes {
    IMockExchange::swapExactOutputCall {
        tokenIn: token_in,
        tokenOut: token_out,
        amountOut: U256::from(amount_out),
        maxAmountIn: U256::from(max_amount_in),
        recipient,
    }
    .abi_encode()
    .into()
}
