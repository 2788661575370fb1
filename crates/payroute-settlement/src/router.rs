use alloy_primitives::{Address, B256};
use payroute_core::{SwapOrder, NATIVE_TOKEN};
use std::sync::Arc;

use crate::allowance_hub::SharedAllowance;
use crate::authorization::{Authorization, AuthorizationResolver};
use crate::error::SettlementError;
use crate::host::{CallContext, WorldState};
use crate::ledger::SettlementLedger;
use crate::ownable::{self, Ownable};
use crate::permit::SignedPermit;
use crate::traits::SwapExecutor;
use crate::types::{Event, SettlementRecord};

/// Payment router.
///
/// Public entry point of the engine. Every payment authorizes the named
/// owner's funds, optionally swaps them through the installed adapter and
/// settles through the fixed ledger.
#[derive(Debug, Clone)]
pub struct PaymentRouter {
    address: Address,
    ledger: Arc<SettlementLedger>,
    resolver: AuthorizationResolver,
}

impl PaymentRouter {
    /// Deploy a router bound to `ledger` for its whole lifetime.
    pub fn deploy(
        state: &mut WorldState,
        address: Address,
        admin: Address,
        ledger: Arc<SettlementLedger>,
        hub: SharedAllowance,
    ) -> Result<Self, SettlementError> {
        if ledger.address().is_zero() {
            return Err(SettlementError::ZeroAddress("ledger"));
        }
        ownable::initialize(state, address, admin)?;
        tracing::info!(
            router = %address,
            ledger = %ledger.address(),
            hub = %hub.address(),
            "Payment router deployed"
        );
        Ok(Self {
            address,
            ledger,
            resolver: AuthorizationResolver::new(address, hub),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn ledger(&self) -> &Arc<SettlementLedger> {
        &self.ledger
    }

    /// Currently installed swap adapter.
    pub fn swap_adapter(&self, state: &WorldState) -> Option<Arc<dyn SwapExecutor>> {
        state.adapters.get(&self.address).cloned()
    }

    // ---- direct payments ----

    /// Pay `amount` of an accepted token from the caller's pre-approved allowance.
    pub fn pay(
        &self,
        ctx: &mut CallContext<'_>,
        token: Address,
        amount: u128,
        reference: B256,
    ) -> Result<SettlementRecord, SettlementError> {
        self.settle_direct(ctx, &Authorization::Direct, token, amount, reference)
    }

    /// Pay from the caller's funds using a one-shot signed permit.
    pub fn pay_with_permit(
        &self,
        ctx: &mut CallContext<'_>,
        token: Address,
        amount: u128,
        reference: B256,
        permit: SignedPermit,
    ) -> Result<SettlementRecord, SettlementError> {
        let auth = Authorization::signed(ctx, token, permit);
        self.settle_direct(ctx, &auth, token, amount, reference)
    }

    /// Relay a payment from `owner` using a permit `owner` signed.
    pub fn pay_on_behalf(
        &self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        token: Address,
        amount: u128,
        reference: B256,
        permit: SignedPermit,
    ) -> Result<SettlementRecord, SettlementError> {
        let auth = Authorization::relayed(ctx, token, owner, permit);
        self.settle_direct(ctx, &auth, token, amount, reference)
    }

    fn settle_direct(
        &self,
        ctx: &mut CallContext<'_>,
        auth: &Authorization,
        token: Address,
        amount: u128,
        reference: B256,
    ) -> Result<SettlementRecord, SettlementError> {
        reject_value(ctx)?;
        let ledger = self.ledger.address();
        let owner = self.resolver.pull(ctx, auth, token, amount, ledger)?;
        self.ledger
            .settle(ctx.state, owner, token, amount, token, amount, reference)
    }

    // ---- swap payments ----

    /// Swap the caller's pre-approved input and settle the output.
    pub fn pay_with_swap(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        reference: B256,
    ) -> Result<SettlementRecord, SettlementError> {
        self.with_lock(ctx, |ctx| {
            self.swap_and_settle(ctx, &Authorization::Direct, order, reference)
        })
    }

    /// Swap the caller's input authorized by a signed permit.
    pub fn pay_with_swap_permit(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        reference: B256,
        permit: SignedPermit,
    ) -> Result<SettlementRecord, SettlementError> {
        self.with_lock(ctx, |ctx| {
            let auth = Authorization::signed(ctx, order.input_token, permit);
            self.swap_and_settle(ctx, &auth, order, reference)
        })
    }

    /// Relay a swap payment from `owner` using a permit `owner` signed.
    pub fn pay_with_swap_on_behalf(
        &self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        order: &SwapOrder,
        reference: B256,
        permit: SignedPermit,
    ) -> Result<SettlementRecord, SettlementError> {
        self.with_lock(ctx, |ctx| {
            let auth = Authorization::relayed(ctx, order.input_token, owner, permit);
            self.swap_and_settle(ctx, &auth, order, reference)
        })
    }

    /// Swap the attached native value and settle the output.
    pub fn pay_with_native_swap(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
        reference: B256,
    ) -> Result<SettlementRecord, SettlementError> {
        self.with_lock(ctx, |ctx| {
            let adapter = self.prepare_swap(ctx, order)?;
            if !order.is_native_input() {
                return Err(SettlementError::InvalidNativeInput);
            }
            let owner = ctx.caller;
            let routed = order.routed(self.ledger.address(), owner);

            let value = ctx.value;
            let result = ctx.call(self.address, adapter.address(), value, |inner| {
                adapter.swap_native(inner, &routed)
            })?;

            self.ledger.settle(
                ctx.state,
                owner,
                order.output_token,
                result.output_amount_received,
                NATIVE_TOKEN,
                result.input_amount_spent,
                reference,
            )
        })
    }

    fn swap_and_settle(
        &self,
        ctx: &mut CallContext<'_>,
        auth: &Authorization,
        order: &SwapOrder,
        reference: B256,
    ) -> Result<SettlementRecord, SettlementError> {
        let adapter = self.prepare_swap(ctx, order)?;
        reject_value(ctx)?;
        if order.is_native_input() {
            return Err(SettlementError::InvalidNativeInput);
        }

        let owner = self.resolver.pull(
            ctx,
            auth,
            order.input_token,
            order.input_amount,
            adapter.address(),
        )?;
        let routed = order.routed(self.ledger.address(), owner);

        let result = ctx.call(self.address, adapter.address(), 0, |inner| {
            adapter.swap(inner, &routed)
        })?;

        self.ledger.settle(
            ctx.state,
            owner,
            order.output_token,
            result.output_amount_received,
            order.input_token,
            result.input_amount_spent,
            reference,
        )
    }

    /// Deadline and adapter checks shared by every swap path.
    fn prepare_swap(
        &self,
        ctx: &CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<Arc<dyn SwapExecutor>, SettlementError> {
        let now = ctx.now();
        if order.deadline < now {
            return Err(SettlementError::DeadlineExpired {
                deadline: order.deadline,
                now,
            });
        }
        self.swap_adapter(ctx.state)
            .ok_or(SettlementError::SwapModuleNotSet)
    }

    fn with_lock<T, F>(&self, ctx: &mut CallContext<'_>, f: F) -> Result<T, SettlementError>
    where
        F: FnOnce(&mut CallContext<'_>) -> Result<T, SettlementError>,
    {
        if !ctx.state.locks.insert(self.address) {
            return Err(SettlementError::Reentrancy);
        }
        let result = f(ctx);
        ctx.state.locks.remove(&self.address);
        result
    }

    // ---- administration ----

    /// Install, replace or (with `None`) remove the swap adapter. Admin only.
    pub fn set_swap_adapter(
        &self,
        ctx: &mut CallContext<'_>,
        adapter: Option<Arc<dyn SwapExecutor>>,
    ) -> Result<(), SettlementError> {
        ownable::only_owner(ctx.state, self.address, ctx.caller)?;
        let next = adapter.as_ref().map(|a| a.address());
        if next.is_some_and(|a| a.is_zero()) {
            return Err(SettlementError::ZeroAddress("adapter"));
        }

        let previous = match adapter {
            Some(adapter) => ctx.state.adapters.insert(self.address, adapter),
            None => ctx.state.adapters.remove(&self.address),
        }
        .map(|a| a.address());

        ctx.state.emit(
            self.address,
            Event::AdapterUpdated {
                previous,
                adapter: next,
            },
        );
        tracing::info!(previous = ?previous, adapter = ?next, "Swap adapter updated");
        Ok(())
    }

    /// Drain the router's balance of `token` (or native currency) to `to`.
    /// Admin only.
    pub fn sweep(
        &self,
        ctx: &mut CallContext<'_>,
        token: Address,
        to: Address,
    ) -> Result<u128, SettlementError> {
        ownable::only_owner(ctx.state, self.address, ctx.caller)?;
        if to.is_zero() {
            return Err(SettlementError::ZeroAddress("sweep recipient"));
        }

        let amount = if token == NATIVE_TOKEN {
            let amount = ctx.state.native_balance(self.address);
            ctx.state.transfer_native(self.address, to, amount)?;
            amount
        } else {
            let amount = ctx.state.balance_of(token, self.address);
            if amount > 0 {
                ctx.state.transfer(token, self.address, to, amount)?;
            }
            amount
        };

        ctx.state
            .emit(self.address, Event::Swept { token, to, amount });
        tracing::info!(token = %token, to = %to, amount, "Router balance swept");
        Ok(amount)
    }
}

impl Ownable for PaymentRouter {
    fn address(&self) -> Address {
        self.address
    }
}

fn reject_value(ctx: &CallContext<'_>) -> Result<(), SettlementError> {
    if ctx.value != 0 {
        return Err(SettlementError::NativeValueMismatch {
            expected: 0,
            sent: ctx.value,
        });
    }
    Ok(())
}
