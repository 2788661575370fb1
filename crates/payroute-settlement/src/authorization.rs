//! Authorization paths.
//!
//! Every variant names its owner explicitly (the direct and signed paths
//! name the caller) and is reduced to a single `(owner, amount)` pull before
//! any funds move.

use alloy_primitives::Address;

use crate::allowance_hub::SharedAllowance;
use crate::error::SettlementError;
use crate::host::CallContext;
use crate::permit::SignedPermit;

/// Proof that the named owner agreed to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// Caller is the owner and pre-approved the router.
    Direct,
    /// Caller is the owner and presents a one-shot token permit.
    Signed(SignedPermit),
    /// A relayer presents a token permit signed by `owner`.
    Relayed { owner: Address, permit: SignedPermit },
    /// `owner` signed a shared-allowance transfer; used for tokens without
    /// permit support.
    FallbackAllowance { owner: Address, permit: SignedPermit },
}

impl Authorization {
    /// Permit presented by the caller for its own funds.
    ///
    /// Falls back to the shared allowance when `token` lacks permit support.
    pub fn signed(ctx: &CallContext<'_>, token: Address, permit: SignedPermit) -> Self {
        if ctx.state.supports_permit(token) {
            Self::Signed(permit)
        } else {
            Self::FallbackAllowance {
                owner: ctx.caller,
                permit,
            }
        }
    }

    /// Permit relayed on behalf of `owner`.
    pub fn relayed(
        ctx: &CallContext<'_>,
        token: Address,
        owner: Address,
        permit: SignedPermit,
    ) -> Self {
        if ctx.state.supports_permit(token) {
            Self::Relayed { owner, permit }
        } else {
            Self::FallbackAllowance { owner, permit }
        }
    }

    /// Owner whose funds this authorization moves.
    pub fn owner(&self, caller: Address) -> Address {
        match self {
            Self::Direct | Self::Signed(_) => caller,
            Self::Relayed { owner, .. } | Self::FallbackAllowance { owner, .. } => *owner,
        }
    }
}

/// Turns an [`Authorization`] into funds held by a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationResolver {
    spender: Address,
    hub: SharedAllowance,
}

impl AuthorizationResolver {
    /// Resolver pulling funds as `spender` (the router).
    pub fn new(spender: Address, hub: SharedAllowance) -> Self {
        Self { spender, hub }
    }

    /// Move exactly `amount` of `token` from the authorized owner to `to`.
    ///
    /// Returns the owner the funds came from.
    pub fn pull(
        &self,
        ctx: &mut CallContext<'_>,
        auth: &Authorization,
        token: Address,
        amount: u128,
        to: Address,
    ) -> Result<Address, SettlementError> {
        let owner = auth.owner(ctx.caller);
        if owner.is_zero() {
            return Err(SettlementError::ZeroAddress("owner"));
        }

        match auth {
            Authorization::Direct => {}
            Authorization::Signed(permit) | Authorization::Relayed { permit, .. } => {
                if permit.value != amount {
                    return Err(SettlementError::PermitValueMismatch {
                        signed: permit.value,
                        requested: amount,
                    });
                }
                ctx.state.permit(token, owner, self.spender, permit)?;
            }
            Authorization::FallbackAllowance { permit, .. } => {
                let hub = self.hub;
                ctx.call(self.spender, hub.address(), 0, |hub_ctx| {
                    hub.permit_transfer_from(hub_ctx, owner, token, amount, to, permit)
                })?;
                return Ok(owner);
            }
        }

        ctx.call(self.spender, token, 0, |token_ctx| {
            token_ctx.transfer_from(token, owner, to, amount)
        })?;
        Ok(owner)
    }
}
