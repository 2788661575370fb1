//! Shared-allowance contract.
//!
//! Owners approve the hub once per token; each transfer is then authorized
//! by a signature over the token, amount, spender, an unordered single-use
//! nonce and a deadline. Used for tokens without native permit support.

use alloy_primitives::Address;

use crate::error::SettlementError;
use crate::host::{CallContext, WorldState};
use crate::permit::{transfer_permit_digest, SignedPermit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedAllowance {
    address: Address,
}

impl SharedAllowance {
    pub fn deploy(state: &mut WorldState, address: Address) -> Result<Self, SettlementError> {
        if address.is_zero() {
            return Err(SettlementError::ZeroAddress("shared allowance"));
        }
        if !state.hubs.insert(address) {
            return Err(SettlementError::AlreadyDeployed(address));
        }
        tracing::info!(hub = %address, "Shared allowance deployed");
        Ok(Self { address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Whether `owner` already consumed `nonce` on this hub.
    pub fn is_nonce_used(&self, state: &WorldState, owner: Address, nonce: u64) -> bool {
        state.hub_nonces.contains(&(self.address, owner, nonce))
    }

    /// Move `requested` units of `token` from `owner` to `to`.
    ///
    /// The spender is the account calling the hub; the owner must have
    /// named it in the signature.
    pub fn permit_transfer_from(
        &self,
        ctx: &mut CallContext<'_>,
        owner: Address,
        token: Address,
        requested: u128,
        to: Address,
        permit: &SignedPermit,
    ) -> Result<(), SettlementError> {
        if owner.is_zero() {
            return Err(SettlementError::ZeroAddress("owner"));
        }
        permit.check_deadline(ctx.now())?;
        if requested > permit.value {
            return Err(SettlementError::PermitAmountExceeded {
                permitted: permit.value,
                requested,
            });
        }
        if self.is_nonce_used(ctx.state, owner, permit.nonce) {
            return Err(SettlementError::NonceAlreadyUsed(permit.nonce));
        }

        let spender = ctx.caller;
        let digest = transfer_permit_digest(
            ctx.state.chain_id(),
            self.address,
            token,
            spender,
            &permit.terms(),
        );
        permit.verify(owner, &digest)?;

        ctx.state.hub_nonces.insert((self.address, owner, permit.nonce));
        ctx.call(self.address, token, 0, |token_ctx| {
            token_ctx.transfer_from(token, owner, to, requested)
        })?;
        tracing::debug!(
            hub = %self.address,
            owner = %owner,
            spender = %spender,
            token = %token,
            amount = requested,
            nonce = permit.nonce,
            "Shared allowance transfer"
        );
        Ok(())
    }
}
