//! Single-administrator ownership shared by the ledger, the router and the
//! exchange directory.

use alloy_primitives::Address;

use crate::error::SettlementError;
use crate::host::{CallContext, WorldState};
use crate::types::Event;

/// A contract gated by one administrator.
pub trait Ownable {
    /// Address of the contract.
    fn address(&self) -> Address;

    /// Current administrator.
    fn owner(&self, state: &WorldState) -> Option<Address> {
        state.owner_of(self.address())
    }

    /// Hand administration to `new_owner`. Owner only.
    fn transfer_ownership(
        &self,
        ctx: &mut CallContext<'_>,
        new_owner: Address,
    ) -> Result<(), SettlementError> {
        let contract = self.address();
        let previous = only_owner(ctx.state, contract, ctx.caller)?;
        if new_owner.is_zero() {
            return Err(SettlementError::ZeroAddress("new owner"));
        }
        ctx.state.owners.insert(contract, new_owner);
        ctx.state.emit(
            contract,
            Event::OwnershipTransferred {
                previous,
                new_owner,
            },
        );
        tracing::info!(
            contract = %contract,
            previous = %previous,
            new_owner = %new_owner,
            "Ownership transferred"
        );
        Ok(())
    }
}

/// Record `owner` as the administrator of a freshly deployed contract.
pub(crate) fn initialize(
    state: &mut WorldState,
    contract: Address,
    owner: Address,
) -> Result<(), SettlementError> {
    if contract.is_zero() {
        return Err(SettlementError::ZeroAddress("contract"));
    }
    if owner.is_zero() {
        return Err(SettlementError::ZeroAddress("owner"));
    }
    if state.owners.contains_key(&contract) {
        return Err(SettlementError::AlreadyDeployed(contract));
    }
    state.owners.insert(contract, owner);
    Ok(())
}

/// Fail with `NotOwner` unless `caller` administers `contract`.
pub(crate) fn only_owner(
    state: &WorldState,
    contract: Address,
    caller: Address,
) -> Result<Address, SettlementError> {
    match state.owner_of(contract) {
        Some(owner) if owner == caller => Ok(owner),
        _ => Err(SettlementError::NotOwner { caller }),
    }
}
