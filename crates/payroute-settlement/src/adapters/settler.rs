use alloy_primitives::Address;
use payroute_core::{SwapOrder, SwapResult};

use crate::adapters::SwapEngine;
use crate::error::SettlementError;
use crate::host::{CallContext, WorldState};
use crate::ownable::{self, Ownable};
use crate::traits::SwapExecutor;
use crate::types::Event;

/// Directory holding the current deployment of an exchange.
///
/// The exchange operator upgrades the entry; adapters that consult the
/// directory follow without being redeployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeDirectory {
    address: Address,
}

impl ExchangeDirectory {
    pub fn deploy(
        state: &mut WorldState,
        address: Address,
        owner: Address,
        initial: Address,
    ) -> Result<Self, SettlementError> {
        if initial.is_zero() {
            return Err(SettlementError::ZeroAddress("exchange"));
        }
        ownable::initialize(state, address, owner)?;
        state.directories.insert(address, initial);
        tracing::info!(directory = %address, exchange = %initial, "Exchange directory deployed");
        Ok(Self { address })
    }

    /// Handle to an already deployed directory.
    pub fn at(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Current exchange deployment.
    pub fn current(&self, state: &WorldState) -> Option<Address> {
        state.directories.get(&self.address).copied()
    }

    /// Point the directory at a new exchange deployment. Owner only.
    pub fn upgrade(
        &self,
        ctx: &mut CallContext<'_>,
        target: Address,
    ) -> Result<(), SettlementError> {
        ownable::only_owner(ctx.state, self.address, ctx.caller)?;
        if target.is_zero() {
            return Err(SettlementError::ZeroAddress("exchange"));
        }
        let previous = ctx
            .state
            .directories
            .insert(self.address, target)
            .unwrap_or(Address::ZERO);
        ctx.state
            .emit(self.address, Event::DirectoryUpgraded { previous, target });
        tracing::info!(
            directory = %self.address,
            previous = %previous,
            target = %target,
            "Exchange directory upgraded"
        );
        Ok(())
    }
}

impl Ownable for ExchangeDirectory {
    fn address(&self) -> Address {
        self.address
    }
}

/// Adapter whose exchange target is looked up in an [`ExchangeDirectory`]
/// on every swap.
#[derive(Debug, Clone)]
pub struct SettlerAdapter {
    engine: SwapEngine,
    directory: ExchangeDirectory,
}

impl SettlerAdapter {
    pub fn new(
        address: Address,
        directory: Address,
        wrapped_native: Address,
    ) -> Result<Self, SettlementError> {
        if directory.is_zero() {
            return Err(SettlementError::ZeroAddress("directory"));
        }
        let engine = SwapEngine::new(address, wrapped_native)?;
        tracing::info!(adapter = %address, directory = %directory, "Settler adapter created");
        Ok(Self {
            engine,
            directory: ExchangeDirectory::at(directory),
        })
    }

    pub fn directory(&self) -> Address {
        self.directory.address()
    }

    fn allowed_target(&self, state: &WorldState) -> Result<Address, SettlementError> {
        self.directory
            .current(state)
            .ok_or(SettlementError::NotAContract(self.directory.address()))
    }
}

impl SwapExecutor for SettlerAdapter {
    fn address(&self) -> Address {
        self.engine.address()
    }

    fn adapter_id(&self) -> &str {
        "settler"
    }

    fn swap(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<SwapResult, SettlementError> {
        let target = self.allowed_target(ctx.state)?;
        self.engine.swap(ctx, order, target)
    }

    fn swap_native(
        &self,
        ctx: &mut CallContext<'_>,
        order: &SwapOrder,
    ) -> Result<SwapResult, SettlementError> {
        let target = self.allowed_target(ctx.state)?;
        self.engine.swap_native(ctx, order, target)
    }
}
