//! Deterministic in-process execution host.
//!
//! [`WorldState`] holds every piece of state the engine's contracts touch.
//! [`Chain`] runs one transaction at a time against it and restores a
//! snapshot when the transaction fails, which gives the all-or-nothing
//! semantics the settlement flow relies on.

use alloy_primitives::Address;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::SettlementError;
use crate::registry::TokenRegistry;
use crate::token::TokenAccounts;
use crate::traits::{Exchange, SwapExecutor};
use crate::types::{Event, Log};

/// Maximum nesting of calls inside one transaction.
pub const MAX_CALL_DEPTH: usize = 64;

/// Block environment visible to every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEnv {
    pub chain_id: u64,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
}

/// Complete state of the host.
#[derive(Clone)]
pub struct WorldState {
    pub(crate) block: BlockEnv,
    pub(crate) tokens: HashMap<Address, TokenAccounts>,
    pub(crate) native: HashMap<Address, u128>,
    pub(crate) code: HashMap<Address, Arc<dyn Exchange>>,
    pub(crate) owners: HashMap<Address, Address>,
    pub(crate) registries: HashMap<Address, TokenRegistry>,
    pub(crate) adapters: HashMap<Address, Arc<dyn SwapExecutor>>,
    pub(crate) directories: HashMap<Address, Address>,
    pub(crate) hub_nonces: HashSet<(Address, Address, u64)>,
    pub(crate) hubs: HashSet<Address>,
    pub(crate) locks: HashSet<Address>,
    pub(crate) logs: Vec<Log>,
}

impl WorldState {
    /// Create an empty state for the given block environment.
    pub fn new(block: BlockEnv) -> Self {
        Self {
            block,
            tokens: HashMap::new(),
            native: HashMap::new(),
            code: HashMap::new(),
            owners: HashMap::new(),
            registries: HashMap::new(),
            adapters: HashMap::new(),
            directories: HashMap::new(),
            hub_nonces: HashSet::new(),
            hubs: HashSet::new(),
            locks: HashSet::new(),
            logs: Vec::new(),
        }
    }

    pub fn block(&self) -> BlockEnv {
        self.block
    }

    pub fn chain_id(&self) -> u64 {
        self.block.chain_id
    }

    pub fn timestamp(&self) -> u64 {
        self.block.timestamp
    }

    /// Install exchange code at `address`.
    pub fn install_code(
        &mut self,
        address: Address,
        exchange: Arc<dyn Exchange>,
    ) -> Result<(), SettlementError> {
        if address.is_zero() {
            return Err(SettlementError::ZeroAddress("exchange"));
        }
        if self.code.contains_key(&address) {
            return Err(SettlementError::AlreadyDeployed(address));
        }
        self.code.insert(address, exchange);
        Ok(())
    }

    /// Whether `address` holds exchange code.
    pub fn has_code(&self, address: Address) -> bool {
        self.code.contains_key(&address)
    }

    pub(crate) fn code_at(&self, address: Address) -> Option<Arc<dyn Exchange>> {
        self.code.get(&address).cloned()
    }

    /// Owner recorded for an ownable contract.
    pub fn owner_of(&self, contract: Address) -> Option<Address> {
        self.owners.get(&contract).copied()
    }

    /// Whether `contract` currently holds its re-entrancy lock.
    pub fn is_locked(&self, contract: Address) -> bool {
        self.locks.contains(&contract)
    }

    pub(crate) fn emit(&mut self, address: Address, event: Event) {
        tracing::trace!(contract = %address, event = %event, "Event logged");
        self.logs.push(Log { address, event });
    }

    /// All events logged so far, oldest first.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Events logged by one contract.
    pub fn logs_from(&self, address: Address) -> impl Iterator<Item = &Event> {
        self.logs
            .iter()
            .filter(move |log| log.address == address)
            .map(|log| &log.event)
    }

    pub fn native_balance(&self, account: Address) -> u128 {
        self.native.get(&account).copied().unwrap_or(0)
    }

    /// Credit native currency out of thin air (genesis allocation).
    pub fn fund_native(&mut self, account: Address, amount: u128) -> Result<(), SettlementError> {
        let updated = self.native_balance(account).checked_add(amount).ok_or(
            SettlementError::BalanceOverflow {
                token: payroute_core::NATIVE_TOKEN,
                account,
            },
        )?;
        self.native.insert(account, updated);
        Ok(())
    }

    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), SettlementError> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let available = self.native_balance(from);
        if available < amount {
            return Err(SettlementError::InsufficientBalance {
                token: payroute_core::NATIVE_TOKEN,
                available,
                required: amount,
            });
        }
        let received = self.native_balance(to).checked_add(amount).ok_or(
            SettlementError::BalanceOverflow {
                token: payroute_core::NATIVE_TOKEN,
                account: to,
            },
        )?;
        self.native.insert(from, available - amount);
        self.native.insert(to, received);
        Ok(())
    }
}

/// Per-call view of the host.
pub struct CallContext<'a> {
    pub state: &'a mut WorldState,
    /// Immediate caller of the running contract.
    pub caller: Address,
    /// Native value attached to this call.
    pub value: u128,
    pub depth: usize,
}

impl<'a> CallContext<'a> {
    pub fn new(state: &'a mut WorldState, caller: Address, value: u128) -> Self {
        Self {
            state,
            caller,
            value,
            depth: 0,
        }
    }

    /// Current block timestamp.
    pub fn now(&self) -> u64 {
        self.state.block.timestamp
    }

    /// Perform a nested call from `from` to `to`, transferring `value`.
    ///
    /// Any error aborts the enclosing transaction; there is no way to catch it.
    pub fn call<T, F>(
        &mut self,
        from: Address,
        to: Address,
        value: u128,
        f: F,
    ) -> Result<T, SettlementError>
    where
        F: FnOnce(&mut CallContext<'_>) -> Result<T, SettlementError>,
    {
        if self.depth + 1 > MAX_CALL_DEPTH {
            return Err(SettlementError::CallDepthExceeded);
        }
        self.state.transfer_native(from, to, value)?;
        let mut inner = CallContext {
            state: &mut *self.state,
            caller: from,
            value,
            depth: self.depth + 1,
        };
        f(&mut inner)
    }
}

/// Owns the world state and executes transactions against it.
pub struct Chain {
    state: WorldState,
}

impl Chain {
    /// Create a chain with an empty state.
    pub fn new(chain_id: u64, timestamp: u64) -> Self {
        Self {
            state: WorldState::new(BlockEnv {
                chain_id,
                timestamp,
            }),
        }
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    /// Direct mutable access for genesis setup and deployments.
    pub fn state_mut(&mut self) -> &mut WorldState {
        &mut self.state
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.state.block.timestamp = timestamp;
    }

    /// Advance the block timestamp by `seconds`.
    pub fn advance(&mut self, seconds: u64) {
        self.state.block.timestamp = self.state.block.timestamp.saturating_add(seconds);
    }

    /// Execute one transaction from `caller` to `to` carrying `value`.
    ///
    /// On error every effect of the transaction, including the value
    /// transfer, is discarded.
    pub fn execute<T, F>(
        &mut self,
        caller: Address,
        to: Address,
        value: u128,
        f: F,
    ) -> Result<T, SettlementError>
    where
        F: FnOnce(&mut CallContext<'_>) -> Result<T, SettlementError>,
    {
        // The log is append-only, so its length is enough to restore it.
        let logs = std::mem::take(&mut self.state.logs);
        let snapshot = self.state.clone();
        self.state.logs = logs;
        let log_mark = self.state.logs.len();

        let result = run(&mut self.state, caller, to, value, f);
        self.state.locks.clear();

        if let Err(e) = &result {
            tracing::warn!(
                caller = %caller,
                to = %to,
                value,
                error = %e,
                "Transaction reverted"
            );
            let mut logs = std::mem::take(&mut self.state.logs);
            logs.truncate(log_mark);
            self.state = snapshot;
            self.state.logs = logs;
        }
        result
    }
}

fn run<T, F>(
    state: &mut WorldState,
    caller: Address,
    to: Address,
    value: u128,
    f: F,
) -> Result<T, SettlementError>
where
    F: FnOnce(&mut CallContext<'_>) -> Result<T, SettlementError>,
{
    state.transfer_native(caller, to, value)?;
    let mut ctx = CallContext::new(state, caller, value);
    f(&mut ctx)
}
