//! Host-native fungible tokens.
//!
//! Tokens live directly in [`WorldState`]; they have no hooks and never call
//! back into other contracts.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SettlementError;
use crate::host::{CallContext, WorldState};
use crate::permit::{token_permit_digest, SignedPermit};

/// Allowance value treated as unlimited. It is never decremented.
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

/// Capabilities of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Plain allowance-based token.
    Basic,
    /// Allowance plus signed single-use permits.
    Permit,
    /// Wrapper around the native currency (deposit mints, withdraw burns).
    WrappedNative,
}

/// Accounts of one token.
#[derive(Debug, Clone)]
pub struct TokenAccounts {
    kind: TokenKind,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    nonces: HashMap<Address, u64>,
    total_supply: u128,
}

impl TokenAccounts {
    fn new(kind: TokenKind) -> Self {
        Self {
            kind,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            nonces: HashMap::new(),
            total_supply: 0,
        }
    }

    fn balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn credit(&mut self, token: Address, account: Address, amount: u128) -> Result<(), SettlementError> {
        let updated = self
            .balance(&account)
            .checked_add(amount)
            .ok_or(SettlementError::BalanceOverflow { token, account })?;
        self.balances.insert(account, updated);
        Ok(())
    }

    /// Move `amount` between accounts, leaving both untouched on failure.
    fn move_balance(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), SettlementError> {
        let available = self.balance(&from);
        if available < amount {
            return Err(SettlementError::InsufficientBalance {
                token,
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let received = self
            .balance(&to)
            .checked_add(amount)
            .ok_or(SettlementError::BalanceOverflow { token, account: to })?;
        self.balances.insert(from, available - amount);
        self.balances.insert(to, received);
        Ok(())
    }

    fn debit(&mut self, token: Address, account: Address, amount: u128) -> Result<(), SettlementError> {
        let available = self.balance(&account);
        if available < amount {
            return Err(SettlementError::InsufficientBalance {
                token,
                available,
                required: amount,
            });
        }
        self.balances.insert(account, available - amount);
        Ok(())
    }
}

impl WorldState {
    /// Register a new token at `token`.
    pub fn create_token(&mut self, token: Address, kind: TokenKind) -> Result<(), SettlementError> {
        if token.is_zero() {
            return Err(SettlementError::ZeroAddress("token"));
        }
        if self.tokens.contains_key(&token) {
            return Err(SettlementError::AlreadyDeployed(token));
        }
        self.tokens.insert(token, TokenAccounts::new(kind));
        tracing::debug!(token = %token, kind = ?kind, "Token created");
        Ok(())
    }

    pub fn token_kind(&self, token: Address) -> Option<TokenKind> {
        self.tokens.get(&token).map(|t| t.kind)
    }

    /// Whether the token accepts signed permits.
    pub fn supports_permit(&self, token: Address) -> bool {
        self.token_kind(token) == Some(TokenKind::Permit)
    }

    fn accounts(&self, token: Address) -> Result<&TokenAccounts, SettlementError> {
        self.tokens
            .get(&token)
            .ok_or(SettlementError::UnknownToken(token))
    }

    fn accounts_mut(&mut self, token: Address) -> Result<&mut TokenAccounts, SettlementError> {
        self.tokens
            .get_mut(&token)
            .ok_or(SettlementError::UnknownToken(token))
    }

    /// Balance of `account`; zero for unknown tokens.
    pub fn balance_of(&self, token: Address, account: Address) -> u128 {
        self.tokens
            .get(&token)
            .map(|t| t.balance(&account))
            .unwrap_or(0)
    }

    pub fn total_supply(&self, token: Address) -> u128 {
        self.tokens.get(&token).map(|t| t.total_supply).unwrap_or(0)
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> u128 {
        self.tokens
            .get(&token)
            .and_then(|t| t.allowances.get(&(owner, spender)).copied())
            .unwrap_or(0)
    }

    /// Current permit nonce of `owner`.
    pub fn nonce_of(&self, token: Address, owner: Address) -> u64 {
        self.tokens
            .get(&token)
            .and_then(|t| t.nonces.get(&owner).copied())
            .unwrap_or(0)
    }

    /// Mint new units to `to`.
    pub fn mint(&mut self, token: Address, to: Address, amount: u128) -> Result<(), SettlementError> {
        if to.is_zero() {
            return Err(SettlementError::ZeroAddress("mint recipient"));
        }
        let accounts = self.accounts_mut(token)?;
        let supply = accounts
            .total_supply
            .checked_add(amount)
            .ok_or(SettlementError::BalanceOverflow { token, account: to })?;
        accounts.credit(token, to, amount)?;
        accounts.total_supply = supply;
        Ok(())
    }

    pub fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: u128,
    ) -> Result<(), SettlementError> {
        if spender.is_zero() {
            return Err(SettlementError::ZeroAddress("spender"));
        }
        self.accounts_mut(token)?
            .allowances
            .insert((owner, spender), amount);
        Ok(())
    }

    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), SettlementError> {
        if to.is_zero() {
            return Err(SettlementError::ZeroAddress("transfer recipient"));
        }
        let accounts = self.accounts_mut(token)?;
        accounts.move_balance(token, from, to, amount)
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    pub(crate) fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), SettlementError> {
        let available = self.allowance(token, from, spender);
        if available < amount {
            self.accounts(token)?;
            return Err(SettlementError::InsufficientAllowance {
                token,
                available,
                required: amount,
            });
        }
        self.transfer(token, from, to, amount)?;
        if available != UNLIMITED_ALLOWANCE {
            self.accounts_mut(token)?
                .allowances
                .insert((from, spender), available - amount);
        }
        Ok(())
    }

    /// Consume a signed permit, setting the `owner -> spender` allowance to
    /// the permitted value.
    pub fn permit(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        permit: &SignedPermit,
    ) -> Result<(), SettlementError> {
        if self.accounts(token)?.kind != TokenKind::Permit {
            return Err(SettlementError::PermitUnsupported(token));
        }
        permit.check_deadline(self.timestamp())?;

        let expected = self.nonce_of(token, owner);
        if permit.nonce != expected {
            return Err(SettlementError::InvalidNonce {
                expected,
                provided: permit.nonce,
            });
        }

        let digest = token_permit_digest(self.chain_id(), token, owner, spender, &permit.terms());
        permit.verify(owner, &digest)?;

        let accounts = self.accounts_mut(token)?;
        accounts.nonces.insert(owner, expected + 1);
        accounts.allowances.insert((owner, spender), permit.value);
        tracing::debug!(
            token = %token,
            owner = %owner,
            spender = %spender,
            nonce = expected,
            "Permit consumed"
        );
        Ok(())
    }

    /// Wrap `amount` of `account`'s native currency.
    pub fn deposit(&mut self, token: Address, account: Address, amount: u128) -> Result<(), SettlementError> {
        self.require_wrapped(token)?;
        self.transfer_native(account, token, amount)?;
        self.mint(token, account, amount)
    }

    /// Unwrap `amount` back into `account`'s native balance.
    pub fn withdraw(&mut self, token: Address, account: Address, amount: u128) -> Result<(), SettlementError> {
        self.require_wrapped(token)?;
        let accounts = self.accounts_mut(token)?;
        accounts.debit(token, account, amount)?;
        accounts.total_supply = accounts.total_supply.saturating_sub(amount);
        self.transfer_native(token, account, amount)
    }

    fn require_wrapped(&self, token: Address) -> Result<(), SettlementError> {
        match self.accounts(token)?.kind {
            TokenKind::WrappedNative => Ok(()),
            _ => Err(SettlementError::UnknownToken(token)),
        }
    }
}

impl CallContext<'_> {
    /// `transferFrom` on `token`, spending the allowance `from` granted to
    /// the account calling the token.
    pub fn transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), SettlementError> {
        self.state.transfer_from(token, self.caller, from, to, amount)
    }
}
