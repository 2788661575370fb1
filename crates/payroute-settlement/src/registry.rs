use alloy_primitives::Address;
use std::collections::BTreeMap;

use crate::error::SettlementError;

/// Outcome of [`TokenRegistry::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    /// The token was not accepted before.
    Added,
    /// The token was already accepted with a different recipient.
    Updated { previous: Address },
    /// The token was already accepted with the same recipient.
    Unchanged,
}

/// Accepted settlement tokens and their recipients.
///
/// Presence of a key is acceptance; there is no null recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenRegistry {
    recipients: BTreeMap<Address, Address>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token`, paying `recipient`. Re-adding overwrites the recipient.
    pub fn insert(
        &mut self,
        token: Address,
        recipient: Address,
    ) -> Result<RegistryChange, SettlementError> {
        if token.is_zero() {
            return Err(SettlementError::ZeroAddress("token"));
        }
        if recipient.is_zero() {
            return Err(SettlementError::ZeroAddress("recipient"));
        }
        Ok(match self.recipients.insert(token, recipient) {
            None => RegistryChange::Added,
            Some(previous) if previous == recipient => RegistryChange::Unchanged,
            Some(previous) => RegistryChange::Updated { previous },
        })
    }

    /// Stop accepting `token`, returning its former recipient.
    pub fn remove(&mut self, token: &Address) -> Option<Address> {
        self.recipients.remove(token)
    }

    pub fn recipient_of(&self, token: &Address) -> Option<Address> {
        self.recipients.get(token).copied()
    }

    pub fn is_accepted(&self, token: &Address) -> bool {
        self.recipients.contains_key(token)
    }

    /// Accepted tokens with their recipients, ordered by token address.
    pub fn entries(&self) -> impl Iterator<Item = (Address, Address)> + '_ {
        self.recipients.iter().map(|(t, r)| (*t, *r))
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}
