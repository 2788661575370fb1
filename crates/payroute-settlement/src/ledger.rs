use alloy_primitives::{Address, B256};

use crate::error::SettlementError;
use crate::host::{CallContext, WorldState};
use crate::ownable::{self, Ownable};
use crate::registry::{RegistryChange, TokenRegistry};
use crate::types::{Event, SettlementRecord};

/// Settlement ledger.
///
/// Hosts the accepted-token registry and performs the final
/// transfer-then-record step of every payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementLedger {
    address: Address,
}

impl SettlementLedger {
    /// Deploy a ledger at `address` administered by `admin`.
    pub fn deploy(
        state: &mut WorldState,
        address: Address,
        admin: Address,
    ) -> Result<Self, SettlementError> {
        ownable::initialize(state, address, admin)?;
        state.registries.insert(address, TokenRegistry::new());
        tracing::info!(ledger = %address, admin = %admin, "Settlement ledger deployed");
        Ok(Self { address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn registry<'s>(&self, state: &'s WorldState) -> Option<&'s TokenRegistry> {
        state.registries.get(&self.address)
    }

    /// Accept `token`, paying settlements to `recipient`. Admin only.
    pub fn add_token(
        &self,
        ctx: &mut CallContext<'_>,
        token: Address,
        recipient: Address,
    ) -> Result<(), SettlementError> {
        ownable::only_owner(ctx.state, self.address, ctx.caller)?;
        let change = ctx
            .state
            .registries
            .entry(self.address)
            .or_default()
            .insert(token, recipient)?;

        match change {
            RegistryChange::Added => {
                ctx.state
                    .emit(self.address, Event::TokenAccepted { token, recipient });
                tracing::info!(token = %token, recipient = %recipient, "Token accepted");
            }
            RegistryChange::Updated { previous } => {
                ctx.state.emit(
                    self.address,
                    Event::RecipientUpdated {
                        token,
                        previous,
                        recipient,
                    },
                );
                tracing::info!(
                    token = %token,
                    previous = %previous,
                    recipient = %recipient,
                    "Recipient updated"
                );
            }
            RegistryChange::Unchanged => {}
        }
        Ok(())
    }

    /// Stop accepting `token`. Admin only; removing an unknown token is a no-op.
    pub fn remove_token(
        &self,
        ctx: &mut CallContext<'_>,
        token: Address,
    ) -> Result<(), SettlementError> {
        ownable::only_owner(ctx.state, self.address, ctx.caller)?;
        let removed = ctx
            .state
            .registries
            .get_mut(&self.address)
            .and_then(|r| r.remove(&token));

        if removed.is_some() {
            ctx.state.emit(self.address, Event::TokenRemoved { token });
            tracing::info!(token = %token, "Token removed");
        }
        Ok(())
    }

    pub fn is_accepted(&self, state: &WorldState, token: Address) -> bool {
        self.registry(state)
            .is_some_and(|r| r.is_accepted(&token))
    }

    pub fn recipient_of(&self, state: &WorldState, token: Address) -> Option<Address> {
        self.registry(state).and_then(|r| r.recipient_of(&token))
    }

    /// Accepted tokens and their recipients, ordered by token.
    pub fn accepted_tokens(&self, state: &WorldState) -> Vec<(Address, Address)> {
        self.registry(state)
            .map(|r| r.entries().collect())
            .unwrap_or_default()
    }

    /// Pay `payment_amount` of `payment_token` held by the ledger to the
    /// token's recipient, then append the settlement record.
    ///
    /// The caller must already have moved `payment_amount` into the ledger.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn settle(
        &self,
        state: &mut WorldState,
        payer: Address,
        payment_token: Address,
        payment_amount: u128,
        source_token: Address,
        source_amount: u128,
        reference: B256,
    ) -> Result<SettlementRecord, SettlementError> {
        let recipient = self
            .recipient_of(state, payment_token)
            .ok_or(SettlementError::TokenNotAccepted(payment_token))?;

        state.transfer(payment_token, self.address, recipient, payment_amount)?;

        let record = SettlementRecord {
            recipient,
            payer,
            source_token,
            source_amount,
            payment_token,
            payment_amount,
            reference,
        };
        state.emit(self.address, Event::Settled(record.clone()));
        tracing::info!(
            payer = %payer,
            recipient = %recipient,
            payment_token = %payment_token,
            payment_amount,
            source_token = %source_token,
            source_amount,
            reference = %reference,
            "Payment settled"
        );
        Ok(record)
    }

    /// All settlement records appended by this ledger, oldest first.
    pub fn records(&self, state: &WorldState) -> Vec<SettlementRecord> {
        state
            .logs_from(self.address)
            .filter_map(|event| match event {
                Event::Settled(record) => Some(record.clone()),
                _ => None,
            })
            .collect()
    }

    /// Export the settlement records as JSON lines for indexers.
    pub fn export_records(&self, state: &WorldState) -> Result<String, SettlementError> {
        let mut out = String::new();
        for record in self.records(state) {
            out.push_str(&serde_json::to_string(&record)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl Ownable for SettlementLedger {
    fn address(&self) -> Address {
        self.address
    }
}
