use payroute_core::{AdapterConfig, DeploymentConfig};
use std::sync::Arc;

use crate::adapters::{AggregatorAdapter, SettlerAdapter};
use crate::allowance_hub::SharedAllowance;
use crate::error::SettlementError;
use crate::host::Chain;
use crate::ledger::SettlementLedger;
use crate::router::PaymentRouter;
use crate::token::TokenKind;
use crate::traits::SwapExecutor;

/// Handles to a deployed set of engine contracts.
pub struct Deployment {
    pub ledger: Arc<SettlementLedger>,
    pub router: Arc<PaymentRouter>,
    pub shared_allowance: SharedAllowance,
    pub adapter: Option<Arc<dyn SwapExecutor>>,
}

impl Deployment {
    /// Deploy and wire the engine described by `config`.
    ///
    /// The adapter is installed and the initial tokens registered through
    /// ordinary administrator transactions.
    pub fn deploy(chain: &mut Chain, config: &DeploymentConfig) -> Result<Self, SettlementError> {
        config.validate()?;
        if config.chain.chain_id != chain.state().chain_id() {
            return Err(SettlementError::Config(payroute_core::CoreError::InvalidConfig(
                format!(
                    "chain id {} does not match host chain {}",
                    config.chain.chain_id,
                    chain.state().chain_id()
                ),
            )));
        }

        let contracts = &config.contracts;
        let state = chain.state_mut();
        let ledger = Arc::new(SettlementLedger::deploy(state, contracts.ledger, config.admin)?);
        let shared_allowance = SharedAllowance::deploy(state, contracts.shared_allowance)?;
        let router = Arc::new(PaymentRouter::deploy(
            state,
            contracts.router,
            config.admin,
            ledger.clone(),
            shared_allowance,
        )?);

        let adapter = match &config.adapter {
            Some(adapter_config) => {
                let wrapped = adapter_config.wrapped_native();
                if state.token_kind(wrapped) != Some(TokenKind::WrappedNative) {
                    return Err(SettlementError::UnknownToken(wrapped));
                }
                Some(build_adapter(adapter_config)?)
            }
            None => None,
        };

        if let Some(adapter) = &adapter {
            let adapter = Arc::clone(adapter);
            chain.execute(config.admin, router.address(), 0, |ctx| {
                router.set_swap_adapter(ctx, Some(adapter))
            })?;
        }

        for entry in &config.tokens {
            chain.execute(config.admin, ledger.address(), 0, |ctx| {
                ledger.add_token(ctx, entry.token, entry.recipient)
            })?;
        }

        tracing::info!(
            ledger = %ledger.address(),
            router = %router.address(),
            adapter = ?adapter.as_ref().map(|a| a.adapter_id().to_string()),
            tokens = config.tokens.len(),
            "Deployment complete"
        );

        Ok(Self {
            ledger,
            router,
            shared_allowance,
            adapter,
        })
    }
}

fn build_adapter(config: &AdapterConfig) -> Result<Arc<dyn SwapExecutor>, SettlementError> {
    Ok(match config {
        AdapterConfig::Aggregator {
            address,
            exchange,
            wrapped_native,
        } => Arc::new(AggregatorAdapter::new(*address, *exchange, *wrapped_native)?),
        AdapterConfig::Settler {
            address,
            directory,
            wrapped_native,
        } => Arc::new(SettlerAdapter::new(*address, *directory, *wrapped_native)?),
    })
}
