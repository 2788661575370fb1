//! Integration test: swap payments through the aggregator adapter.
//!
//! The mock exchange fills at 5 USD per 2 input units. Every successful swap
//! must leave the adapter and the router holding nothing.

use alloy_primitives::{Bytes, B256};
use payroute_core::NATIVE_TOKEN;
use payroute_integration_tests::*;
use payroute_settlement::testing::ExchangeMode;
use payroute_settlement::{Event, SettlementError};

fn assert_no_custody(h: &Harness) {
    for token in [SOURCE, PLAIN, USD, WNATIVE, NATIVE_TOKEN] {
        assert_eq!(h.balance(token, ADAPTER), 0, "adapter holds {token}");
        assert_eq!(h.balance(token, ROUTER), 0, "router holds {token}");
        assert_eq!(h.balance(token, LEDGER), 0, "ledger holds {token}");
    }
    assert!(!h.chain.state().is_locked(ROUTER));
}

// =========================================================================
// Pre-approved swaps
// =========================================================================

#[test]
fn test_exact_output_swap_refunds_unspent_input() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(SOURCE, payer, ROUTER, 1_000);
    let order = h.exact_output_order(SOURCE, 500, 1_000);

    let router = h.router();
    let record = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| {
            router.pay_with_swap(ctx, &order, reference("order-42"))
        })
        .expect("exact-output swap should settle");

    assert_eq!(h.balance(USD, RECIPIENT), 500);
    assert_eq!(h.balance(SOURCE, payer), FUNDING - 200);
    assert_eq!(h.balance(SOURCE, EXCHANGE), 200);
    assert_eq!(record.payer, payer);
    assert_eq!(record.source_token, SOURCE);
    assert_eq!(record.source_amount, 200);
    assert_eq!(record.payment_token, USD);
    assert_eq!(record.payment_amount, 500);
    assert_no_custody(&h);
}

#[test]
fn test_exact_input_swap_settles_everything_received() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = h.exact_input_order(PLAIN, 200, 400);

    let router = h.router();
    let record = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO))
        .expect("exact-input swap should settle");

    assert_eq!(record.source_amount, 200);
    assert_eq!(record.payment_amount, 500);
    assert_eq!(h.balance(USD, RECIPIENT), 500);
    assert_eq!(h.balance(PLAIN, payer), FUNDING - 200);
    assert_no_custody(&h);

    let swapped = h
        .chain
        .state()
        .logs_from(ADAPTER)
        .find(|e| matches!(e, Event::Swapped { .. }))
        .cloned();
    assert!(matches!(
        swapped,
        Some(Event::Swapped { input_amount_spent: 200, output_amount_received: 500, to, refund_to, .. })
            if to == LEDGER && refund_to == payer
    ));
}

#[test]
fn test_deadline_equal_to_now_is_valid() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 20);
    let order = exact_input_order_at(PLAIN, 20, 50, h.now());

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));
    assert!(result.is_ok());
}

#[test]
fn test_expired_deadline_fails_before_exchange_call() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = exact_input_order_at(PLAIN, 200, 400, h.now() - 1);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));

    assert!(matches!(result, Err(SettlementError::DeadlineExpired { .. })));
    assert_eq!(h.balance(PLAIN, EXCHANGE), 0);
    assert_eq!(h.chain.state().allowance(PLAIN, payer, ROUTER), 200);
}

#[test]
fn test_unlisted_target_rejected_before_approval() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = retarget(&h.exact_input_order(PLAIN, 200, 400), EXCHANGE_V2);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));

    assert!(matches!(
        result,
        Err(SettlementError::InvalidSwapTarget(t)) if t == EXCHANGE_V2
    ));
    let state = h.chain.state();
    assert_eq!(state.allowance(PLAIN, ADAPTER, EXCHANGE_V2), 0);
    assert_eq!(state.allowance(PLAIN, ADAPTER, EXCHANGE), 0);
    assert_eq!(h.balance(PLAIN, payer), FUNDING);
    assert_eq!(h.balance(USD, EXCHANGE_V2), FUNDING);
}

#[test]
fn test_malformed_payload_rejected() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let mut order = h.exact_input_order(PLAIN, 200, 400);
    order.payload = Bytes::from_static(&[0xde, 0xad]);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));
    assert!(matches!(result, Err(SettlementError::InvalidPayload(_))));
}

#[test]
fn test_swap_without_adapter() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let router = h.router();
    h.chain
        .execute(ADMIN, ROUTER, 0, |ctx| router.set_swap_adapter(ctx, None))
        .expect("admin may remove the adapter");

    h.approve(PLAIN, payer, ROUTER, 200);
    let order = h.exact_input_order(PLAIN, 200, 400);
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));
    assert!(matches!(result, Err(SettlementError::SwapModuleNotSet)));
}

#[test]
fn test_native_order_rejected_on_token_path() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let order = h.exact_output_order(NATIVE_TOKEN, 500, 1_000);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));
    assert!(matches!(result, Err(SettlementError::InvalidNativeInput)));
}

// =========================================================================
// Adversarial exchanges
// =========================================================================

#[test]
fn test_misreported_output_ignored() {
    let mut h = Harness::with_exchange(ExchangeMode::MisreportOutput);
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = h.exact_input_order(PLAIN, 200, 400);

    let router = h.router();
    let record = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO))
        .expect("balance deltas decide the outcome");

    assert_eq!(record.payment_amount, 500);
    assert_eq!(h.balance(USD, RECIPIENT), 500);
    assert_no_custody(&h);
}

#[test]
fn test_short_changed_output_reverts() {
    let mut h = Harness::with_exchange(ExchangeMode::ShortChange);
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = h.exact_input_order(PLAIN, 200, 400);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));

    assert!(matches!(
        result,
        Err(SettlementError::InsufficientOutput { expected: 400, received: 250 })
    ));
    assert_eq!(h.balance(PLAIN, payer), FUNDING);
    assert_eq!(h.balance(USD, EXCHANGE), FUNDING);
    assert_no_custody(&h);
}

#[test]
fn test_exchange_revert_propagates() {
    let reason = Bytes::from_static(b"pool paused");
    let mut h = Harness::with_exchange(ExchangeMode::Revert(reason.clone()));
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = h.exact_input_order(PLAIN, 200, 400);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));

    assert!(matches!(result, Err(SettlementError::ExchangeReverted(data)) if data == reason));
    assert_eq!(h.balance(PLAIN, payer), FUNDING);
    assert!(h.ledger().records(h.chain.state()).is_empty());
}

#[test]
fn test_reentrant_exchange_rejected() {
    let mut h = Harness::build(AdapterKind::Aggregator, |deployment| ExchangeMode::Reenter {
        router: deployment.router.clone(),
        order: exact_input_order_at(PLAIN, 1, 0, GENESIS_TIME),
    });
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 200);
    let order = h.exact_input_order(PLAIN, 200, 400);

    let router = h.router();
    let result = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| router.pay_with_swap(ctx, &order, B256::ZERO));

    assert!(matches!(result, Err(SettlementError::Reentrancy)));
    assert_eq!(h.balance(PLAIN, payer), FUNDING);
    assert_no_custody(&h);
}

// =========================================================================
// Signed and relayed swaps
// =========================================================================

#[test]
fn test_swap_with_permit() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 1_000);
    let order = h.exact_output_order(SOURCE, 500, 1_000);

    let router = h.router();
    h.chain
        .execute(payer, ROUTER, 0, |ctx| {
            router.pay_with_swap_permit(ctx, &order, B256::ZERO, permit)
        })
        .expect("permit swap should settle");

    assert_eq!(h.balance(SOURCE, payer), FUNDING - 200);
    assert_eq!(h.chain.state().nonce_of(SOURCE, payer), 1);
    assert_no_custody(&h);
}

#[test]
fn test_relayed_swap_refunds_owner() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 1_000);
    let order = h.exact_output_order(SOURCE, 500, 1_000);

    let router = h.router();
    let record = h
        .chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_with_swap_on_behalf(ctx, owner, &order, reference("relay"), permit)
        })
        .expect("relayed swap should settle");

    assert_eq!(record.payer, owner);
    assert_eq!(h.balance(SOURCE, owner), FUNDING - 200);
    assert_eq!(h.balance(SOURCE, RELAYER), 0);
    assert_eq!(h.balance(USD, RELAYER), 0);
    assert_no_custody(&h);
}

#[test]
fn test_relayed_swap_with_fallback_allowance() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    h.approve_hub(PLAIN, owner);
    let permit = h.transfer_permit(&h.payer, PLAIN, 1_000, 0);
    let order = h.exact_output_order(PLAIN, 500, 1_000);

    let router = h.router();
    h.chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_with_swap_on_behalf(ctx, owner, &order, B256::ZERO, permit)
        })
        .expect("fallback swap should settle");

    assert_eq!(h.balance(PLAIN, owner), FUNDING - 200);
    assert_eq!(h.balance(USD, RECIPIENT), 500);
    assert_no_custody(&h);
}

// =========================================================================
// Native input
// =========================================================================

#[test]
fn test_native_swap_refunds_native() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let order = h.exact_output_order(NATIVE_TOKEN, 500, 1_000);

    let router = h.router();
    let record = h
        .chain
        .execute(payer, ROUTER, 1_000, |ctx| {
            router.pay_with_native_swap(ctx, &order, reference("native"))
        })
        .expect("native swap should settle");

    assert_eq!(record.source_token, NATIVE_TOKEN);
    assert_eq!(record.source_amount, 200);
    assert_eq!(record.payment_amount, 500);
    assert_eq!(h.balance(NATIVE_TOKEN, payer), FUNDING - 200);
    assert_eq!(h.balance(WNATIVE, EXCHANGE), 200);
    assert_eq!(h.balance(USD, RECIPIENT), 500);
    assert_no_custody(&h);
}

#[test]
fn test_native_swap_value_mismatch() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let order = h.exact_output_order(NATIVE_TOKEN, 500, 1_000);

    let router = h.router();
    let result = h.chain.execute(payer, ROUTER, 999, |ctx| {
        router.pay_with_native_swap(ctx, &order, B256::ZERO)
    });

    assert!(matches!(
        result,
        Err(SettlementError::NativeValueMismatch { expected: 1_000, sent: 999 })
    ));
    assert_eq!(h.balance(NATIVE_TOKEN, payer), FUNDING);
}

#[test]
fn test_token_order_rejected_on_native_path() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let order = h.exact_input_order(PLAIN, 200, 400);

    let router = h.router();
    let result = h.chain.execute(payer, ROUTER, 200, |ctx| {
        router.pay_with_native_swap(ctx, &order, B256::ZERO)
    });

    assert!(matches!(result, Err(SettlementError::InvalidNativeInput)));
    assert_eq!(h.balance(NATIVE_TOKEN, payer), FUNDING);
}
