//! Integration test: direct payments through every authorization path.
//!
//! Funds move from the named owner straight into the ledger, which pays the
//! registered recipient and appends a settlement record.

use alloy_primitives::{Address, B256};
use payroute_core::NATIVE_TOKEN;
use payroute_crypto::KeyPair;
use payroute_integration_tests::*;
use payroute_settlement::{Event, SettlementError, SettlementRecord, TokenKind};

fn attacker() -> KeyPair {
    KeyPair::from_seed(&[0x66; 32])
}

// =========================================================================
// Direct (pre-approved) payments
// =========================================================================

#[test]
fn test_direct_payment_settles_to_recipient() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 1_000);
    let reference = reference("invoice-1001");

    let record = h
        .pay_direct(PLAIN, 1_000, reference)
        .expect("direct payment should settle");

    assert_eq!(
        record,
        SettlementRecord {
            recipient: RECIPIENT,
            payer,
            source_token: PLAIN,
            source_amount: 1_000,
            payment_token: PLAIN,
            payment_amount: 1_000,
            reference,
        }
    );
    assert_eq!(h.balance(PLAIN, RECIPIENT), 1_000);
    assert_eq!(h.balance(PLAIN, payer), FUNDING - 1_000);
    assert_eq!(h.balance(PLAIN, LEDGER), 0);
    assert_eq!(h.balance(PLAIN, ROUTER), 0);

    let state = h.chain.state();
    assert_eq!(h.ledger().records(state), vec![record.clone()]);
    assert_eq!(
        state.logs_from(LEDGER).last(),
        Some(&Event::Settled(record))
    );
}

#[test]
fn test_zero_amount_payment_is_a_noop() {
    let mut h = Harness::new();
    let payer = h.payer.address();

    let record = h
        .pay_direct(PLAIN, 0, reference("empty"))
        .expect("zero-amount payment should succeed");

    assert_eq!(record.payment_amount, 0);
    assert_eq!(h.balance(PLAIN, payer), FUNDING);
    assert_eq!(h.balance(PLAIN, RECIPIENT), 0);
}

#[test]
fn test_direct_payment_never_spends_victim_allowance() {
    let mut h = Harness::new();
    let victim = h.payer.address();
    let attacker = attacker().address();
    h.approve(PLAIN, victim, ROUTER, u128::MAX);

    let router = h.router();
    let result = h.chain.execute(attacker, ROUTER, 0, |ctx| {
        router.pay(ctx, PLAIN, 1_000, reference("steal"))
    });

    assert!(matches!(
        result,
        Err(SettlementError::InsufficientAllowance { .. })
    ));
    assert_eq!(h.balance(PLAIN, victim), FUNDING);
    assert!(h.ledger().records(h.chain.state()).is_empty());
}

#[test]
fn test_insufficient_allowance_rolls_back() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 999);

    let result = h.pay_direct(PLAIN, 1_000, reference("short"));

    assert!(matches!(
        result,
        Err(SettlementError::InsufficientAllowance { available: 999, required: 1_000, .. })
    ));
    assert_eq!(h.chain.state().allowance(PLAIN, payer, ROUTER), 999);
}

#[test]
fn test_unaccepted_token_rejected_without_residue() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let other = Address::repeat_byte(0x0F);
    let state = h.chain.state_mut();
    must(state.create_token(other, TokenKind::Basic));
    must(state.mint(other, payer, 100));
    h.approve(other, payer, ROUTER, 100);

    let result = h.pay_direct(other, 100, reference("unknown"));

    assert!(matches!(result, Err(SettlementError::TokenNotAccepted(t)) if t == other));
    assert_eq!(h.balance(other, payer), 100);
    assert_eq!(h.balance(other, LEDGER), 0);
}

#[test]
fn test_attached_value_rejected() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 10);

    let router = h.router();
    let result = h.chain.execute(payer, ROUTER, 5, |ctx| {
        router.pay(ctx, PLAIN, 10, B256::ZERO)
    });

    assert!(matches!(
        result,
        Err(SettlementError::NativeValueMismatch { expected: 0, sent: 5 })
    ));
    assert_eq!(h.balance(NATIVE_TOKEN, payer), FUNDING);
    assert_eq!(h.balance(NATIVE_TOKEN, ROUTER), 0);
}

// =========================================================================
// Signed and relayed payments
// =========================================================================

#[test]
fn test_pay_with_token_permit() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 400);

    let router = h.router();
    let record = h
        .chain
        .execute(payer, ROUTER, 0, |ctx| {
            router.pay_with_permit(ctx, SOURCE, 400, reference("permit"), permit)
        })
        .expect("permit payment should settle");

    assert_eq!(record.payer, payer);
    assert_eq!(h.balance(SOURCE, RECIPIENT), 400);
    assert_eq!(h.chain.state().nonce_of(SOURCE, payer), 1);
    assert_eq!(h.chain.state().allowance(SOURCE, payer, ROUTER), 0);
}

#[test]
fn test_expired_permit_rejected() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 400);
    h.chain.advance(1);

    let router = h.router();
    let result = h.chain.execute(payer, ROUTER, 0, |ctx| {
        router.pay_with_permit(ctx, SOURCE, 400, B256::ZERO, permit)
    });

    assert!(matches!(result, Err(SettlementError::PermitExpired { .. })));
    assert_eq!(h.chain.state().nonce_of(SOURCE, payer), 0);
}

#[test]
fn test_relayed_payment_names_owner() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 250);

    let router = h.router();
    let record = h
        .chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_on_behalf(ctx, owner, SOURCE, 250, reference("relayed"), permit)
        })
        .expect("relayed payment should settle");

    assert_eq!(record.payer, owner);
    assert_eq!(h.balance(SOURCE, owner), FUNDING - 250);
    assert_eq!(h.balance(SOURCE, RELAYER), 0);
}

#[test]
fn test_forged_signature_leaves_owner_untouched() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    let attacker = attacker();
    // Attacker signs terms naming the victim's current nonce.
    let forged = h.token_permit(&attacker, SOURCE, 500);

    let router = h.router();
    let result = h.chain.execute(attacker.address(), ROUTER, 0, |ctx| {
        router.pay_on_behalf(ctx, owner, SOURCE, 500, reference("forged"), forged)
    });

    assert!(matches!(result, Err(SettlementError::InvalidSignature)));
    assert_eq!(h.balance(SOURCE, owner), FUNDING);
    assert!(h.ledger().records(h.chain.state()).is_empty());
}

#[test]
fn test_replayed_permit_rejected() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 300);
    let replay = permit.clone();
    let other_relayer = Address::repeat_byte(0x5F);

    let router = h.router();
    h.chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_on_behalf(ctx, owner, SOURCE, 300, reference("first"), permit)
        })
        .expect("first payment should settle");

    let result = h.chain.execute(other_relayer, ROUTER, 0, |ctx| {
        router.pay_on_behalf(ctx, owner, SOURCE, 300, reference("second"), replay)
    });

    assert!(matches!(
        result,
        Err(SettlementError::InvalidNonce { expected: 1, provided: 0 })
    ));
    assert_eq!(h.balance(SOURCE, owner), FUNDING - 300);
    assert_eq!(h.balance(SOURCE, RECIPIENT), 300);
    let records = h.ledger().records(h.chain.state());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].reference, reference("first"));
}

#[test]
fn test_permit_value_must_match_amount() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    let permit = h.token_permit(&h.payer, SOURCE, 400);

    let router = h.router();
    let result = h.chain.execute(payer, ROUTER, 0, |ctx| {
        router.pay_with_permit(ctx, SOURCE, 300, B256::ZERO, permit)
    });

    assert!(matches!(
        result,
        Err(SettlementError::PermitValueMismatch { signed: 400, requested: 300 })
    ));
}

// =========================================================================
// Shared-allowance fallback for tokens without permit support
// =========================================================================

#[test]
fn test_fallback_allowance_for_plain_token() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    h.approve_hub(PLAIN, owner);
    let permit = h.transfer_permit(&h.payer, PLAIN, 500, 7);

    let router = h.router();
    let record = h
        .chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_on_behalf(ctx, owner, PLAIN, 500, reference("fallback"), permit)
        })
        .expect("fallback payment should settle");

    assert_eq!(record.payer, owner);
    assert_eq!(h.balance(PLAIN, RECIPIENT), 500);
    assert!(h.deployment.shared_allowance.is_nonce_used(h.chain.state(), owner, 7));
}

#[test]
fn test_fallback_allowance_self_signed() {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve_hub(PLAIN, payer);
    // Requesting less than the signed ceiling is allowed.
    let permit = h.transfer_permit(&h.payer, PLAIN, 500, 1);

    let router = h.router();
    h.chain
        .execute(payer, ROUTER, 0, |ctx| {
            router.pay_with_permit(ctx, PLAIN, 200, reference("partial"), permit)
        })
        .expect("partial fallback payment should settle");

    assert_eq!(h.balance(PLAIN, payer), FUNDING - 200);
}

#[test]
fn test_fallback_allowance_limits() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    h.approve_hub(PLAIN, owner);
    let permit = h.transfer_permit(&h.payer, PLAIN, 500, 3);
    let replay = permit.clone();
    let router = h.router();

    let exceeded = h.chain.execute(RELAYER, ROUTER, 0, |ctx| {
        router.pay_on_behalf(ctx, owner, PLAIN, 501, B256::ZERO, permit.clone())
    });
    assert!(matches!(
        exceeded,
        Err(SettlementError::PermitAmountExceeded { permitted: 500, requested: 501 })
    ));

    h.chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_on_behalf(ctx, owner, PLAIN, 500, B256::ZERO, permit)
        })
        .expect("payment within the ceiling should settle");

    let replayed = h.chain.execute(RELAYER, ROUTER, 0, |ctx| {
        router.pay_on_behalf(ctx, owner, PLAIN, 500, B256::ZERO, replay)
    });
    assert!(matches!(replayed, Err(SettlementError::NonceAlreadyUsed(3))));
    assert_eq!(h.balance(PLAIN, owner), FUNDING - 500);
}

#[test]
fn test_relayer_cannot_redeem_router_permit_at_hub() {
    let mut h = Harness::new();
    let owner = h.payer.address();
    h.approve_hub(PLAIN, owner);
    let permit = h.transfer_permit(&h.payer, PLAIN, 500, 9);
    let hub = h.deployment.shared_allowance;

    let result = h.chain.execute(RELAYER, HUB, 0, |ctx| {
        hub.permit_transfer_from(ctx, owner, PLAIN, 500, RELAYER, &permit)
    });

    assert!(matches!(result, Err(SettlementError::InvalidSignature)));
    assert_eq!(h.balance(PLAIN, RELAYER), 0);
    assert_eq!(h.balance(PLAIN, owner), FUNDING);
    assert!(!hub.is_nonce_used(h.chain.state(), owner, 9));

    // The same permit still settles when the router redeems it.
    let router = h.router();
    h.chain
        .execute(RELAYER, ROUTER, 0, |ctx| {
            router.pay_on_behalf(ctx, owner, PLAIN, 500, reference("hub-guard"), permit)
        })
        .expect("router should redeem its own permit");
    assert_eq!(h.balance(PLAIN, RECIPIENT), 500);
}

// =========================================================================
// Reconciliation export
// =========================================================================

#[test]
fn test_export_records_as_json_lines() -> anyhow::Result<()> {
    let mut h = Harness::new();
    let payer = h.payer.address();
    h.approve(PLAIN, payer, ROUTER, 300);
    h.pay_direct(PLAIN, 100, reference("a"))?;
    h.pay_direct(PLAIN, 200, reference("b"))?;

    let exported = h.ledger().export_records(h.chain.state())?;
    let parsed = exported
        .lines()
        .map(serde_json::from_str::<SettlementRecord>)
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].payment_amount, 100);
    assert_eq!(parsed[1].reference, reference("b"));
    assert!(parsed.iter().all(|r| r.payer == payer));
    Ok(())
}
