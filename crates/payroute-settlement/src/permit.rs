//! Signed permits and their EIP-712 digests.
//!
//! Owners sign the typed-data hash with their Ed25519 key. The owner address
//! is derived from the presented public key, so "recovering" a signer means
//! comparing that derived address with the named owner before verifying.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use payroute_crypto::{sign_digest, verify_digest, KeyPair, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::SettlementError;

sol! {
    /// Token-level permit.
    struct Permit {
        address owner;
        address spender;
        uint256 value;
        uint256 nonce;
        uint256 deadline;
    }

    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    /// Shared-allowance transfer authorization.
    struct PermitTransferFrom {
        TokenPermissions permitted;
        address spender;
        uint256 nonce;
        uint256 deadline;
    }
}

/// EIP-712 domain name of permit-capable tokens.
pub const TOKEN_DOMAIN_NAME: &str = "PayRoute Token";
/// EIP-712 domain name of the shared-allowance contract.
pub const SHARED_ALLOWANCE_DOMAIN_NAME: &str = "SharedAllowance";

/// The signed part of a permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitTerms {
    pub value: u128,
    pub nonce: u64,
    /// Last valid timestamp (inclusive).
    pub deadline: u64,
}

/// A permit as presented to the router.
///
/// Serializable so relayers can receive it from the owner as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPermit {
    pub value: u128,
    pub nonce: u64,
    pub deadline: u64,
    pub signer: PublicKey,
    pub signature: Signature,
}

impl SignedPermit {
    pub fn terms(&self) -> PermitTerms {
        PermitTerms {
            value: self.value,
            nonce: self.nonce,
            deadline: self.deadline,
        }
    }

    pub(crate) fn check_deadline(&self, now: u64) -> Result<(), SettlementError> {
        if self.deadline < now {
            return Err(SettlementError::PermitExpired {
                deadline: self.deadline,
                now,
            });
        }
        Ok(())
    }

    /// Check that the signer controls `owner` and signed `digest`.
    pub(crate) fn verify(&self, owner: Address, digest: &B256) -> Result<(), SettlementError> {
        if self.signer.address() != owner {
            return Err(SettlementError::InvalidSignature);
        }
        verify_digest(digest, &self.signature, &self.signer)
            .map_err(|_| SettlementError::InvalidSignature)
    }
}

fn token_domain(chain_id: u64, token: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(TOKEN_DOMAIN_NAME)),
        Some(Cow::Borrowed("1")),
        Some(U256::from(chain_id)),
        Some(token),
        None,
    )
}

fn shared_allowance_domain(chain_id: u64, hub: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(SHARED_ALLOWANCE_DOMAIN_NAME)),
        None,
        Some(U256::from(chain_id)),
        Some(hub),
        None,
    )
}

/// Digest an owner signs to grant `spender` an allowance on `token`.
pub fn token_permit_digest(
    chain_id: u64,
    token: Address,
    owner: Address,
    spender: Address,
    terms: &PermitTerms,
) -> B256 {
    let permit = Permit {
        owner,
        spender,
        value: U256::from(terms.value),
        nonce: U256::from(terms.nonce),
        deadline: U256::from(terms.deadline),
    };
    permit.eip712_signing_hash(&token_domain(chain_id, token))
}

/// Digest an owner signs to let `spender` pull `token` through the
/// shared-allowance contract at `hub`.
pub fn transfer_permit_digest(
    chain_id: u64,
    hub: Address,
    token: Address,
    spender: Address,
    terms: &PermitTerms,
) -> B256 {
    let permit = PermitTransferFrom {
        permitted: TokenPermissions {
            token,
            amount: U256::from(terms.value),
        },
        spender,
        nonce: U256::from(terms.nonce),
        deadline: U256::from(terms.deadline),
    };
    permit.eip712_signing_hash(&shared_allowance_domain(chain_id, hub))
}

fn signed(keypair: &KeyPair, digest: B256, terms: PermitTerms) -> SignedPermit {
    SignedPermit {
        value: terms.value,
        nonce: terms.nonce,
        deadline: terms.deadline,
        signer: keypair.public_key(),
        signature: sign_digest(&digest, keypair),
    }
}

/// Sign a token permit for `spender` as the owner controlled by `keypair`.
pub fn sign_token_permit(
    keypair: &KeyPair,
    chain_id: u64,
    token: Address,
    spender: Address,
    terms: PermitTerms,
) -> SignedPermit {
    let digest = token_permit_digest(chain_id, token, keypair.address(), spender, &terms);
    signed(keypair, digest, terms)
}

/// Sign a shared-allowance transfer permit.
pub fn sign_transfer_permit(
    keypair: &KeyPair,
    chain_id: u64,
    hub: Address,
    token: Address,
    spender: Address,
    terms: PermitTerms,
) -> SignedPermit {
    let digest = transfer_permit_digest(chain_id, hub, token, spender, &terms);
    signed(keypair, digest, terms)
}
