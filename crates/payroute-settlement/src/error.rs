use alloy_primitives::{Address, Bytes};
use payroute_core::CoreError;
use payroute_crypto::CryptoError;

/// Settlement-layer errors.
///
/// Any error returned from inside [`Chain::execute`](crate::host::Chain::execute)
/// rolls the whole transaction back.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("zero address: {0}")]
    ZeroAddress(&'static str),

    #[error("contract already deployed at {0}")]
    AlreadyDeployed(Address),

    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    #[error("token not accepted: {0}")]
    TokenNotAccepted(Address),

    #[error("unknown token: {0}")]
    UnknownToken(Address),

    #[error("invalid swap target: {0}")]
    InvalidSwapTarget(Address),

    #[error("not a contract: {0}")]
    NotAContract(Address),

    #[error("swap module not set")]
    SwapModuleNotSet,

    #[error("invalid routing payload: {0}")]
    InvalidPayload(String),

    #[error("input and output token are identical: {0}")]
    IdenticalTokens(Address),

    #[error("native input must use the native swap entry point")]
    InvalidNativeInput,

    #[error("native value mismatch: expected {expected}, sent {sent}")]
    NativeValueMismatch { expected: u128, sent: u128 },

    #[error("deadline expired: deadline {deadline}, now {now}")]
    DeadlineExpired { deadline: u64, now: u64 },

    #[error("insufficient output: expected at least {expected}, received {received}")]
    InsufficientOutput { expected: u128, received: u128 },

    #[error("insufficient input: spent {spent}, maximum {max}")]
    InsufficientInput { max: u128, spent: u128 },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("permit expired: deadline {deadline}, now {now}")]
    PermitExpired { deadline: u64, now: u64 },

    #[error("permit value mismatch: signed {signed}, requested {requested}")]
    PermitValueMismatch { signed: u128, requested: u128 },

    #[error("permit amount exceeded: permitted {permitted}, requested {requested}")]
    PermitAmountExceeded { permitted: u128, requested: u128 },

    #[error("invalid nonce: expected {expected}, provided {provided}")]
    InvalidNonce { expected: u64, provided: u64 },

    #[error("nonce already used: {0}")]
    NonceAlreadyUsed(u64),

    #[error("token does not support signed permits: {0}")]
    PermitUnsupported(Address),

    #[error("insufficient balance of {token}: available {available}, required {required}")]
    InsufficientBalance {
        token: Address,
        available: u128,
        required: u128,
    },

    #[error("insufficient allowance of {token}: available {available}, required {required}")]
    InsufficientAllowance {
        token: Address,
        available: u128,
        required: u128,
    },

    #[error("balance overflow of {token} for {account}")]
    BalanceOverflow { token: Address, account: Address },

    #[error("re-entrant call rejected")]
    Reentrancy,

    #[error("call depth exceeded")]
    CallDepthExceeded,

    #[error("exchange reverted: {0}")]
    ExchangeReverted(Bytes),

    #[error("configuration error: {0}")]
    Config(#[from] CoreError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
