//! Routing payload codec.
//!
//! The quoting service hands adapters `abi.encode(bytes rawCall, address target)`.

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol_data, SolType};

use crate::error::SettlementError;

type RoutingPayload = (sol_data::Bytes, sol_data::Address);

/// Decode a routing payload into the raw exchange call and its target.
pub fn decode(payload: &[u8]) -> Result<(Bytes, Address), SettlementError> {
    RoutingPayload::abi_decode_params(payload)
        .map_err(|e| SettlementError::InvalidPayload(e.to_string()))
}

/// Encode a routing payload.
pub fn encode(raw_call: &Bytes, target: Address) -> Bytes {
    RoutingPayload::abi_encode_params(&(raw_call.clone(), target)).into()
}
