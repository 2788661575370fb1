use alloy_primitives::Address;

/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Derive the 20-byte account address controlled by an Ed25519 public key.
///
/// The address is the last 20 bytes of `blake3(public_key)`.
pub fn derive_address(public_key: &[u8; 32]) -> Address {
    let digest = hash(public_key);
    Address::from_slice(&digest[12..])
}
