//! Node credential minting and verification.
//!
//! A node credential is a single 128-bit secret, handed out in
//! cleartext exactly once and stored only as a SHA-256 verifier.
//! Verification compares hashes in constant time.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

pub const NODE_KEY_PREFIX: &str = "nk_";
pub const NODE_ID_PREFIX: &str = "nd_";

/// A freshly minted node credential cleartext.
///
/// This type is only ever produced by [`mint_node_key`]; no read path
/// can reconstruct one, which is what makes "returned exactly once"
/// checkable in the type system.
#[derive(Clone)]
pub struct IssuedNodeKey(String);

impl IssuedNodeKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IssuedNodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never leak the cleartext through Debug output.
        f.write_str("IssuedNodeKey(..)")
    }
}

/// Generate an opaque, URL-safe node identifier.
pub fn generate_node_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    format!("{NODE_ID_PREFIX}{}", hex::encode(bytes))
}

/// Mint a node credential: 128 bits of randomness, base64url-encoded
/// behind the `nk_` prefix. Returns the cleartext and the verifier to
/// store.
pub fn mint_node_key() -> (IssuedNodeKey, String) {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    let cleartext = format!("{NODE_KEY_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes));
    let verifier = hash_node_key(&cleartext);
    (IssuedNodeKey(cleartext), verifier)
}

/// SHA-256 hex of a node credential cleartext — the stored verifier.
pub fn hash_node_key(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time check of a presented credential against the stored
/// verifier.
pub fn verify_node_key(presented: &str, stored_hash: &str) -> bool {
    let computed = hash_node_key(presented);
    if computed.len() != stored_hash.len() {
        return false;
    }
    computed
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}
