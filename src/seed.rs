//! XRP seed codec.
//!
//! Pure, synchronous parsing for the XRP seed formats this system has ever
//! persisted, including two legacy-corruption shapes that must be rejected
//! with an actionable `REGENERATE_WALLET` error rather than panicking or
//! silently misparsing.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::SeedError;

/// Ripple's base58 alphabet differs from Bitcoin's; `bs58` ships it built in.
fn ripple_alphabet() -> &'static bs58::Alphabet {
    bs58::Alphabet::RIPPLE
}

const FAMILY_SEED_VERSION: u8 = 0x21;

/// 16 bytes of ED25519 seed entropy, the unit every accepted format decodes to.
pub type SeedEntropy = [u8; 16];

fn double_sha256_checksum(payload: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut checksum = [0u8; 4];
    checksum.copy_from_slice(&second[..4]);
    checksum
}

/// Encodes 16 bytes of entropy as an XRPL family seed string (`sEd...`-style,
/// base58-check over the Ripple alphabet).
pub fn encode(entropy: &SeedEntropy) -> String {
    let mut payload = Vec::with_capacity(1 + 16 + 4);
    payload.push(FAMILY_SEED_VERSION);
    payload.extend_from_slice(entropy);
    let checksum = double_sha256_checksum(&payload);
    payload.extend_from_slice(&checksum);
    bs58::encode(payload).with_alphabet(ripple_alphabet()).into_string()
}

/// Decodes an XRPL family seed string back to its 16 bytes of entropy,
/// verifying the version byte and checksum.
fn decode_family_seed(s: &str) -> Result<SeedEntropy, SeedError> {
    let bytes = bs58::decode(s)
        .with_alphabet(ripple_alphabet())
        .into_vec()
        .map_err(|e| SeedError::UnsupportedFormat(format!("invalid base58: {e}")))?;
    if bytes.len() != 21 {
        return Err(SeedError::UnsupportedFormat(format!(
            "expected 21 decoded bytes (1 version + 16 entropy + 4 checksum), got {}",
            bytes.len()
        )));
    }
    let (payload, checksum) = bytes.split_at(17);
    if payload[0] != FAMILY_SEED_VERSION {
        return Err(SeedError::UnsupportedFormat(format!(
            "unexpected seed version byte 0x{:02x}",
            payload[0]
        )));
    }
    let expected = double_sha256_checksum(payload);
    if expected != checksum {
        return Err(SeedError::UnsupportedFormat(
            "seed checksum mismatch".to_string(),
        ));
    }
    let mut entropy = [0u8; 16];
    entropy.copy_from_slice(&payload[1..]);
    Ok(entropy)
}

/// Decodes a raw 32-character hex string into 16 bytes of ED25519 entropy.
fn decode_hex_entropy(s: &str) -> Result<SeedEntropy, SeedError> {
    let bytes = hex::decode(s)
        .map_err(|e| SeedError::UnsupportedFormat(format!("invalid hex: {e}")))?;
    let entropy: SeedEntropy = bytes
        .try_into()
        .map_err(|_| SeedError::UnsupportedFormat("hex seed must decode to 16 bytes".into()))?;
    Ok(entropy)
}

/// Parses a stored seed string of any accepted or rejected legacy shape.
///
/// | shape | outcome |
/// |---|---|
/// | base58 body starting with `s` | decoded as an XRPL family seed |
/// | 32 hex chars | decoded as raw entropy |
/// | starts with `r` | legacy bug: an address was stored where a seed belonged |
/// | starts with `Seed{` | corrupted `Debug` output of a seed struct |
/// | anything else | unsupported format |
pub fn decode(s: &str) -> Result<SeedEntropy, SeedError> {
    if s.starts_with('r') {
        return Err(SeedError::RegenerateWallet(
            "stored value looks like an XRP address, not a seed; the wallet must be regenerated"
                .to_string(),
        ));
    }
    if s.starts_with("Seed{") {
        return Err(SeedError::RegenerateWallet(
            "stored value is a corrupted debug dump of a seed; the wallet must be regenerated"
                .to_string(),
        ));
    }
    if s.starts_with('s') {
        return decode_family_seed(s);
    }
    if s.len() == 32 && s.chars().all(|c| c.is_ascii_hexdigit()) {
        return decode_hex_entropy(s);
    }
    Err(SeedError::UnsupportedFormat(format!(
        "'{s}' does not match any recognized seed shape"
    )))
}

/// Generates fresh entropy from the process CSPRNG and its family-seed
/// encoding, for newly minted XRP credentials and for regeneration.
pub fn generate() -> (SeedEntropy, String) {
    let mut entropy = [0u8; 16];
    rand::rng().fill_bytes(&mut entropy);
    let encoded = encode(&entropy);
    (entropy, encoded)
}

/// The 32-hex representation persisted as `User.xrpSeedHex`.
pub fn entropy_to_hex(entropy: &SeedEntropy) -> String {
    hex::encode(entropy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_freshly_generated_seed() {
        for _ in 0..50 {
            let (entropy, encoded) = generate();
            assert_eq!(decode(&encoded).unwrap(), entropy);
        }
    }

    #[test]
    fn round_trips_hex_entropy() {
        let hex_seed = "00112233445566778899aabbccddeeff".to_string();
        assert_eq!(hex_seed.len(), 32);
        let decoded = decode(&hex_seed).unwrap();
        assert_eq!(entropy_to_hex(&decoded), hex_seed);
    }

    #[test]
    fn rejects_address_stored_as_seed() {
        let err = decode("rEx4LtH6Jfz7gQHpFQFYpMjcHpMUyHcB1C").unwrap_err();
        assert!(matches!(err, SeedError::RegenerateWallet(_)));
    }

    #[test]
    fn rejects_corrupted_debug_dump() {
        let err = decode("Seed{value=[redacted], destroyed=false}").unwrap_err();
        assert!(matches!(err, SeedError::RegenerateWallet(_)));
    }

    #[test]
    fn rejects_unknown_shape() {
        let err = decode("not-a-seed-at-all!!").unwrap_err();
        assert!(matches!(err, SeedError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_tampered_checksum() {
        let (_, mut encoded) = generate();
        encoded.pop();
        encoded.push(if encoded.ends_with('1') { '2' } else { '1' });
        assert!(decode(&encoded).is_err());
    }
}
