//! Validation gate: pure, synchronous checks applied before a transfer is
//! ever dispatched to a chain adapter.

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::types::Token;

const MAX_SCALE: u32 = 18;

/// Runs the ordered rule set and returns the parsed [`Token`] on success
/// (callers need it to pick an adapter downstream).
pub fn validate_transfer(
    recipient: &str,
    amount: Decimal,
    token: &str,
) -> Result<Token, ValidationError> {
    if amount <= Decimal::ZERO || amount.scale() > MAX_SCALE {
        return Err(ValidationError::InvalidAmount);
    }

    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(ValidationError::MissingRecipient);
    }

    let parsed_token: Token = token
        .parse()
        .map_err(|_| ValidationError::UnsupportedToken(token.to_string()))?;

    if parsed_token.is_evm() {
        validate_evm_address(recipient)
            .map_err(|_| ValidationError::InvalidEvmAddress(recipient.to_string()))?;
    }
    // XRP / SOL recipients are intentionally not validated here; the
    // chain adapter checks format at submit time.

    Ok(parsed_token)
}

/// Validates a `0x`-prefixed 40-hex-char EVM address, enforcing EIP-55
/// checksum casing only when the address is mixed-case.
pub fn validate_evm_address(address: &str) -> Result<(), ()> {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return Err(());
    };
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(());
    }

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_alphabetic() || c.is_ascii_lowercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_alphabetic() || c.is_ascii_uppercase());
    if is_all_lower || is_all_upper {
        return Ok(());
    }

    if eip55_checksum(hex_part) == hex_part {
        Ok(())
    } else {
        Err(())
    }
}

/// Computes the EIP-55 checksummed casing of a lowercase (or mixed-case,
/// ignoring existing case) hex address body.
fn eip55_checksum(hex_part: &str) -> String {
    use sha3::{Digest, Keccak256};
    let lower = hex_part.to_ascii_lowercase();
    let hash = Keccak256::digest(lower.as_bytes());
    let hash_hex = hex::encode(hash);

    lower
        .chars()
        .zip(hash_hex.chars())
        .map(|(c, h)| {
            if c.is_ascii_alphabetic() && h.to_digit(16).unwrap_or(0) >= 8 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn accepts_lowercase_and_uppercase_evm_addresses() {
        assert!(validate_evm_address("0x52908400098527886e0f7030069857d2e4169ee7").is_err()); // too long
        assert!(validate_evm_address("0x52908400098527886e0f7030069857d2e4169e7").is_ok());
        assert!(validate_evm_address("0X52908400098527886E0F7030069857D2E4169E7".to_uppercase().as_str()).is_ok());
    }

    #[test]
    fn rejects_bad_checksum_mixed_case() {
        // valid checksum is 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed
        assert!(validate_evm_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_ok());
        assert!(validate_evm_address("0x5aaeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_err());
    }

    #[test]
    fn rejects_non_positive_or_overscaled_amount() {
        assert_eq!(
            validate_transfer("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed", Decimal::ZERO, "ETH"),
            Err(ValidationError::InvalidAmount)
        );
        let over_scale = Decimal::from_str("1.1234567890123456789").unwrap();
        assert_eq!(
            validate_transfer("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed", over_scale, "ETH"),
            Err(ValidationError::InvalidAmount)
        );
    }

    #[test]
    fn rejects_missing_recipient() {
        assert_eq!(
            validate_transfer("   ", Decimal::ONE, "ETH"),
            Err(ValidationError::MissingRecipient)
        );
    }

    #[test]
    fn rejects_unsupported_token() {
        assert!(matches!(
            validate_transfer("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed", Decimal::ONE, "DOGE"),
            Err(ValidationError::UnsupportedToken(_))
        ));
    }

    #[test]
    fn does_not_validate_xrp_or_sol_recipient_shape() {
        assert_eq!(
            validate_transfer("not-even-base58!", Decimal::ONE, "XRP"),
            Ok(Token::Xrp)
        );
        assert_eq!(
            validate_transfer("not-even-base58!", Decimal::ONE, "SOL"),
            Ok(Token::Sol)
        );
    }
}
