//! XRP Ledger chain adapter: ed25519-signed payments submitted over the
//! rippled JSON-RPC API.
//!
//! No XRPL crate exists anywhere in this dependency stack, so account
//! derivation, transaction serialization and signing are all assembled
//! from the same primitives other wallet crates in this ecosystem reach
//! for: `ed25519-dalek` for signing, `sha2`/`ripemd` for the address hash
//! and signing-hash, `bs58` for base58check over the Ripple alphabet (see
//! [`crate::seed`]). The binary codec below only covers the single field
//! set a plain `Payment` transaction needs — not the general STObject
//! format.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use ripemd::Ripemd160;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};
use sha2::{Digest, Sha256, Sha512};

use crate::chain::{ChainAdapter, GeneratedKeypair, Receipt};
use crate::error::ChainError;
use crate::seed;
use crate::types::{Network, Token};

const ACCOUNT_ID_VERSION: u8 = 0x00;
const DROPS_PER_XRP: u64 = 1_000_000;
const ED25519_PREFIX: u8 = 0xED;
const PAYMENT_TRANSACTION_TYPE: u16 = 0;
/// `STX\0` — rippled's single-signing prefix, prepended before hashing.
const SINGLE_SIGN_PREFIX: [u8; 4] = [0x53, 0x54, 0x58, 0x00];
/// High bit marks "native XRP, positive" in the 64-bit Amount encoding.
const NATIVE_POSITIVE_FLAG: u64 = 0x4000_0000_0000_0000;

fn network_error(message: impl Into<String>) -> ChainError {
    ChainError::Network {
        network: Network::Xrp,
        message: message.into(),
    }
}

fn double_sha256_checksum(payload: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut checksum = [0u8; 4];
    checksum.copy_from_slice(&second[..4]);
    checksum
}

fn account_id_from_verifying_key(verifying_key: &VerifyingKey) -> [u8; 20] {
    let mut prefixed = Vec::with_capacity(33);
    prefixed.push(ED25519_PREFIX);
    prefixed.extend_from_slice(verifying_key.as_bytes());
    let sha = Sha256::digest(&prefixed);
    let ripemd = Ripemd160::digest(sha);
    let mut account_id = [0u8; 20];
    account_id.copy_from_slice(&ripemd);
    account_id
}

fn encode_account_address(account_id: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(ACCOUNT_ID_VERSION);
    payload.extend_from_slice(account_id);
    let checksum = double_sha256_checksum(&payload);
    payload.extend_from_slice(&checksum);
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_string()
}

/// Derives the classic `r...` account address from an ed25519 public key.
fn derive_address(verifying_key: &VerifyingKey) -> String {
    encode_account_address(&account_id_from_verifying_key(verifying_key))
}

fn decode_account_address(address: &str) -> Result<[u8; 20], ChainError> {
    let bytes = bs58::decode(address)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_vec()
        .map_err(|e| network_error(format!("invalid XRP address {address}: {e}")))?;
    if bytes.len() != 21 {
        return Err(network_error(format!(
            "XRP address {address} decoded to {} bytes, expected 21",
            bytes.len()
        )));
    }
    let (payload, checksum) = bytes.split_at(17);
    if payload[0] != ACCOUNT_ID_VERSION {
        return Err(network_error(format!(
            "XRP address {address} has unexpected version byte 0x{:02x}",
            payload[0]
        )));
    }
    if double_sha256_checksum(payload) != checksum {
        return Err(network_error(format!(
            "XRP address {address} failed checksum verification"
        )));
    }
    let mut account_id = [0u8; 20];
    account_id.copy_from_slice(&payload[1..]);
    Ok(account_id)
}

/// Derives the ed25519 signing key from 16 bytes of seed entropy the way
/// rippled does for ed25519 accounts: `SHA512Half(seed || 0x00000000)`
/// taken directly as the signing key, with no further hardened-path
/// derivation (unlike the secp256k1 scheme, ed25519 accounts have no
/// separate root/account keypair split).
fn derive_signing_key(entropy: &[u8; 16]) -> SigningKey {
    let mut input = Vec::with_capacity(20);
    input.extend_from_slice(entropy);
    input.extend_from_slice(&[0, 0, 0, 0]);
    let hash = Sha512::digest(&input);
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&hash[..32]);
    SigningKey::from_bytes(&key_bytes)
}

fn xrp_to_drops(amount: Decimal) -> Result<u64, ChainError> {
    let scaled = (amount * Decimal::from(DROPS_PER_XRP)).round();
    scaled
        .to_u64()
        .ok_or_else(|| network_error("amount does not fit in drops"))
}

fn drops_to_xrp(drops: u64) -> Decimal {
    Decimal::from(drops) / Decimal::from(DROPS_PER_XRP)
}

fn push_vl_prefix(out: &mut Vec<u8>, len: usize) {
    // Only lengths up to 192 are needed by the fields this adapter emits.
    out.push(len as u8);
}

fn push_uint16_field(out: &mut Vec<u8>, field_code: u8, value: u16) {
    out.push((1 << 4) | field_code);
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_uint32_field(out: &mut Vec<u8>, field_code: u8, value: u32) {
    out.push((2 << 4) | field_code);
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_native_amount_field(out: &mut Vec<u8>, field_code: u8, drops: u64) {
    out.push((6 << 4) | field_code);
    out.extend_from_slice(&(drops | NATIVE_POSITIVE_FLAG).to_be_bytes());
}

fn push_blob_field(out: &mut Vec<u8>, field_code: u8, bytes: &[u8]) {
    out.push((7 << 4) | field_code);
    push_vl_prefix(out, bytes.len());
    out.extend_from_slice(bytes);
}

fn push_account_id_field(out: &mut Vec<u8>, field_code: u8, account_id: &[u8; 20]) {
    out.push((8 << 4) | field_code);
    push_vl_prefix(out, 20);
    out.extend_from_slice(account_id);
}

/// Fields of a basic `Payment` transaction, in the canonical (type, field)
/// serialization order rippled requires.
struct PaymentFields {
    account: [u8; 20],
    destination: [u8; 20],
    amount_drops: u64,
    fee_drops: u64,
    sequence: u32,
    signing_pub_key: [u8; 33],
}

fn serialize_payment(fields: &PaymentFields, signature: Option<&[u8; 64]>) -> Vec<u8> {
    let mut out = Vec::new();
    push_uint16_field(&mut out, 2, PAYMENT_TRANSACTION_TYPE); // TransactionType
    push_uint32_field(&mut out, 4, fields.sequence); // Sequence
    push_native_amount_field(&mut out, 1, fields.amount_drops); // Amount
    push_native_amount_field(&mut out, 8, fields.fee_drops); // Fee
    push_blob_field(&mut out, 3, &fields.signing_pub_key); // SigningPubKey
    if let Some(sig) = signature {
        push_blob_field(&mut out, 4, sig); // TxnSignature
    }
    push_account_id_field(&mut out, 1, &fields.account); // Account
    push_account_id_field(&mut out, 3, &fields.destination); // Destination
    out
}

fn signing_hash(fields: &PaymentFields) -> [u8; 32] {
    let mut data = Vec::new();
    data.extend_from_slice(&SINGLE_SIGN_PREFIX);
    data.extend_from_slice(&serialize_payment(fields, None));
    let hash = Sha512::digest(&data);
    let mut half = [0u8; 32];
    half.copy_from_slice(&hash[..32]);
    half
}

/// XRP Ledger chain adapter, talking rippled's JSON-RPC dialect directly.
pub struct XrplAdapter {
    rpc_url: String,
    http: reqwest::Client,
}

impl XrplAdapter {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            http: reqwest::Client::new(),
        }
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = json!({
            "method": method,
            "params": [params],
        });
        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| network_error(format!("{method} request failed: {e}")))?;
        let parsed: Value = response
            .json()
            .await
            .map_err(|e| network_error(format!("{method} response was not JSON: {e}")))?;
        parsed
            .get("result")
            .cloned()
            .ok_or_else(|| network_error(format!("{method} response missing 'result'")))
    }

    /// Posts to an external testnet faucet requesting funds for `address`.
    /// The faucet's response body is not trusted for a transaction hash
    /// (it doesn't reliably return one); the caller records a synthetic
    /// identifier on success and a FAILED funding entry on failure.
    pub async fn request_faucet_funding(&self, faucet_url: &url::Url, address: &str) -> bool {
        self.http
            .post(faucet_url.clone())
            .json(&json!({ "destination": address }))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn account_sequence(&self, address: &str) -> Result<u32, ChainError> {
        let result = self
            .rpc_call("account_info", json!({ "account": address, "ledger_index": "current" }))
            .await?;
        result
            .get("account_data")
            .and_then(|d| d.get("Sequence"))
            .and_then(Value::as_u64)
            .map(|s| s as u32)
            .ok_or_else(|| network_error("account_info response missing Sequence"))
    }

    async fn current_fee_drops(&self) -> Result<u64, ChainError> {
        let result = self.rpc_call("fee", json!({})).await?;
        result
            .get("drops")
            .and_then(|d| d.get("open_ledger_fee"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| network_error("fee response missing drops.open_ledger_fee"))
    }
}

#[async_trait::async_trait]
impl ChainAdapter for XrplAdapter {
    fn network(&self) -> Network {
        Network::Xrp
    }

    fn generate(&self) -> GeneratedKeypair {
        let (entropy, _encoded_seed) = seed::generate();
        let signing_key = derive_signing_key(&entropy);
        let address = derive_address(&signing_key.verifying_key());
        GeneratedKeypair {
            address,
            signing_material: seed::entropy_to_hex(&entropy),
        }
    }

    async fn balance(&self, address: &str, token: Token) -> Result<Decimal, ChainError> {
        if token != Token::Xrp {
            return Err(network_error(format!("unsupported XRP token {token}")));
        }
        let result = self
            .rpc_call("account_info", json!({ "account": address, "ledger_index": "validated" }))
            .await?;
        let drops: u64 = result
            .get("account_data")
            .and_then(|d| d.get("Balance"))
            .and_then(Value::as_str)
            .ok_or_else(|| network_error("account_info response missing Balance"))?
            .parse()
            .map_err(|_| network_error("Balance was not a numeric drops string"))?;
        Ok(drops_to_xrp(drops))
    }

    async fn transfer(
        &self,
        signing_material: &str,
        to: &str,
        amount: Decimal,
        token: Token,
    ) -> Result<String, ChainError> {
        if token != Token::Xrp {
            return Err(network_error(format!("unsupported XRP token {token}")));
        }
        let entropy = seed::decode(signing_material)
            .map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        let signing_key = derive_signing_key(&entropy);
        let verifying_key = signing_key.verifying_key();

        let mut signing_pub_key = [0u8; 33];
        signing_pub_key[0] = ED25519_PREFIX;
        signing_pub_key[1..].copy_from_slice(verifying_key.as_bytes());

        let account = account_id_from_verifying_key(&verifying_key);
        let from_address = encode_account_address(&account);
        let destination = decode_account_address(to)?;
        let sequence = self.account_sequence(&from_address).await?;
        let fee_drops = self.current_fee_drops().await?;
        let amount_drops = xrp_to_drops(amount)?;

        let fields = PaymentFields {
            account,
            destination,
            amount_drops,
            fee_drops,
            sequence,
            signing_pub_key,
        };
        let hash_to_sign = signing_hash(&fields);
        let signature = signing_key.sign(&hash_to_sign);
        let tx_blob = serialize_payment(&fields, Some(&signature.to_bytes()));

        let result = self
            .rpc_call("submit", json!({ "tx_blob": hex::encode_upper(&tx_blob) }))
            .await?;

        let engine_result = result.get("engine_result").and_then(Value::as_str);
        result
            .get("tx_json")
            .and_then(|t| t.get("hash"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                network_error(format!(
                    "submit did not return a transaction hash (engine_result={engine_result:?})"
                ))
            })
    }

    async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ChainError> {
        let result = self.rpc_call("tx", json!({ "transaction": tx_hash })).await;
        let result = match result {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };
        if result.get("error").and_then(Value::as_str) == Some("txnNotFound") {
            return Ok(None);
        }
        let validated = result.get("validated").and_then(Value::as_bool).unwrap_or(false);
        if !validated {
            return Ok(None);
        }
        let ok = result
            .get("meta")
            .and_then(|m| m.get("TransactionResult"))
            .and_then(Value::as_str)
            == Some("tesSUCCESS");
        let ledger_index = result.get("ledger_index").and_then(Value::as_u64);
        Ok(Some(Receipt {
            mined: true,
            ok,
            block_number: ledger_index,
        }))
    }
}

#[async_trait::async_trait]
impl crate::chain::FaucetClient for XrplAdapter {
    async fn request_funding(&self, faucet_url: &url::Url, address: &str) -> bool {
        XrplAdapter::request_faucet_funding(self, faucet_url, address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_produces_r_address_and_32_hex_char_entropy() {
        let adapter = XrplAdapter::new("http://localhost:5005".to_string());
        let keypair = adapter.generate();
        assert!(keypair.address.starts_with('r'));
        assert_eq!(keypair.signing_material.len(), 32);
    }

    #[test]
    fn address_round_trips_through_account_id() {
        let (entropy, _) = seed::generate();
        let signing_key = derive_signing_key(&entropy);
        let address = derive_address(&signing_key.verifying_key());
        let account_id = decode_account_address(&address).unwrap();
        assert_eq!(encode_account_address(&account_id), address);
    }

    #[test]
    fn drops_round_trip() {
        let amount = Decimal::new(5_250_000, 6); // 5.25 XRP
        let drops = xrp_to_drops(amount).unwrap();
        assert_eq!(drops, 5_250_000);
        assert_eq!(drops_to_xrp(drops), amount);
    }

    #[test]
    fn signing_hash_is_deterministic_and_ignores_signature_field() {
        let fields = PaymentFields {
            account: [1u8; 20],
            destination: [2u8; 20],
            amount_drops: 1_000_000,
            fee_drops: 10,
            sequence: 1,
            signing_pub_key: [0xEDu8; 33],
        };
        assert_eq!(signing_hash(&fields), signing_hash(&fields));
    }
}
