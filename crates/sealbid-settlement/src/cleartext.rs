//! Cleartext payload codec for settlement callbacks.
//!
//! The oracle returns one 32-byte big-endian word per requested handle, in
//! request order. A settlement payload is exactly two words: the winning
//! amount (right-aligned `u64`) and the winner (right-aligned 20-byte
//! address). Non-zero padding is rejected.

use sealbid_types::{Address, Result, SealbidError, constants};

const WORD: usize = constants::CLEARTEXT_WORD_BYTES;

/// The decoded result of a settlement decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementCleartexts {
    pub winning_amount: u64,
    pub winner: Address,
}

impl SettlementCleartexts {
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WORD * constants::SETTLEMENT_CLEARTEXT_WORDS);
        out.extend_from_slice(&uint_word(self.winning_amount));
        out.extend_from_slice(&address_word(&self.winner));
        out
    }

    /// # Errors
    /// `MalformedCleartexts` on a wrong length or non-zero padding.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let expected = WORD * constants::SETTLEMENT_CLEARTEXT_WORDS;
        if bytes.len() != expected {
            return Err(malformed(format!(
                "expected {expected} bytes, got {}",
                bytes.len()
            )));
        }
        let (amount, winner) = bytes.split_at(WORD);
        Ok(Self {
            winning_amount: decode_uint_word(amount)?,
            winner: decode_address_word(winner)?,
        })
    }
}

#[must_use]
pub fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

#[must_use]
pub fn address_word(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 20..].copy_from_slice(address.as_bytes());
    word
}

#[must_use]
pub fn bool_word(value: bool) -> [u8; WORD] {
    uint_word(u64::from(value))
}

fn decode_uint_word(word: &[u8]) -> Result<u64> {
    let (padding, value) = word.split_at(WORD - 8);
    if padding.iter().any(|b| *b != 0) {
        return Err(malformed("amount exceeds 64 bits".into()));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(value);
    Ok(u64::from_be_bytes(bytes))
}

fn decode_address_word(word: &[u8]) -> Result<Address> {
    let (padding, value) = word.split_at(WORD - 20);
    if padding.iter().any(|b| *b != 0) {
        return Err(malformed("winner word has non-zero padding".into()));
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(value);
    Ok(Address(bytes))
}

fn malformed(reason: String) -> SealbidError {
    SealbidError::MalformedCleartexts { reason }
}
