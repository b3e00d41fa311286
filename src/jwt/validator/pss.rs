use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};

use crate::error::Error;
use crate::jwt::algorithm::HashAlg;
use crate::jwt::keys::left_pad;

/// RSASSA-PSS verification (RFC 8017 8.1.2) with MGF1 over `hash`.
///
/// The salt length is recovered from the encoded message, so signatures with
/// any valid salt length verify.
pub(super) fn verify_pss(
    hash: HashAlg,
    key: &RsaPublicKey,
    digest: &[u8],
    signature: &[u8],
) -> Result<(), Error> {
    if signature.len() != key.size() {
        return Err(invalid("signature length does not match modulus"));
    }
    let s = BigUint::from_bytes_be(signature);
    if &s >= key.n() {
        return Err(invalid("signature representative out of range"));
    }
    let m = s.modpow(key.e(), key.n());
    let em_bits = key.n().bits() - 1;
    let em_len = (em_bits + 7) / 8;
    let em = left_pad(&m.to_bytes_be(), em_len)
        .ok_or_else(|| invalid("encoded message too long"))?;
    emsa_pss_verify(hash, digest, &em, em_bits)
}

fn emsa_pss_verify(hash: HashAlg, m_hash: &[u8], em: &[u8], em_bits: usize) -> Result<(), Error> {
    let h_len = m_hash.len();
    let em_len = em.len();
    if em_len < h_len + 2 {
        return Err(invalid("encoded message too short"));
    }
    if em[em_len - 1] != 0xbc {
        return Err(invalid("trailer mismatch"));
    }
    let (masked_db, rest) = em.split_at(em_len - h_len - 1);
    let h = &rest[..h_len];

    let top_mask = 0xffu8 >> (8 * em_len - em_bits);
    if masked_db[0] & !top_mask != 0 {
        return Err(invalid("leftmost bits set"));
    }
    let mut db = mgf1(hash, h, masked_db.len());
    for (byte, masked) in db.iter_mut().zip(masked_db) {
        *byte ^= masked;
    }
    db[0] &= top_mask;

    // PS is all zeros, then 0x01, then the salt.
    let Some(separator) = db.iter().position(|b| *b != 0) else {
        return Err(invalid("missing salt separator"));
    };
    if db[separator] != 0x01 {
        return Err(invalid("missing salt separator"));
    }
    let salt = &db[separator + 1..];

    let mut m_prime = Vec::with_capacity(8 + h_len + salt.len());
    m_prime.extend_from_slice(&[0u8; 8]);
    m_prime.extend_from_slice(m_hash);
    m_prime.extend_from_slice(salt);
    if hash.digest(&m_prime) == h {
        Ok(())
    } else {
        Err(invalid("hash mismatch"))
    }
}

fn mgf1(hash: HashAlg, seed: &[u8], len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(len);
    let mut counter: u32 = 0;
    while mask.len() < len {
        let mut block = seed.to_vec();
        block.extend_from_slice(&counter.to_be_bytes());
        mask.extend_from_slice(&hash.digest(&block));
        counter += 1;
    }
    mask.truncate(len);
    mask
}

fn invalid(reason: &str) -> Error {
    Error::SignatureInvalid(format!("rsa pss verify error: {reason}"))
}
