//! Order signatures and their exchange encoding.
//!
//! The exchange accepts two signing methods. Standard signatures are made
//! over the typed-data hash directly. Personal-sign signatures are made over
//! the EIP-191 message hash of the typed-data hash and carry a trailing
//! suffix byte that tells the contract which recovery path to use.

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::{Error, Result};

/// Suffix tagging `eth_sign` style signatures, as used by 0x.
pub const PERSONAL_SIGN_SUFFIX: u8 = 0x03;

/// How a signature was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMethod {
    /// Typed-data signature over the hash to sign.
    #[default]
    Standard,
    /// EIP-191 personal signature over the hash to sign, tagged with a suffix byte.
    PersonalSignWithSuffix(u8),
}

/// An ECDSA signature in `{v, r, s}` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub v: u8,
    pub r: B256,
    pub s: B256,
    pub method: SignatureMethod,
}

/// Placeholder signature for orders authorised by other means.
pub const NULL_SIG: Signature = Signature {
    v: 27,
    r: B256::ZERO,
    s: B256::ZERO,
    method: SignatureMethod::Standard,
};

impl Signature {
    /// Parse a 65-byte `r ‖ s ‖ v` signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(Error::Signature {
                message: format!("expected 65 bytes, got {}", bytes.len()),
            });
        }

        Ok(Self {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
            method: SignatureMethod::Standard,
        })
    }

    /// The 65-byte `r ‖ s ‖ v` form.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Tag as a personal-sign signature, normalising a raw recovery id to 27/28.
    pub fn into_personal_sign(mut self, suffix: u8) -> Self {
        if self.v < 27 {
            self.v += 27;
        }
        self.method = SignatureMethod::PersonalSignWithSuffix(suffix);
        self
    }

    pub fn suffix(&self) -> Option<u8> {
        match self.method {
            SignatureMethod::Standard => None,
            SignatureMethod::PersonalSignWithSuffix(suffix) => Some(suffix),
        }
    }

    /// Encoding the exchange expects: `abi.encode(uint8 v, bytes32 r, bytes32 s)`
    /// followed by the suffix byte, if any.
    pub fn encode_for_exchange(&self) -> Bytes {
        let mut encoded = (U256::from(self.v), self.r, self.s).abi_encode_params();
        if let Some(suffix) = self.suffix() {
            encoded.push(suffix);
        }
        Bytes::from(encoded)
    }

    /// Recover the signer of `hash_to_sign` along this signature's verification path.
    pub fn recover(&self, hash_to_sign: B256) -> Result<Address> {
        let parity = match self.v {
            0 | 27 => false,
            1 | 28 => true,
            v => {
                return Err(Error::Signature {
                    message: format!("invalid recovery id {v}"),
                })
            }
        };

        let signature = alloy_primitives::Signature::new(
            U256::from_be_bytes(self.r.0),
            U256::from_be_bytes(self.s.0),
            parity,
        );

        let recovered = match self.method {
            SignatureMethod::Standard => signature.recover_address_from_prehash(&hash_to_sign),
            SignatureMethod::PersonalSignWithSuffix(_) => {
                signature.recover_address_from_msg(hash_to_sign.as_slice())
            }
        };

        recovered.map_err(|e| Error::Signature {
            message: format!("recovery failed: {e}"),
        })
    }
}

/// Parse a `0x`-prefixed hex signature as returned by signing RPC methods.
pub fn parse_sig(signature: &str) -> Result<Signature> {
    let bytes = hex::decode(signature.trim_start_matches("0x")).map_err(|e| Error::Signature {
        message: format!("invalid hex: {e}"),
    })?;
    Signature::from_bytes(&bytes)
}
