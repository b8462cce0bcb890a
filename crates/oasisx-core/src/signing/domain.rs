//! EIP-712 domain separator for the OasisX exchange.
//!
//! The domain binds an order hash to one exchange deployment on one chain,
//! so a signature cannot be replayed against another contract or network.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::SolValue;
use serde_json::{json, Value};

use super::typed_data::{FieldType, StructSchema, TypedField, TypedValue};

/// Chain ID of the local development chain.
pub const CHAIN_ID: u64 = 1337;

/// Domain name the exchange contract hashes with.
pub const EXCHANGE_NAME: &str = "OasisX Exchange";

/// Domain version the exchange contract hashes with.
pub const EXCHANGE_VERSION: &str = "1.0";

/// EIP-712 domain separator parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eip712Domain {
    /// Domain name.
    pub name: String,
    /// Domain version.
    pub version: String,
    /// Chain ID.
    pub chain_id: U256,
    /// Verifying contract address.
    pub verifying_contract: Address,
}

impl Eip712Domain {
    /// Domain of an exchange deployment on the development chain.
    pub fn oasisx_exchange(verifying_contract: Address) -> Self {
        Self::custom(EXCHANGE_NAME, EXCHANGE_VERSION, CHAIN_ID, verifying_contract)
    }

    /// Create domain with custom parameters.
    pub fn custom(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id: U256::from(chain_id),
            verifying_contract,
        }
    }

    /// Schema of the `EIP712Domain` struct.
    pub fn schema() -> StructSchema {
        StructSchema::new(
            "EIP712Domain",
            vec![
                TypedField::new("name", FieldType::String),
                TypedField::new("version", FieldType::String),
                TypedField::new("chainId", FieldType::Uint(256)),
                TypedField::new("verifyingContract", FieldType::Address),
            ],
        )
    }

    pub fn typed_values(&self) -> Vec<(&'static str, TypedValue)> {
        vec![
            ("name", TypedValue::String(self.name.clone())),
            ("version", TypedValue::String(self.version.clone())),
            ("chainId", TypedValue::Uint(self.chain_id)),
            (
                "verifyingContract",
                TypedValue::Address(self.verifying_contract),
            ),
        ]
    }

    /// Compute the EIP-712 domain separator hash.
    pub fn separator(&self) -> B256 {
        let domain_type_hash = keccak256(
            b"EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)",
        );

        let name_hash = keccak256(self.name.as_bytes());
        let version_hash = keccak256(self.version.as_bytes());

        let encoded = (
            domain_type_hash,
            name_hash,
            version_hash,
            self.chain_id,
            self.verifying_contract.into_word(),
        )
            .abi_encode_packed();

        keccak256(&encoded)
    }

    /// Domain object as sent in `eth_signTypedData` payloads.
    ///
    /// `chainId` is a JSON number when it fits in 64 bits, a decimal string otherwise.
    pub fn to_json(&self) -> Value {
        let chain_id = if self.chain_id <= U256::from(u64::MAX) {
            json!(self.chain_id.to::<u64>())
        } else {
            json!(self.chain_id.to_string())
        };
        json!({
            "name": self.name,
            "version": self.version,
            "chainId": chain_id,
            "verifyingContract": self.verifying_contract.to_checksum(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const EXCHANGE: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    #[test]
    fn test_oasisx_exchange_domain() {
        let domain = Eip712Domain::oasisx_exchange(EXCHANGE);
        assert_eq!(domain.name, "OasisX Exchange");
        assert_eq!(domain.version, "1.0");
        assert_eq!(domain.chain_id, U256::from(1337u64));
        assert_eq!(domain.verifying_contract, EXCHANGE);
    }

    #[test]
    fn test_domain_separator_deterministic() {
        let domain1 = Eip712Domain::oasisx_exchange(EXCHANGE);
        let domain2 = Eip712Domain::oasisx_exchange(EXCHANGE);
        assert_eq!(domain1.separator(), domain2.separator());
    }

    #[test]
    fn test_separator_depends_on_contract_and_chain() {
        let base = Eip712Domain::oasisx_exchange(EXCHANGE);
        let other_contract = Eip712Domain::oasisx_exchange(Address::ZERO);
        let other_chain = Eip712Domain::custom(EXCHANGE_NAME, EXCHANGE_VERSION, 1, EXCHANGE);

        assert_ne!(base.separator(), other_contract.separator());
        assert_ne!(base.separator(), other_chain.separator());
    }

    #[test]
    fn test_separator_matches_schema_hash() {
        let domain = Eip712Domain::oasisx_exchange(EXCHANGE);
        let generic = Eip712Domain::schema()
            .hash_struct(&domain.typed_values())
            .unwrap();
        assert_eq!(domain.separator(), generic);
    }

    #[test]
    fn test_domain_json() {
        let json = Eip712Domain::oasisx_exchange(EXCHANGE).to_json();
        assert_eq!(json["chainId"], 1337);
        assert_eq!(
            json["verifyingContract"],
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
    }

    #[test]
    fn test_domain_json_wide_chain_id() {
        let mut domain = Eip712Domain::oasisx_exchange(EXCHANGE);
        domain.chain_id = U256::from(u64::MAX) + U256::from(1u64);

        let json = domain.to_json();
        assert_eq!(json["chainId"], "18446744073709551616");

        domain.chain_id = U256::from(u64::MAX);
        assert_eq!(domain.to_json()["chainId"], u64::MAX);
    }
}
