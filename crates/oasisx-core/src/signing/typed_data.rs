//! Schema-driven EIP-712 struct hashing.
//!
//! A [`StructSchema`] names a struct and lists its fields in declaration
//! order. Hashing a record against a schema follows `hashStruct` from
//! EIP-712: `keccak256(typeHash ‖ encodeData(record))`, where every field is
//! encoded as a single 32-byte word. Dynamic values (`bytes`, `string`) are
//! hashed first so the top-level encoding stays fixed-width.
//!
//! Only atomic and dynamic field types are supported. Nested structs and
//! arrays are not needed by any OasisX message.

use std::fmt;

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use super::domain::Eip712Domain;
use crate::{Error, Result};

/// Default EIP-191 version byte pair for typed data (`0x19 0x01`).
pub const TYPED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

/// Solidity type of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Address,
    Bool,
    String,
    Bytes,
    /// `bytesN`, 1 <= N <= 32.
    FixedBytes(usize),
    /// `uintN`, N a multiple of 8 up to 256.
    Uint(usize),
    /// `intN`; only non-negative values are encodable.
    Int(usize),
}

impl FieldType {
    /// Parse a Solidity type name such as `address`, `bytes4` or `uint256`.
    pub fn parse(type_name: &str) -> Result<Self> {
        match type_name {
            "address" => return Ok(FieldType::Address),
            "bool" => return Ok(FieldType::Bool),
            "string" => return Ok(FieldType::String),
            "bytes" => return Ok(FieldType::Bytes),
            "uint" => return Ok(FieldType::Uint(256)),
            "int" => return Ok(FieldType::Int(256)),
            _ => {}
        }

        if let Some(size) = type_name.strip_prefix("bytes") {
            let size: usize = size
                .parse()
                .map_err(|_| Error::typed_data(format!("unsupported type `{type_name}`")))?;
            if (1..=32).contains(&size) {
                return Ok(FieldType::FixedBytes(size));
            }
        } else if let Some(bits) = type_name.strip_prefix("uint") {
            if let Some(bits) = integer_bits(bits) {
                return Ok(FieldType::Uint(bits));
            }
        } else if let Some(bits) = type_name.strip_prefix("int") {
            if let Some(bits) = integer_bits(bits) {
                return Ok(FieldType::Int(bits));
            }
        }

        Err(Error::typed_data(format!("unsupported type `{type_name}`")))
    }
}

fn integer_bits(suffix: &str) -> Option<usize> {
    let bits: usize = suffix.parse().ok()?;
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(bits)
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Address => write!(f, "address"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::String => write!(f, "string"),
            FieldType::Bytes => write!(f, "bytes"),
            FieldType::FixedBytes(size) => write!(f, "bytes{size}"),
            FieldType::Uint(bits) => write!(f, "uint{bits}"),
            FieldType::Int(bits) => write!(f, "int{bits}"),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A `{name, type}` field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
}

impl TypedField {
    pub fn new(name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A value for one struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Address(Address),
    Bool(bool),
    String(String),
    Bytes(Bytes),
    FixedBytes(Vec<u8>),
    Uint(U256),
}

impl TypedValue {
    fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::Address(_) => "address",
            TypedValue::Bool(_) => "bool",
            TypedValue::String(_) => "string",
            TypedValue::Bytes(_) => "bytes",
            TypedValue::FixedBytes(_) => "fixed bytes",
            TypedValue::Uint(_) => "uint",
        }
    }

    /// Encode as a single EIP-712 `encodeData` word for a field of type `kind`.
    fn encode_word(&self, field: &TypedField) -> Result<B256> {
        let mismatch = || {
            Error::typed_data(format!(
                "field `{}` expects {}, got {} value",
                field.name,
                field.kind,
                self.kind_name()
            ))
        };

        let word = match (field.kind, self) {
            (FieldType::Address, TypedValue::Address(address)) => address.into_word(),
            (FieldType::Bool, TypedValue::Bool(flag)) => {
                B256::from(U256::from(*flag as u8).to_be_bytes::<32>())
            }
            (FieldType::String, TypedValue::String(text)) => keccak256(text.as_bytes()),
            (FieldType::Bytes, TypedValue::Bytes(bytes)) => keccak256(bytes),
            (FieldType::FixedBytes(size), TypedValue::FixedBytes(bytes)) => {
                if bytes.len() != size {
                    return Err(Error::typed_data(format!(
                        "field `{}` expects {} bytes, got {}",
                        field.name,
                        size,
                        bytes.len()
                    )));
                }
                B256::right_padding_from(bytes)
            }
            (FieldType::Uint(bits), TypedValue::Uint(value)) => {
                if value.bit_len() > bits {
                    return Err(Error::typed_data(format!(
                        "field `{}` value {} overflows uint{}",
                        field.name, value, bits
                    )));
                }
                B256::from(value.to_be_bytes::<32>())
            }
            (FieldType::Int(bits), TypedValue::Uint(value)) => {
                // Sign bit must stay clear.
                if value.bit_len() >= bits {
                    return Err(Error::typed_data(format!(
                        "field `{}` value {} overflows int{}",
                        field.name, value, bits
                    )));
                }
                B256::from(value.to_be_bytes::<32>())
            }
            _ => return Err(mismatch()),
        };

        Ok(word)
    }

    /// JSON rendering used in `eth_signTypedData` messages.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Address(address) => json!(address.to_checksum(None)),
            TypedValue::Bool(flag) => json!(flag),
            TypedValue::String(text) => json!(text),
            TypedValue::Bytes(bytes) => json!(format!("0x{}", hex::encode(bytes))),
            TypedValue::FixedBytes(bytes) => json!(format!("0x{}", hex::encode(bytes))),
            TypedValue::Uint(value) => json!(value.to_string()),
        }
    }
}

/// A named struct type with an ordered field list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructSchema {
    pub name: String,
    pub fields: Vec<TypedField>,
}

impl StructSchema {
    pub fn new(name: impl Into<String>, fields: Vec<TypedField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Build a schema from `(name, type)` string pairs.
    pub fn from_descriptors(name: impl Into<String>, descriptors: &[(&str, &str)]) -> Result<Self> {
        let fields = descriptors
            .iter()
            .map(|(field, type_name)| Ok(TypedField::new(*field, FieldType::parse(type_name)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(name, fields))
    }

    /// `Name(type1 name1,type2 name2,...)`
    pub fn encode_type(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{} {}", field.kind, field.name))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({})", self.name, fields)
    }

    pub fn type_hash(&self) -> B256 {
        keccak256(self.encode_type().as_bytes())
    }

    /// EIP-712 `hashStruct` of a named record.
    ///
    /// Every schema field must be present in `values` with a value of the
    /// declared type; names not in the schema are rejected.
    pub fn hash_struct(&self, values: &[(&str, TypedValue)]) -> Result<B256> {
        if let Some((unknown, _)) = values
            .iter()
            .find(|(name, _)| !self.fields.iter().any(|field| field.name == *name))
        {
            return Err(Error::typed_data(format!(
                "`{}` has no field named `{}`",
                self.name, unknown
            )));
        }

        let mut encoded = Vec::with_capacity(32 * (self.fields.len() + 1));
        encoded.extend_from_slice(self.type_hash().as_slice());

        for field in &self.fields {
            let value = values
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, value)| value)
                .ok_or_else(|| {
                    Error::typed_data(format!("missing field `{}` of `{}`", field.name, self.name))
                })?;
            encoded.extend_from_slice(value.encode_word(field)?.as_slice());
        }

        Ok(keccak256(&encoded))
    }
}

/// Compose the final digest: `keccak256(prefix ‖ domainSeparator ‖ structHash)`.
pub fn compute_typed_data_hash(prefix: &[u8], domain_separator: B256, struct_hash: B256) -> B256 {
    let mut data = Vec::with_capacity(prefix.len() + 64);
    data.extend_from_slice(prefix);
    data.extend_from_slice(domain_separator.as_slice());
    data.extend_from_slice(struct_hash.as_slice());
    keccak256(&data)
}

/// A complete typed-data request: domain, primary struct schema and message.
#[derive(Debug, Clone)]
pub struct TypedData {
    pub domain: Eip712Domain,
    pub schema: StructSchema,
    pub message: Vec<(&'static str, TypedValue)>,
}

impl TypedData {
    pub fn struct_hash(&self) -> Result<B256> {
        self.schema.hash_struct(&self.message)
    }

    /// Hash to sign, with the standard `0x1901` prefix unless overridden.
    pub fn digest(&self, prefix: Option<&[u8]>) -> Result<B256> {
        let prefix = prefix
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(&TYPED_DATA_PREFIX);
        Ok(compute_typed_data_hash(
            prefix,
            self.domain.separator(),
            self.struct_hash()?,
        ))
    }

    /// Payload for `eth_signTypedData`.
    pub fn to_json(&self) -> Value {
        let message: serde_json::Map<String, Value> = self
            .message
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect();

        let mut types = serde_json::Map::new();
        types.insert(
            "EIP712Domain".to_string(),
            json!(Eip712Domain::schema().fields),
        );
        types.insert(self.schema.name.clone(), json!(self.schema.fields));

        json!({
            "types": types,
            "domain": self.domain.to_json(),
            "primaryType": self.schema.name,
            "message": message,
        })
    }
}
