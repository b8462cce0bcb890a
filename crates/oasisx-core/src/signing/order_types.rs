//! Order types for OasisX exchange signing.
//!
//! Defines the order record hashed under EIP-712, the call descriptor bundled
//! with an order at match time, and the hash-to-sign composition.

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::SolValue;
use rand::Rng;

use super::domain::Eip712Domain;
use super::typed_data::{
    compute_typed_data_hash, FieldType, StructSchema, TypedData, TypedField, TypedValue,
    TYPED_DATA_PREFIX,
};

/// Name of the order struct in the exchange's typed-data schema.
pub const ORDER_TYPE_NAME: &str = "Order";

/// Order as hashed by the exchange contract.
///
/// Field order is part of the signed schema; reordering changes every hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Proxy registry the maker's proxy lives in.
    pub registry: Address,
    /// Order maker.
    pub maker: Address,
    /// Target of the static validation call.
    pub static_target: Address,
    /// Selector of the static validation call.
    pub static_selector: FixedBytes<4>,
    /// Extra data passed to the static validation call.
    pub static_extradata: Bytes,
    /// Maximum fill, in units the static call interprets.
    pub maximum_fill: U256,
    /// Listing time (unix seconds).
    pub listing_time: U256,
    /// Expiration time (unix seconds), zero for none.
    pub expiration_time: U256,
    /// Uniqueness nonce.
    pub salt: U256,
}

impl Order {
    /// EIP-712 schema of the order struct.
    pub fn schema() -> StructSchema {
        StructSchema::new(
            ORDER_TYPE_NAME,
            vec![
                TypedField::new("registry", FieldType::Address),
                TypedField::new("maker", FieldType::Address),
                TypedField::new("staticTarget", FieldType::Address),
                TypedField::new("staticSelector", FieldType::FixedBytes(4)),
                TypedField::new("staticExtradata", FieldType::Bytes),
                TypedField::new("maximumFill", FieldType::Uint(256)),
                TypedField::new("listingTime", FieldType::Uint(256)),
                TypedField::new("expirationTime", FieldType::Uint(256)),
                TypedField::new("salt", FieldType::Uint(256)),
            ],
        )
    }

    /// The order as a typed-data record keyed by schema field names.
    pub fn typed_values(&self) -> Vec<(&'static str, TypedValue)> {
        vec![
            ("registry", TypedValue::Address(self.registry)),
            ("maker", TypedValue::Address(self.maker)),
            ("staticTarget", TypedValue::Address(self.static_target)),
            (
                "staticSelector",
                TypedValue::FixedBytes(self.static_selector.to_vec()),
            ),
            (
                "staticExtradata",
                TypedValue::Bytes(self.static_extradata.clone()),
            ),
            ("maximumFill", TypedValue::Uint(self.maximum_fill)),
            ("listingTime", TypedValue::Uint(self.listing_time)),
            ("expirationTime", TypedValue::Uint(self.expiration_time)),
            ("salt", TypedValue::Uint(self.salt)),
        ]
    }

    /// Compute the EIP-712 struct hash for this order.
    pub fn struct_hash(&self) -> B256 {
        let order_type_hash = keccak256(
            b"Order(address registry,address maker,address staticTarget,bytes4 staticSelector,bytes staticExtradata,uint256 maximumFill,uint256 listingTime,uint256 expirationTime,uint256 salt)",
        );

        // encodeData: one 32-byte word per field, dynamic bytes hashed first.
        let encoded = (
            order_type_hash,
            self.registry.into_word(),
            self.maker.into_word(),
            self.static_target.into_word(),
            B256::right_padding_from(self.static_selector.as_slice()),
            keccak256(&self.static_extradata),
            self.maximum_fill,
            self.listing_time,
            self.expiration_time,
            self.salt,
        )
            .abi_encode_packed();

        keccak256(&encoded)
    }
}

/// EIP-712 struct hash of an order.
pub fn hash_order(order: &Order) -> B256 {
    order.struct_hash()
}

/// Typed-data request for an order against an exchange deployment.
pub fn struct_to_sign(order: &Order, exchange: Address) -> TypedData {
    TypedData {
        domain: Eip712Domain::oasisx_exchange(exchange),
        schema: Order::schema(),
        message: order.typed_values(),
    }
}

/// Hash the signer actually signs for `order` on `exchange`.
///
/// `prefix` overrides the standard `0x1901` prefix when given and non-empty.
pub fn hash_to_sign(order: &Order, exchange: Address, prefix: Option<&[u8]>) -> B256 {
    let prefix = prefix
        .filter(|prefix| !prefix.is_empty())
        .unwrap_or(&TYPED_DATA_PREFIX);
    let domain = Eip712Domain::oasisx_exchange(exchange);
    compute_typed_data_hash(prefix, domain.separator(), order.struct_hash())
}

/// How the exchange invokes a call target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HowToCall {
    #[default]
    Call = 0,
    DelegateCall = 1,
}

impl HowToCall {
    /// Get the numeric value for encoding.
    pub fn as_u8(&self) -> u8 {
        match self {
            HowToCall::Call => 0,
            HowToCall::DelegateCall => 1,
        }
    }
}

/// Downstream call executed atomically with an order at match time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub how_to_call: HowToCall,
    pub data: Bytes,
}

impl Call {
    pub fn new(target: Address, data: impl Into<Bytes>) -> Self {
        Self {
            target,
            how_to_call: HowToCall::Call,
            data: data.into(),
        }
    }

    pub fn delegate(mut self) -> Self {
        self.how_to_call = HowToCall::DelegateCall;
        self
    }
}

/// Random order salt below 10^10.
pub fn random_uint() -> U256 {
    U256::from(rand::thread_rng().gen_range(0..10_000_000_000u64))
}

/// Order builder for creating orders with a fluent API.
#[derive(Debug, Clone)]
pub struct OrderBuilder {
    registry: Address,
    maker: Option<Address>,
    static_target: Address,
    static_selector: FixedBytes<4>,
    static_extradata: Bytes,
    maximum_fill: U256,
    listing_time: Option<U256>,
    expiration_time: U256,
    salt: Option<U256>,
}

impl OrderBuilder {
    /// Create a new order builder.
    pub fn new() -> Self {
        Self {
            registry: Address::ZERO,
            maker: None,
            static_target: Address::ZERO,
            static_selector: FixedBytes::ZERO,
            static_extradata: Bytes::new(),
            maximum_fill: U256::from(1u64),
            listing_time: None,
            expiration_time: U256::ZERO,
            salt: None,
        }
    }

    pub fn registry(mut self, registry: Address) -> Self {
        self.registry = registry;
        self
    }

    /// Set the maker address.
    pub fn maker(mut self, maker: Address) -> Self {
        self.maker = Some(maker);
        self
    }

    /// Set the static validation call.
    pub fn static_call(
        mut self,
        target: Address,
        selector: FixedBytes<4>,
        extradata: impl Into<Bytes>,
    ) -> Self {
        self.static_target = target;
        self.static_selector = selector;
        self.static_extradata = extradata.into();
        self
    }

    pub fn maximum_fill(mut self, fill: U256) -> Self {
        self.maximum_fill = fill;
        self
    }

    pub fn listing_time(mut self, timestamp: u64) -> Self {
        self.listing_time = Some(U256::from(timestamp));
        self
    }

    /// Set expiration in seconds from now.
    pub fn expires_in(mut self, seconds: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.expiration_time = U256::from(now + seconds);
        self
    }

    /// Set absolute expiration timestamp.
    pub fn expires_at(mut self, timestamp: u64) -> Self {
        self.expiration_time = U256::from(timestamp);
        self
    }

    pub fn salt(mut self, salt: U256) -> Self {
        self.salt = Some(salt);
        self
    }

    /// Build the order.
    ///
    /// Returns None if the maker is missing.
    pub fn build(self) -> Option<Order> {
        let maker = self.maker?;
        let listing_time = self
            .listing_time
            .unwrap_or_else(|| U256::from(chrono::Utc::now().timestamp().max(0) as u64));

        Some(Order {
            registry: self.registry,
            maker,
            static_target: self.static_target,
            static_selector: self.static_selector,
            static_extradata: self.static_extradata,
            maximum_fill: self.maximum_fill,
            listing_time,
            expiration_time: self.expiration_time,
            salt: self.salt.unwrap_or_else(random_uint),
        })
    }
}

impl Default for OrderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, fixed_bytes};

    const MAKER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const EXCHANGE: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    fn sample_order() -> Order {
        Order {
            registry: address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            maker: MAKER,
            static_target: address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
            static_selector: fixed_bytes!("7ffdbfbd"),
            static_extradata: Bytes::from(vec![0u8; 40]),
            maximum_fill: U256::from(1u64),
            listing_time: U256::from(1_700_000_000u64),
            expiration_time: U256::from(1_800_000_000u64),
            salt: U256::from(999u64),
        }
    }

    #[test]
    fn test_hash_order_deterministic() {
        let order = sample_order();
        assert_eq!(hash_order(&order), hash_order(&order.clone()));
        assert_ne!(hash_order(&order), B256::ZERO);
    }

    #[test]
    fn test_struct_hash_matches_schema_hash() {
        let order = sample_order();
        let generic = Order::schema().hash_struct(&order.typed_values()).unwrap();
        assert_eq!(order.struct_hash(), generic);
    }

    #[test]
    fn test_schema_type_string() {
        assert_eq!(
            Order::schema().encode_type(),
            "Order(address registry,address maker,address staticTarget,bytes4 staticSelector,bytes staticExtradata,uint256 maximumFill,uint256 listingTime,uint256 expirationTime,uint256 salt)"
        );
    }

    #[test]
    fn test_every_field_changes_hash() {
        let base = sample_order();
        let base_hash = hash_order(&base);

        let mut changed = base.clone();
        changed.salt = U256::from(1000u64);
        assert_ne!(hash_order(&changed), base_hash);

        let mut changed = base.clone();
        changed.static_extradata = Bytes::from(vec![1u8; 40]);
        assert_ne!(hash_order(&changed), base_hash);

        let mut changed = base.clone();
        changed.static_selector = fixed_bytes!("00000001");
        assert_ne!(hash_order(&changed), base_hash);

        let mut changed = base;
        changed.maker = Address::ZERO;
        assert_ne!(hash_order(&changed), base_hash);
    }

    #[test]
    fn test_hash_to_sign_domain_separation() {
        let order = sample_order();
        assert_ne!(
            hash_to_sign(&order, EXCHANGE, None),
            hash_to_sign(&order, MAKER, None)
        );
    }

    #[test]
    fn test_hash_to_sign_matches_typed_data_digest() {
        let order = sample_order();
        let typed = struct_to_sign(&order, EXCHANGE);
        assert_eq!(
            typed.digest(None).unwrap(),
            hash_to_sign(&order, EXCHANGE, None)
        );
    }

    #[test]
    fn test_hash_to_sign_prefix_override() {
        let order = sample_order();
        let standard = hash_to_sign(&order, EXCHANGE, None);

        assert_eq!(hash_to_sign(&order, EXCHANGE, Some(&[])), standard);
        assert_eq!(hash_to_sign(&order, EXCHANGE, Some(&[0x19, 0x01])), standard);
        assert_ne!(hash_to_sign(&order, EXCHANGE, Some(&[0x19, 0x00])), standard);
    }

    #[test]
    fn test_order_json_message() {
        let payload = struct_to_sign(&sample_order(), EXCHANGE).to_json();
        assert_eq!(payload["primaryType"], "Order");
        assert_eq!(payload["message"]["staticSelector"], "0x7ffdbfbd");
        assert_eq!(payload["message"]["salt"], "999");
        assert_eq!(payload["domain"]["name"], "OasisX Exchange");
        assert_eq!(payload["types"]["Order"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_order_builder() {
        let order = OrderBuilder::new()
            .maker(MAKER)
            .expires_in(3600)
            .build()
            .unwrap();

        assert_eq!(order.maker, MAKER);
        assert_eq!(order.maximum_fill, U256::from(1u64));
        assert!(order.expiration_time > order.listing_time);
        assert!(order.salt < U256::from(10_000_000_000u64));
    }

    #[test]
    fn test_order_builder_requires_maker() {
        assert!(OrderBuilder::new().build().is_none());
    }

    #[test]
    fn test_how_to_call() {
        assert_eq!(HowToCall::Call.as_u8(), 0);
        assert_eq!(HowToCall::DelegateCall.as_u8(), 1);
        assert_eq!(
            Call::new(MAKER, Bytes::new()).delegate().how_to_call,
            HowToCall::DelegateCall
        );
    }
}
