//! EIP-712 hashing and signing for OasisX exchange orders.
//!
//! # Architecture
//!
//! ```text
//! Order ── struct_to_sign ──► TypedData ── digest ──► hash to sign
//!   │                                                     │
//!   │                                                     ▼
//!   └──────────────► OrderSigner ── RpcClient ──► Signature
//!                                                     │
//!                                                     ▼
//!                                        ExchangeContract (atomicMatch)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use oasisx_core::api::RpcClient;
//! use oasisx_core::signing::{OrderBuilder, OrderSigner};
//!
//! let client = RpcClient::http("http://localhost:8545");
//! let maker = client.default_account().await?;
//!
//! let order = OrderBuilder::new()
//!     .registry(registry)
//!     .maker(maker)
//!     .static_call(static_market, selector, extradata)
//!     .expires_in(3600)
//!     .build()
//!     .unwrap();
//!
//! let signature = OrderSigner::new(&client, exchange).sign(&order, maker).await?;
//! ```

pub mod domain;
pub mod order_types;
pub mod signature;
pub mod signer;
pub mod typed_data;

pub use domain::{Eip712Domain, CHAIN_ID, EXCHANGE_NAME, EXCHANGE_VERSION};

pub use order_types::{
    hash_order, hash_to_sign, random_uint, struct_to_sign, Call, HowToCall, Order, OrderBuilder,
    ORDER_TYPE_NAME,
};

pub use signature::{parse_sig, Signature, SignatureMethod, NULL_SIG, PERSONAL_SIGN_SUFFIX};

pub use signer::OrderSigner;

pub use typed_data::{
    compute_typed_data_hash, FieldType, StructSchema, TypedData, TypedField, TypedValue,
    TYPED_DATA_PREFIX,
};
