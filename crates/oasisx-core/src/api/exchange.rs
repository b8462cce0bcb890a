//! OasisX exchange contract wrapper.
//!
//! Flattens [`Order`], [`Signature`] and [`Call`] values into the positional
//! parameters of each exchange method. There is one encode function per
//! method so the field sequence of every call is spelled out once and checked
//! by the compiler against the ABI declared below.
//!
//! The wrapper validates nothing itself: expired orders, bad signatures and
//! unmatched calls are rejected by the contract and surface as
//! [`Error::Rpc`](crate::Error::Rpc) or [`Error::Reverted`](crate::Error::Reverted).

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolValue};
use tracing::info;

use super::contract::{ContractHandle, TxOptions};
use super::rpc::{RpcClient, TransactionReceipt};
use crate::signing::{hash_order, Call, Order, OrderSigner, Signature};
use crate::Result;

sol! {
    /// Call surface of the OasisX exchange.
    interface IOasisXExchange {
        function hashOrder(address registry, address maker, address staticTarget, bytes4 staticSelector, bytes staticExtradata, uint256 maximumFill, uint256 listingTime, uint256 expirationTime, uint256 salt) external view returns (bytes32 hash);

        function hashToSign(bytes32 orderHash) external view returns (bytes32 hash);

        function validateOrderParameters(address registry, address maker, address staticTarget, bytes4 staticSelector, bytes staticExtradata, uint256 maximumFill, uint256 listingTime, uint256 expirationTime, uint256 salt) external view returns (bool valid);

        function validateOrderAuthorization(bytes32 hash, address maker, bytes signature) external view returns (bool valid);

        function approveOrderHash(bytes32 hash) external;

        function approveOrder(address registry, address maker, address staticTarget, bytes4 staticSelector, bytes staticExtradata, uint256 maximumFill, uint256 listingTime, uint256 expirationTime, uint256 salt, bool orderbookInclusionDesired) external;

        function setOrderFill(bytes32 hash, uint256 fill) external;

        function atomicMatch(uint256[16] uints, bytes4[2] staticSelectors, bytes firstExtradata, bytes firstCalldata, bytes secondExtradata, bytes secondCalldata, uint8[2] howToCalls, bytes32 metadata, bytes signatures) external payable;
    }
}

use IOasisXExchange::{
    approveOrderCall, approveOrderHashCall, atomicMatchCall, hashOrderCall, hashToSignCall,
    setOrderFillCall, validateOrderAuthorizationCall, validateOrderParametersCall,
};

/// One side of an atomic match: the order, its authorisation and its call.
#[derive(Debug, Clone, Copy)]
pub struct MatchSide<'o> {
    pub order: &'o Order,
    pub signature: &'o Signature,
    pub call: &'o Call,
}

impl<'o> MatchSide<'o> {
    pub fn new(order: &'o Order, signature: &'o Signature, call: &'o Call) -> Self {
        Self {
            order,
            signature,
            call,
        }
    }
}

fn address_word(address: Address) -> U256 {
    U256::from_be_bytes(address.into_word().0)
}

pub fn encode_hash_order(order: &Order) -> hashOrderCall {
    hashOrderCall {
        registry: order.registry,
        maker: order.maker,
        staticTarget: order.static_target,
        staticSelector: order.static_selector,
        staticExtradata: order.static_extradata.clone(),
        maximumFill: order.maximum_fill,
        listingTime: order.listing_time,
        expirationTime: order.expiration_time,
        salt: order.salt,
    }
}

pub fn encode_hash_to_sign(order_hash: B256) -> hashToSignCall {
    hashToSignCall {
        orderHash: order_hash,
    }
}

pub fn encode_validate_order_parameters(order: &Order) -> validateOrderParametersCall {
    validateOrderParametersCall {
        registry: order.registry,
        maker: order.maker,
        staticTarget: order.static_target,
        staticSelector: order.static_selector,
        staticExtradata: order.static_extradata.clone(),
        maximumFill: order.maximum_fill,
        listingTime: order.listing_time,
        expirationTime: order.expiration_time,
        salt: order.salt,
    }
}

pub fn encode_validate_order_authorization(
    hash: B256,
    maker: Address,
    signature: &Signature,
) -> validateOrderAuthorizationCall {
    validateOrderAuthorizationCall {
        hash,
        maker,
        signature: signature.encode_for_exchange(),
    }
}

pub fn encode_approve_order_hash(hash: B256) -> approveOrderHashCall {
    approveOrderHashCall { hash }
}

pub fn encode_approve_order(order: &Order, inclusion: bool) -> approveOrderCall {
    approveOrderCall {
        registry: order.registry,
        maker: order.maker,
        staticTarget: order.static_target,
        staticSelector: order.static_selector,
        staticExtradata: order.static_extradata.clone(),
        maximumFill: order.maximum_fill,
        listingTime: order.listing_time,
        expirationTime: order.expiration_time,
        salt: order.salt,
        orderbookInclusionDesired: inclusion,
    }
}

/// The fill is keyed by the locally computed order hash.
pub fn encode_set_order_fill(order: &Order, fill: U256) -> setOrderFillCall {
    setOrderFillCall {
        hash: hash_order(order),
        fill,
    }
}

/// Selectors and extradata travel outside the `uint256[16]` word array.
pub fn encode_atomic_match(
    first: &MatchSide<'_>,
    second: &MatchSide<'_>,
    metadata: B256,
) -> atomicMatchCall {
    let side_words = |side: &MatchSide<'_>| {
        [
            address_word(side.order.registry),
            address_word(side.order.maker),
            address_word(side.order.static_target),
            side.order.maximum_fill,
            side.order.listing_time,
            side.order.expiration_time,
            side.order.salt,
            address_word(side.call.target),
        ]
    };

    let mut uints = [U256::ZERO; 16];
    uints[..8].copy_from_slice(&side_words(first));
    uints[8..].copy_from_slice(&side_words(second));

    let signatures = (
        first.signature.encode_for_exchange(),
        second.signature.encode_for_exchange(),
    )
        .abi_encode_params();

    atomicMatchCall {
        uints,
        staticSelectors: [first.order.static_selector, second.order.static_selector],
        firstExtradata: first.order.static_extradata.clone(),
        firstCalldata: first.call.data.clone(),
        secondExtradata: second.order.static_extradata.clone(),
        secondCalldata: second.call.data.clone(),
        howToCalls: [first.call.how_to_call.as_u8(), second.call.how_to_call.as_u8()],
        metadata,
        signatures: Bytes::from(signatures),
    }
}

/// A deployed exchange reached through an [`RpcClient`].
#[derive(Debug, Clone, Copy)]
pub struct ExchangeContract<'a> {
    contract: ContractHandle<'a>,
}

impl<'a> ExchangeContract<'a> {
    pub fn new(client: &'a RpcClient, address: Address) -> Self {
        Self {
            contract: ContractHandle::new(client, address),
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    /// Signer whose hashes are bound to this exchange.
    pub fn signer(&self) -> OrderSigner<'a> {
        OrderSigner::new(self.contract.client(), self.address())
    }

    /// Order hash as computed by the contract.
    pub async fn hash_order(&self, order: &Order) -> Result<B256> {
        self.contract
            .view(&encode_hash_order(order), &TxOptions::default())
            .await
    }

    /// Hash to sign as computed by the contract (`hashOrder`, then `hashToSign`).
    pub async fn hash_to_sign(&self, order: &Order) -> Result<B256> {
        let order_hash = self.hash_order(order).await?;
        self.contract
            .view(&encode_hash_to_sign(order_hash), &TxOptions::default())
            .await
    }

    pub async fn validate_order_parameters(&self, order: &Order) -> Result<bool> {
        self.contract
            .view(
                &encode_validate_order_parameters(order),
                &TxOptions::default(),
            )
            .await
    }

    pub async fn validate_order_authorization(
        &self,
        hash: B256,
        maker: Address,
        signature: &Signature,
        opts: &TxOptions,
    ) -> Result<bool> {
        self.contract
            .view(
                &encode_validate_order_authorization(hash, maker, signature),
                opts,
            )
            .await
    }

    pub async fn approve_order_hash(
        &self,
        hash: B256,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        let receipt = self
            .contract
            .transact(&encode_approve_order_hash(hash), opts)
            .await?;
        info!(order_hash = %hash, tx_hash = %receipt.transaction_hash, "Order hash approved");
        Ok(receipt)
    }

    pub async fn approve_order(
        &self,
        order: &Order,
        inclusion: bool,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        let receipt = self
            .contract
            .transact(&encode_approve_order(order, inclusion), opts)
            .await?;
        info!(
            maker = %order.maker,
            inclusion = inclusion,
            tx_hash = %receipt.transaction_hash,
            "Order approved"
        );
        Ok(receipt)
    }

    pub async fn set_order_fill(
        &self,
        order: &Order,
        fill: U256,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        self.contract
            .transact(&encode_set_order_fill(order, fill), opts)
            .await
    }

    /// Match two orders from the default account with no value attached.
    pub async fn atomic_match(
        &self,
        first: &MatchSide<'_>,
        second: &MatchSide<'_>,
        metadata: B256,
    ) -> Result<TransactionReceipt> {
        self.atomic_match_with(first, second, metadata, &TxOptions::default())
            .await
    }

    pub async fn atomic_match_with(
        &self,
        first: &MatchSide<'_>,
        second: &MatchSide<'_>,
        metadata: B256,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        let receipt = self
            .contract
            .transact(&encode_atomic_match(first, second, metadata), opts)
            .await?;
        info!(
            first_maker = %first.order.maker,
            second_maker = %second.order.maker,
            tx_hash = %receipt.transaction_hash,
            "Orders matched"
        );
        Ok(receipt)
    }

    /// Typed-data signature of `order` by `account`.
    pub async fn sign(&self, order: &Order, account: Address) -> Result<Signature> {
        self.signer().sign(order, account).await
    }

    /// Personal-sign signature of `order` by `account`, tagged with the suffix byte.
    pub async fn personal_sign(
        &self,
        order: &Order,
        account: Address,
        prefix: Option<&[u8]>,
    ) -> Result<Signature> {
        self.signer().personal_sign(order, account, prefix).await
    }
}
