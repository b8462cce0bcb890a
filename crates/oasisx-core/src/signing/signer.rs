//! Order signing against an exchange deployment.
//!
//! Accounts are resolved by the [`RpcClient`]: keys registered locally sign
//! in-process, anything else is delegated to the node.

use alloy_primitives::Address;
use tracing::debug;

use super::order_types::{hash_to_sign, struct_to_sign, Order};
use super::signature::{Signature, PERSONAL_SIGN_SUFFIX};
use crate::api::rpc::RpcClient;
use crate::Result;

/// Signs orders for one exchange contract.
#[derive(Debug, Clone, Copy)]
pub struct OrderSigner<'a> {
    client: &'a RpcClient,
    exchange: Address,
}

impl<'a> OrderSigner<'a> {
    pub fn new(client: &'a RpcClient, exchange: Address) -> Self {
        Self { client, exchange }
    }

    pub fn exchange(&self) -> Address {
        self.exchange
    }

    /// Sign `order` as EIP-712 typed data.
    pub async fn sign(&self, order: &Order, account: Address) -> Result<Signature> {
        let typed_data = struct_to_sign(order, self.exchange);
        let raw = self.client.sign_typed_data(account, &typed_data).await?;
        let signature = Signature::from_bytes(&raw)?;

        debug!(account = %account, exchange = %self.exchange, "Order signed");
        Ok(signature)
    }

    /// Sign the hash to sign of `order` as an EIP-191 personal message.
    ///
    /// `prefix` replaces `0x1901` in the hash to sign when given. The result
    /// carries [`PERSONAL_SIGN_SUFFIX`] and a `v` of 27 or 28.
    pub async fn personal_sign(
        &self,
        order: &Order,
        account: Address,
        prefix: Option<&[u8]>,
    ) -> Result<Signature> {
        let hash = hash_to_sign(order, self.exchange, prefix);
        let raw = self.client.sign_hash_message(account, hash).await?;
        let signature = Signature::from_bytes(&raw)?.into_personal_sign(PERSONAL_SIGN_SUFFIX);

        debug!(account = %account, hash = %hash, "Order personal-signed");
        Ok(signature)
    }
}
