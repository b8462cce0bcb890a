//! Typed calls against a deployed contract.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::debug;

use super::rpc::{RpcClient, TransactionReceipt, TransactionRequest};
use crate::Result;

/// Per-call transaction options (`from`, attached value, gas limit).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxOptions {
    pub from: Option<Address>,
    pub value: U256,
    pub gas: Option<u64>,
}

impl TxOptions {
    /// Options sending from `from`.
    pub fn sender(from: Address) -> Self {
        Self {
            from: Some(from),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }
}

/// A contract address bound to the client that reaches it.
#[derive(Debug, Clone, Copy)]
pub struct ContractHandle<'a> {
    client: &'a RpcClient,
    address: Address,
}

impl<'a> ContractHandle<'a> {
    pub fn new(client: &'a RpcClient, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn client(&self) -> &'a RpcClient {
        self.client
    }

    fn request<C: SolCall>(&self, call: &C, opts: &TxOptions) -> TransactionRequest {
        TransactionRequest {
            from: opts.from,
            to: Some(self.address),
            gas: opts.gas.map(alloy_primitives::U64::from),
            value: opts.value,
            data: call.abi_encode().into(),
        }
    }

    /// Read-only call; the result is ABI-decoded into the function's return type.
    pub async fn view<C: SolCall>(&self, call: &C, opts: &TxOptions) -> Result<C::Return> {
        debug!(contract = %self.address, function = C::SIGNATURE, "eth_call");
        let data = self.client.call(&self.request(call, opts)).await?;
        Ok(C::abi_decode_returns(&data)?)
    }

    /// State-changing call; waits for the receipt.
    pub async fn transact<C: SolCall>(
        &self,
        call: &C,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        debug!(contract = %self.address, function = C::SIGNATURE, "transaction");
        self.client.transact(&self.request(call, opts)).await
    }
}
