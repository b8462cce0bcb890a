//! Contract migration: deploy an artifact and confirm it landed.

use anyhow::{Context, Result};
use oasisx_core::api::deployment::{deploy_contract, is_deployed};
use oasisx_core::api::{ContractArtifact, DeploymentRecord, RpcClient, TxOptions};
use oasisx_core::config::{MigrationParameters, Network, NetworkParameters};
use oasisx_core::Error;
use tracing::{info, warn};

/// Deploys one artifact to one network.
pub struct Migration<'a> {
    client: &'a RpcClient,
    network: String,
    params: NetworkParameters,
}

impl<'a> Migration<'a> {
    /// Select the parameter set for `network` (`rinkeby`, `mainnet`, else devnet).
    pub fn new(client: &'a RpcClient, network: &str, params: &MigrationParameters) -> Result<Self> {
        let params = params
            .for_network(Network::from_name(network))
            .with_context(|| format!("Selecting migration parameters for {network}"))?
            .clone();

        Ok(Self {
            client,
            network: network.to_string(),
            params,
        })
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.params
    }

    /// Deploy `artifact`. Returns `None` when the receipt names no contract
    /// or no code is found at the reported address; that outcome is logged
    /// and not treated as an error.
    pub async fn run(&self, artifact: &ContractArtifact) -> Result<Option<DeploymentRecord>> {
        let chain_id = self.client.chain_id().await?;
        if chain_id != self.params.chain_id {
            warn!(
                network = %self.network,
                expected = self.params.chain_id,
                actual = chain_id,
                "Chain id does not match migration parameters"
            );
        }

        let opts = match self.params.gas_limit {
            Some(gas) => TxOptions::default().with_gas(gas),
            None => TxOptions::default(),
        };

        let deployment = match deploy_contract(self.client, artifact, &opts).await {
            Ok(deployment) => deployment,
            Err(Error::Deployment { message }) => {
                warn!(reason = %message, "{} Deployment UNSUCCESSFUL", artifact.contract_name);
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Deploying {}", artifact.contract_name))
            }
        };

        if !is_deployed(self.client, deployment.address).await? {
            warn!("{} Deployment UNSUCCESSFUL", deployment.name);
            return Ok(None);
        }

        info!(
            network = %self.network,
            address = %deployment.address,
            creator = %deployment.creator,
            "Deployed: {}",
            deployment.name
        );

        Ok(Some(DeploymentRecord::new(
            &deployment.name,
            &self.network,
            deployment.address,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address, Bytes};
    use async_trait::async_trait;
    use oasisx_core::api::RpcTransport;
    use serde_json::{json, Value};
    use tokio_test::block_on;

    const CREATOR: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    /// Dev node stand-in answering each method with a fixed value.
    struct DevNode {
        code: &'static str,
        contract_address: Option<&'static str>,
    }

    impl DevNode {
        fn with_code(code: &'static str) -> Self {
            Self {
                code,
                contract_address: Some("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            }
        }
    }

    #[async_trait]
    impl RpcTransport for DevNode {
        async fn request(&self, method: &str, _params: Value) -> oasisx_core::Result<Value> {
            Ok(match method {
                "eth_chainId" => json!("0x539"),
                "eth_accounts" => json!([CREATOR]),
                "eth_sendTransaction" => json!(format!("0x{}", "aa".repeat(32))),
                "eth_getTransactionReceipt" => json!({
                    "transactionHash": format!("0x{}", "aa".repeat(32)),
                    "status": "0x1",
                    "contractAddress": self.contract_address,
                    "logs": []
                }),
                "eth_getCode" => json!(self.code),
                _ => Value::Null,
            })
        }
    }

    fn params() -> MigrationParameters {
        MigrationParameters {
            devnet: NetworkParameters {
                chain_id: 1337,
                gas_limit: None,
            },
            rinkeby: Some(NetworkParameters {
                chain_id: 4,
                gas_limit: None,
            }),
            mainnet: None,
        }
    }

    fn artifact() -> ContractArtifact {
        ContractArtifact {
            contract_name: "Crowdfunding".to_string(),
            bytecode: Bytes::from(vec![0x60, 0x80]),
        }
    }

    #[test]
    fn test_unknown_network_uses_devnet() {
        let client = RpcClient::new(DevNode::with_code("0x"));
        let migration = Migration::new(&client, "ganache", &params()).unwrap();
        assert_eq!(migration.parameters().chain_id, 1337);

        let migration = Migration::new(&client, "rinkeby", &params()).unwrap();
        assert_eq!(migration.parameters().chain_id, 4);

        assert!(Migration::new(&client, "mainnet", &params()).is_err());
    }

    #[test]
    fn test_successful_deployment_yields_record() {
        let client = RpcClient::new(DevNode::with_code("0x6080"));
        let migration = Migration::new(&client, "development", &params()).unwrap();

        let record = block_on(migration.run(&artifact())).unwrap().unwrap();
        assert_eq!(record.key, "Crowdfunding_ADDRESS_DEVELOPMENT");
        assert_eq!(
            record.address,
            address!("5FbDB2315678afecb367f032d93F642f64180aa3")
        );
    }

    #[test]
    fn test_missing_code_is_soft_failure() {
        let client = RpcClient::new(DevNode::with_code("0x"));
        let migration = Migration::new(&client, "development", &params()).unwrap();

        let record = block_on(migration.run(&artifact())).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_missing_contract_address_is_soft_failure() {
        let client = RpcClient::new(DevNode {
            code: "0x6080",
            contract_address: None,
        });
        let migration = Migration::new(&client, "development", &params()).unwrap();

        let record = block_on(migration.run(&artifact())).unwrap();
        assert!(record.is_none());
    }

    #[test]
    fn test_node_error_is_hard_failure() {
        struct Down;

        #[async_trait]
        impl RpcTransport for Down {
            async fn request(&self, method: &str, _params: Value) -> oasisx_core::Result<Value> {
                match method {
                    "eth_chainId" => Ok(json!("0x539")),
                    _ => Err(oasisx_core::Error::Rpc {
                        code: -32000,
                        message: "node unavailable".to_string(),
                    }),
                }
            }
        }

        let client = RpcClient::new(Down);
        let migration = Migration::new(&client, "development", &params()).unwrap();
        assert!(block_on(migration.run(&artifact())).is_err());
    }
}
