//! Contract deployment helpers.
//!
//! Deploys compiled artifacts, checks that code landed at the reported
//! address and names the address record a deployment produces.

use std::fmt;
use std::path::Path;

use alloy_primitives::{Address, Bytes, B256};
use futures_util::future::try_join_all;
use serde::Deserialize;
use tracing::{info, warn};

use super::contract::TxOptions;
use super::rpc::{RpcClient, TransactionRequest};
use crate::{Error, Result};

/// Compiled contract artifact (the fields used from a build output JSON).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let artifact: Self = serde_json::from_str(&contents)?;

        if artifact.bytecode.is_empty() {
            return Err(Error::Deployment {
                message: format!("artifact `{}` has no bytecode", artifact.contract_name),
            });
        }
        Ok(artifact)
    }
}

/// A contract creation that was mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub name: String,
    pub address: Address,
    pub creator: Address,
    pub tx_hash: B256,
}

/// Deploy `artifact` and wait for the creation receipt.
pub async fn deploy_contract(
    client: &RpcClient,
    artifact: &ContractArtifact,
    opts: &TxOptions,
) -> Result<Deployment> {
    let creator = match opts.from {
        Some(from) => from,
        None => client.default_account().await?,
    };

    let mut tx = TransactionRequest::deploy(artifact.bytecode.clone())
        .from(creator)
        .value(opts.value);
    if let Some(gas) = opts.gas {
        tx = tx.gas(gas);
    }

    info!(contract = %artifact.contract_name, creator = %creator, "Deploying contract");
    let receipt = client.transact(&tx).await?;

    let address = receipt.contract_address.ok_or_else(|| Error::Deployment {
        message: format!(
            "receipt {} for `{}` has no contract address",
            receipt.transaction_hash, artifact.contract_name
        ),
    })?;

    Ok(Deployment {
        name: artifact.contract_name.clone(),
        address,
        creator,
        tx_hash: receipt.transaction_hash,
    })
}

/// True when code is present at `address`.
pub async fn is_deployed(client: &RpcClient, address: Address) -> Result<bool> {
    let code = client.get_code(address).await?;
    if code.is_empty() {
        warn!(address = %address, "No code at address");
    }
    Ok(!code.is_empty())
}

/// [`is_deployed`] for each address, queried concurrently.
pub async fn check_deployed(client: &RpcClient, addresses: &[Address]) -> Result<Vec<bool>> {
    try_join_all(addresses.iter().map(|address| is_deployed(client, *address))).await
}

/// Record key for a deployed address, e.g. `Crowdfunding_ADDRESS_RINKEBY`.
pub fn address_env_key(contract_name: &str, network: &str) -> String {
    format!("{}_ADDRESS_{}", contract_name, network.to_uppercase())
}

/// `KEY=address` line describing where a contract was deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub key: String,
    pub address: Address,
}

impl DeploymentRecord {
    pub fn new(contract_name: &str, network: &str, address: Address) -> Self {
        Self {
            key: address_env_key(contract_name, network),
            address,
        }
    }
}

impl fmt::Display for DeploymentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rpc::MockRpcTransport;
    use alloy_primitives::address;
    use serde_json::json;

    const CREATOR: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const DEPLOYED: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");

    fn artifact() -> ContractArtifact {
        ContractArtifact {
            contract_name: "Crowdfunding".to_string(),
            bytecode: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
        }
    }

    #[test]
    fn test_address_env_key() {
        assert_eq!(
            address_env_key("Crowdfunding", "rinkeby"),
            "Crowdfunding_ADDRESS_RINKEBY"
        );
        assert_eq!(
            address_env_key("Crowdfunding", "development"),
            "Crowdfunding_ADDRESS_DEVELOPMENT"
        );
    }

    #[test]
    fn test_deployment_record_display() {
        let record = DeploymentRecord::new("Crowdfunding", "development", DEPLOYED);
        assert_eq!(
            record.to_string(),
            "Crowdfunding_ADDRESS_DEVELOPMENT=0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
    }

    #[test]
    fn test_artifact_load() {
        let path = std::env::temp_dir().join(format!(
            "oasisx-artifact-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"contractName":"Crowdfunding","abi":[],"bytecode":"0x6080604052"}"#,
        )
        .unwrap();

        let artifact = ContractArtifact::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(artifact.contract_name, "Crowdfunding");
        assert_eq!(artifact.bytecode.len(), 5);
    }

    #[test]
    fn test_artifact_without_bytecode_rejected() {
        let path = std::env::temp_dir().join(format!(
            "oasisx-artifact-empty-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"contractName":"Abstract","bytecode":"0x"}"#).unwrap();

        let result = ContractArtifact::load(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(Error::Deployment { .. })));
    }

    #[tokio::test]
    async fn test_deploy_contract_reads_contract_address() {
        let mut mock = MockRpcTransport::new();
        mock.expect_request()
            .withf(|method, params| {
                method == "eth_sendTransaction"
                    && params[0].get("to").is_none()
                    && params[0]["data"] == json!("0x60806040")
            })
            .times(1)
            .returning(|_, _| Ok(json!(format!("0x{}", "55".repeat(32)))));
        mock.expect_request()
            .withf(|method, _| method == "eth_getTransactionReceipt")
            .returning(|_, _| {
                Ok(json!({
                    "transactionHash": format!("0x{}", "55".repeat(32)),
                    "status": "0x1",
                    "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                    "logs": []
                }))
            });

        let client = RpcClient::new(mock);
        let deployment = deploy_contract(&client, &artifact(), &TxOptions::sender(CREATOR))
            .await
            .unwrap();

        assert_eq!(deployment.name, "Crowdfunding");
        assert_eq!(deployment.address, DEPLOYED);
        assert_eq!(deployment.creator, CREATOR);
    }

    #[tokio::test]
    async fn test_check_deployed() {
        let mut mock = MockRpcTransport::new();
        mock.expect_request()
            .withf(|method, params| {
                method == "eth_getCode"
                    && params[0]
                        .as_str()
                        .is_some_and(|a| a.eq_ignore_ascii_case(&DEPLOYED.to_string()))
            })
            .returning(|_, _| Ok(json!("0x6080")));
        mock.expect_request()
            .withf(|method, params| {
                method == "eth_getCode"
                    && params[0]
                        .as_str()
                        .is_some_and(|a| a.eq_ignore_ascii_case(&CREATOR.to_string()))
            })
            .returning(|_, _| Ok(json!("0x")));

        let client = RpcClient::new(mock);
        let status = check_deployed(&client, &[DEPLOYED, CREATOR]).await.unwrap();
        assert_eq!(status, vec![true, false]);
    }
}
