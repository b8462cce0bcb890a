//! Crowdfunding contract binding.

use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;
use serde::Serialize;
use tracing::info;

use super::contract::{ContractHandle, TxOptions};
use super::rpc::{RpcClient, TransactionReceipt};
use crate::Result;

sol! {
    interface ICrowdfunding {
        function createProject(string name, string description, uint256 goal) external;

        function participateToProject(uint256 projectId) external payable;

        function searchForProject(uint256 projectId) external view returns (uint256 id, string name, string description, address owner, uint256 goal, uint256 raised);

        function getContributions(uint256 projectId, address contributor) external view returns (address account, uint256[] amounts);
    }
}

use ICrowdfunding::{
    createProjectCall, getContributionsCall, participateToProjectCall, searchForProjectCall,
};

/// A crowdfunding project as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: U256,
    pub name: String,
    pub description: String,
    pub owner: Address,
    /// Funding goal in wei.
    pub goal: U256,
    /// Total contributed so far in wei.
    pub raised: U256,
}

/// Contributions of one account to a project, in donation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contributions {
    pub contributor: Address,
    pub amounts: Vec<U256>,
}

impl Contributions {
    pub fn total(&self) -> U256 {
        self.amounts.iter().fold(U256::ZERO, |acc, amount| acc + amount)
    }
}

/// A deployed `Crowdfunding` contract.
#[derive(Debug, Clone, Copy)]
pub struct CrowdfundingContract<'a> {
    contract: ContractHandle<'a>,
}

impl<'a> CrowdfundingContract<'a> {
    pub fn new(client: &'a RpcClient, address: Address) -> Self {
        Self {
            contract: ContractHandle::new(client, address),
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    pub async fn create_project(
        &self,
        name: &str,
        description: &str,
        goal: U256,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        let call = createProjectCall {
            name: name.to_string(),
            description: description.to_string(),
            goal,
        };
        let receipt = self.contract.transact(&call, opts).await?;
        info!(name = name, goal = %goal, tx_hash = %receipt.transaction_hash, "Project created");
        Ok(receipt)
    }

    /// Donate `opts.value` to a project. The contract refuses donations from the owner.
    pub async fn participate_to_project(
        &self,
        project_id: U256,
        opts: &TxOptions,
    ) -> Result<TransactionReceipt> {
        let call = participateToProjectCall {
            projectId: project_id,
        };
        let receipt = self.contract.transact(&call, opts).await?;
        info!(
            project_id = %project_id,
            value = %opts.value,
            tx_hash = %receipt.transaction_hash,
            "Contribution sent"
        );
        Ok(receipt)
    }

    pub async fn search_for_project(&self, project_id: U256, opts: &TxOptions) -> Result<Project> {
        let call = searchForProjectCall {
            projectId: project_id,
        };
        let ret = self.contract.view(&call, opts).await?;
        Ok(Project {
            id: ret.id,
            name: ret.name,
            description: ret.description,
            owner: ret.owner,
            goal: ret.goal,
            raised: ret.raised,
        })
    }

    pub async fn get_contributions(
        &self,
        project_id: U256,
        contributor: Address,
        opts: &TxOptions,
    ) -> Result<Contributions> {
        let call = getContributionsCall {
            projectId: project_id,
            contributor,
        };
        let ret = self.contract.view(&call, opts).await?;
        Ok(Contributions {
            contributor: ret.account,
            amounts: ret.amounts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rpc::MockRpcTransport;
    use alloy_primitives::address;
    use alloy_sol_types::{SolCall, SolValue};
    use serde_json::json;

    const CROWDFUNDING: Address = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
    const OWNER: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const DONOR: Address = address!("70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn hex_data(bytes: &[u8]) -> String {
        format!("0x{}", hex::encode(bytes))
    }

    #[tokio::test]
    async fn test_search_for_project_decodes_tuple() {
        let encoded = (
            U256::ZERO,
            "Test".to_string(),
            "Test project".to_string(),
            OWNER,
            U256::from(500u64),
            U256::from(9000u64),
        )
            .abi_encode_params();
        let expected_call = hex_data(&searchForProjectCall { projectId: U256::ZERO }.abi_encode());

        let mut mock = MockRpcTransport::new();
        mock.expect_request()
            .withf(move |method, params| {
                method == "eth_call" && params[0]["data"] == json!(expected_call)
            })
            .times(1)
            .returning(move |_, _| Ok(json!(hex_data(&encoded))));

        let client = RpcClient::new(mock);
        let crowdfunding = CrowdfundingContract::new(&client, CROWDFUNDING);
        let project = crowdfunding
            .search_for_project(U256::ZERO, &TxOptions::default())
            .await
            .unwrap();

        assert_eq!(project.name, "Test");
        assert_eq!(project.description, "Test project");
        assert_eq!(project.owner, OWNER);
        assert_eq!(project.raised, U256::from(9000u64));
    }

    #[tokio::test]
    async fn test_get_contributions_decodes_amounts() {
        let encoded =
            (DONOR, vec![U256::from(3u64), U256::from(5u64)]).abi_encode_params();

        let mut mock = MockRpcTransport::new();
        mock.expect_request()
            .withf(|method, _| method == "eth_call")
            .returning(move |_, _| Ok(json!(hex_data(&encoded))));

        let client = RpcClient::new(mock);
        let contributions = CrowdfundingContract::new(&client, CROWDFUNDING)
            .get_contributions(U256::ZERO, DONOR, &TxOptions::default())
            .await
            .unwrap();

        assert_eq!(contributions.contributor, DONOR);
        assert_eq!(contributions.amounts, vec![U256::from(3u64), U256::from(5u64)]);
        assert_eq!(contributions.total(), U256::from(8u64));
    }

    #[tokio::test]
    async fn test_participate_attaches_value() {
        let mut mock = MockRpcTransport::new();
        mock.expect_request()
            .withf(|method, params| {
                method == "eth_sendTransaction" && params[0]["value"] == json!("0x3")
            })
            .times(1)
            .returning(|_, _| Ok(json!(format!("0x{}", "44".repeat(32)))));
        mock.expect_request()
            .withf(|method, _| method == "eth_getTransactionReceipt")
            .returning(|_, _| {
                Ok(json!({
                    "transactionHash": format!("0x{}", "44".repeat(32)),
                    "status": "0x1",
                    "logs": []
                }))
            });

        let client = RpcClient::new(mock);
        let receipt = CrowdfundingContract::new(&client, CROWDFUNDING)
            .participate_to_project(
                U256::ZERO,
                &TxOptions::sender(DONOR).with_value(U256::from(3u64)),
            )
            .await
            .unwrap();
        assert!(receipt.succeeded());
    }
}
