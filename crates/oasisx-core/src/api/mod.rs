//! Chain access: JSON-RPC client and contract wrappers.

pub mod contract;
pub mod crowdfunding;
pub mod deployment;
pub mod exchange;
pub mod rpc;

pub use contract::{ContractHandle, TxOptions};
pub use crowdfunding::{Contributions, CrowdfundingContract, Project};
pub use deployment::{ContractArtifact, DeploymentRecord};
pub use exchange::{ExchangeContract, MatchSide};
pub use rpc::{HttpTransport, RpcClient, RpcTransport, TransactionReceipt, TransactionRequest};
