//! Boundary to the blockchain node the contract is deployed on.

use {
    alloy::{
        network::{EthereumWallet, TransactionBuilder},
        primitives::{Address, Bytes, TxHash, U256},
        providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
        rpc::{client::ClientBuilder, types::TransactionRequest},
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
    std::time::Duration,
    url::Url,
};

/// Outcome of waiting for a transaction to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// Whether the transaction executed without reverting.
    pub success: bool,
    /// Address of the contract created by the transaction.
    pub contract_address: Option<Address>,
}

/// Abstracts the blockchain interactions needed to deploy a contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Chain: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;

    /// Account sending and paying for transactions.
    fn account(&self) -> Address;

    async fn balance(&self, address: Address) -> Result<U256>;

    /// Sends a contract creation transaction with the given init code and
    /// returns its hash once the node accepted it.
    async fn submit(&self, init_code: Bytes) -> Result<TxHash>;

    /// Suspends until the transaction is included and has `confirmations`
    /// confirmations. Fails if that takes longer than `timeout`.
    async fn confirm(
        &self,
        tx: TxHash,
        confirmations: u64,
        timeout: Option<Duration>,
    ) -> Result<Confirmation>;
}

/// [`Chain`] implementation talking JSON-RPC to a node.
pub struct Node {
    provider: DynProvider,
    account: Address,
}

impl Node {
    /// Wraps a provider whose transactions are sent from `account`.
    pub fn new(provider: DynProvider, account: Address) -> Self {
        Self { provider, account }
    }

    /// Connects to the node at `url`. With a `signer` transactions are signed
    /// locally, otherwise the node's first unlocked account sends them (as
    /// on Hardhat or anvil dev nodes).
    pub async fn connect(url: &Url, signer: Option<PrivateKeySigner>) -> Result<Self> {
        let rpc = ClientBuilder::default().http(url.clone());
        let (provider, account) = match signer {
            Some(signer) => {
                let account = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::new(signer))
                    .connect_client(rpc)
                    .erased();
                (provider, account)
            }
            None => {
                let provider = ProviderBuilder::new().connect_client(rpc).erased();
                let account = provider
                    .get_accounts()
                    .await
                    .context("could not fetch node accounts")?
                    .first()
                    .copied()
                    .context("node has no unlocked accounts, configure a private key")?;
                (provider, account)
            }
        };
        tracing::debug!(%url, ?account, "connected to node");
        Ok(Self::new(provider, account))
    }
}

#[async_trait::async_trait]
impl Chain for Node {
    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("could not fetch current chain id")
    }

    fn account(&self) -> Address {
        self.account
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address)
            .await
            .with_context(|| format!("could not fetch balance of {address}"))
    }

    async fn submit(&self, init_code: Bytes) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(self.account)
            .with_deploy_code(init_code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .context("node rejected the deployment transaction")?;
        Ok(*pending.tx_hash())
    }

    async fn confirm(
        &self,
        tx: TxHash,
        confirmations: u64,
        timeout: Option<Duration>,
    ) -> Result<Confirmation> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx)
            .with_required_confirmations(confirmations)
            .with_timeout(timeout)
            .get_receipt()
            .await
            .with_context(|| format!("transaction {tx} was not confirmed"))?;
        Ok(Confirmation {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            contract_address: receipt.contract_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::{address, b256},
            providers::mock::Asserter,
        },
        serde_json::json,
    };

    const ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const DEPLOYED: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");
    const TX: TxHash = b256!("0x4e3a3754410177e6937ef1f84bba68ea139e8d1a2258c5f85db9f1cd715a1bdd");

    fn mocked_node() -> (Node, Asserter) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
            .erased();
        (Node::new(provider, ACCOUNT), asserter)
    }

    fn receipt(status: &str, contract_address: Option<Address>) -> serde_json::Value {
        json!({
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "blockHash": "0x8e38b4dbf6b11fcc3b9dee84fb7986e29ca0a02cecd8977c161ff7333329681e",
            "blockNumber": "0x7",
            "from": ACCOUNT,
            "to": null,
            "contractAddress": contract_address,
            "gasUsed": "0x2dc6c",
            "cumulativeGasUsed": "0x2dc6c",
            "effectiveGasPrice": "0x3b9aca00",
            "type": "0x2",
            "status": status,
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
        })
    }

    #[tokio::test]
    async fn submit_returns_transaction_hash() {
        let (node, asserter) = mocked_node();
        asserter.push_success(&TX);

        let hash = node.submit(Bytes::from(vec![0x60, 0x80])).await.unwrap();
        assert_eq!(hash, TX);
    }

    #[tokio::test]
    async fn submit_fails_when_node_rejects() {
        let (node, asserter) = mocked_node();
        asserter.push_failure_msg("insufficient funds for gas * price + value");

        let err = node.submit(Bytes::from(vec![0x60, 0x80])).await.unwrap_err();
        assert!(format!("{err:#}").contains("node rejected the deployment transaction"));
    }

    #[tokio::test]
    async fn confirm_reads_receipt() {
        let (node, asserter) = mocked_node();
        // Polled once when watching and once when fetching the receipt.
        asserter.push_success(&receipt("0x1", Some(DEPLOYED)));
        asserter.push_success(&receipt("0x1", Some(DEPLOYED)));

        let confirmation = node.confirm(TX, 1, None).await.unwrap();
        assert_eq!(
            confirmation,
            Confirmation {
                transaction_hash: TX,
                block_number: Some(7),
                gas_used: 187_500,
                success: true,
                contract_address: Some(DEPLOYED),
            }
        );
    }

    #[tokio::test]
    async fn confirm_reports_reverted_receipt() {
        let (node, asserter) = mocked_node();
        asserter.push_success(&receipt("0x0", None));
        asserter.push_success(&receipt("0x0", None));

        let confirmation = node.confirm(TX, 1, None).await.unwrap();
        assert!(!confirmation.success);
        assert_eq!(confirmation.contract_address, None);
    }

    #[tokio::test]
    async fn confirm_fails_on_node_error() {
        let (node, asserter) = mocked_node();
        asserter.push_failure_msg("header not found");

        let err = node.confirm(TX, 1, None).await.unwrap_err();
        assert!(err.to_string().contains("was not confirmed"));
    }
}
