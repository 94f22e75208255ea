use {
    crate::chain::Chain,
    alloy::primitives::{Address, TxHash},
    anyhow::{Context, Result, ensure},
    contracts::{ContractFactory, networks},
    std::time::Duration,
};

/// A successfully deployed contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    pub contract: String,
    /// Never the zero address.
    pub address: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Deploys a contract: submits the creation transaction, waits for it to be
/// confirmed and reads back the address of the new contract. There are no
/// retries, any failure along the way fails the whole deployment.
pub struct Deployer<C> {
    chain: C,
    confirmations: u64,
    timeout: Option<Duration>,
    expected_chain_id: Option<u64>,
}

impl<C: Chain> Deployer<C> {
    pub fn new(chain: C) -> Self {
        Self {
            chain,
            confirmations: 1,
            timeout: None,
            expected_chain_id: None,
        }
    }

    /// A transaction counts as confirmed once it was included, so at least
    /// one confirmation is always awaited.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Refuse to deploy if the node reports a different chain.
    pub fn with_expected_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.expected_chain_id = chain_id;
        self
    }

    pub async fn deploy(
        &self,
        factory: &ContractFactory,
        constructor_args: &[String],
    ) -> Result<DeploymentResult> {
        let init_code = factory.deploy_code(constructor_args)?;

        let chain_id = self.chain.chain_id().await?;
        if let Some(expected) = self.expected_chain_id {
            ensure!(
                chain_id == expected,
                "node is on chain {chain_id} but the network is configured for chain {expected}"
            );
        }
        let account = self.chain.account();
        let balance = self.chain.balance(account).await?;
        tracing::info!(
            chain_id,
            network = networks::name(chain_id).unwrap_or("unknown"),
            ?account,
            %balance,
            "deploying {}",
            factory.name()
        );
        if balance.is_zero() {
            tracing::warn!(?account, "deploying account has no funds");
        }

        let tx = self
            .chain
            .submit(init_code)
            .await
            .context("failed to submit deployment transaction")?;
        tracing::info!(
            ?tx,
            confirmations = self.confirmations,
            "waiting for deployment to be confirmed"
        );
        let confirmation = self
            .chain
            .confirm(tx, self.confirmations, self.timeout)
            .await?;

        ensure!(confirmation.success, "deployment transaction {tx} reverted");
        let address = confirmation
            .contract_address
            .with_context(|| format!("receipt of transaction {tx} has no contract address"))?;
        ensure!(
            !address.is_zero(),
            "receipt of transaction {tx} reports the zero address as contract address"
        );

        let result = DeploymentResult {
            contract: factory.name().to_owned(),
            address,
            transaction_hash: confirmation.transaction_hash,
            block_number: confirmation.block_number,
            gas_used: confirmation.gas_used,
        };
        tracing::debug!(?result, "contract deployed");
        Ok(result)
    }
}
