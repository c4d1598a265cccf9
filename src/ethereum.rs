use crate::units::{from_base_units, to_base_units};
use crate::wallet::{ContractInvocation, Network, TxStatus, Wallet};
use crate::wallet_store::WalletState;
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, TxHash},
    providers::{Provider, ProviderBuilder},
    rpc::types::eth::TransactionRequest,
    transports::http::{Client, Http},
};
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// [`Wallet`] backed by a local signer and a JSON-RPC provider.
pub struct EvmWallet<P> {
    provider: P,
    address: Address,
    network: Network,
    poll_interval: Duration,
}

/// Connects the persisted wallet to `rpc_url` and checks that the endpoint
/// serves the wallet's chain.
pub async fn connect(
    state: &WalletState,
    rpc_url: &str,
    poll_interval: Duration,
) -> Result<Arc<dyn Wallet>> {
    let network = state.network()?;
    let signer = state.signer()?;
    let address = signer.address();

    let url = Url::parse(rpc_url).with_context(|| format!("invalid RPC url {rpc_url}"))?;
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url);

    let chain_id = provider.get_chain_id().await?;
    if chain_id != network.chain_id() {
        anyhow::bail!(
            "RPC endpoint serves chain {chain_id}, wallet is on {network} ({})",
            network.chain_id()
        );
    }

    Ok(Arc::new(EvmWallet {
        provider,
        address,
        network,
        poll_interval,
    }))
}

#[async_trait::async_trait]
impl<P> Wallet for EvmWallet<P>
where
    P: Provider<Http<Client>, Ethereum> + Send + Sync + 'static,
{
    fn address(&self) -> Address {
        self.address
    }

    fn network(&self) -> Network {
        self.network
    }

    async fn balance(&self) -> Result<Decimal> {
        let balance = self.provider.get_balance(self.address).await?;
        from_base_units(balance)
    }

    async fn invoke_contract(&self, invocation: &ContractInvocation) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .from(self.address)
            .to(invocation.contract)
            .value(to_base_units(invocation.value))
            .input(invocation.calldata.clone().into());

        let pending = self.provider.send_transaction(tx).await?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxStatus> {
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx).await? {
                return Ok(if receipt.status() {
                    TxStatus::Mined
                } else {
                    TxStatus::Reverted
                });
            }
            debug!("transaction {} not mined yet", tx);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
