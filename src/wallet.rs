use alloy::primitives::{Address, Bytes, TxHash};
use anyhow::Result;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    BaseMainnet,
    BaseSepolia,
}

impl Network {
    pub fn id(&self) -> &'static str {
        match self {
            Network::BaseMainnet => "base-mainnet",
            Network::BaseSepolia => "base-sepolia",
        }
    }

    /// Short label used in user-facing tool output.
    pub fn label(&self) -> &'static str {
        match self {
            Network::BaseMainnet => "mainnet",
            Network::BaseSepolia => "testnet",
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Network::BaseMainnet)
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::BaseMainnet => 8453,
            Network::BaseSepolia => 84532,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::BaseMainnet => "https://mainnet.base.org",
            Network::BaseSepolia => "https://sepolia.base.org",
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base-mainnet" | "mainnet" => Ok(Network::BaseMainnet),
            "base-sepolia" | "testnet" => Ok(Network::BaseSepolia),
            other => Err(anyhow::anyhow!(
                "unknown network id '{other}', expected base-mainnet or base-sepolia"
            )),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single state-changing call submitted from the wallet.
///
/// `value` is the exact ETH amount attached to the call; wallets convert it
/// to wei at submission time. `args` mirrors the encoded arguments for logs
/// and for callers that want to inspect what was sent.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractInvocation {
    pub contract: Address,
    pub method: &'static str,
    pub args: Vec<(&'static str, String)>,
    pub value: Decimal,
    pub calldata: Bytes,
}

impl ContractInvocation {
    /// Plain ETH send with no calldata.
    pub fn native_transfer(to: Address, value: Decimal) -> Self {
        Self {
            contract: to,
            method: "transfer",
            args: Vec::new(),
            value,
            calldata: Bytes::new(),
        }
    }

    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Mined,
    Reverted,
}

#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
    fn address(&self) -> Address;
    fn network(&self) -> Network;

    /// Native ETH balance.
    async fn balance(&self) -> Result<Decimal>;

    async fn invoke_contract(&self, invocation: &ContractInvocation) -> Result<TxHash>;

    /// Blocks until the transaction is mined or reverted.
    async fn wait_for_receipt(&self, tx: TxHash) -> Result<TxStatus>;
}

/// Shared wallet plus the lock that serializes state-changing calls on it.
///
/// Every tool that submits a transaction holds the guard from its balance
/// check until the receipt resolves, so concurrent sessions cannot race on
/// nonce assignment or spend the same balance twice.
#[derive(Clone)]
pub struct WalletHandle {
    wallet: Arc<dyn Wallet>,
    tx_lock: Arc<Mutex<()>>,
}

impl WalletHandle {
    pub fn new(wallet: Arc<dyn Wallet>) -> Self {
        Self {
            wallet,
            tx_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn wallet(&self) -> &dyn Wallet {
        self.wallet.as_ref()
    }

    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.tx_lock.lock().await
    }
}
