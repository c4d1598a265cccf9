use crate::wallet::Network;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Credentials for the agent's wallet, persisted between runs.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletState {
    pub network_id: String,
    pub address: Address,
    pub private_key: String,
}

impl WalletState {
    pub fn generate(network: Network) -> Self {
        Self::from_signer(&PrivateKeySigner::random(), network)
    }

    pub fn from_private_key(private_key: &str, network: Network) -> Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .context("PRIVATE_KEY is not a valid secp256k1 key")?;
        Ok(Self::from_signer(&signer, network))
    }

    fn from_signer(signer: &PrivateKeySigner, network: Network) -> Self {
        Self {
            network_id: network.id().to_string(),
            address: signer.address(),
            private_key: format!("0x{}", hex::encode(signer.to_bytes())),
        }
    }

    pub fn network(&self) -> Result<Network> {
        self.network_id.parse()
    }

    pub fn signer(&self) -> Result<PrivateKeySigner> {
        let signer = PrivateKeySigner::from_str(&self.private_key)
            .context("wallet state holds an invalid private key")?;
        if signer.address() != self.address {
            anyhow::bail!(
                "wallet state address {} does not match its key ({})",
                self.address,
                signer.address()
            );
        }
        Ok(signer)
    }
}

impl fmt::Debug for WalletState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletState")
            .field("network_id", &self.network_id)
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// The single file holding [`WalletState`].
pub struct WalletStateStore {
    path: PathBuf,
}

impl WalletStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no wallet has been saved yet.
    pub fn load(&self) -> Result<Option<WalletState>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        let state = serde_json::from_str(&raw)
            .with_context(|| format!("{} is not valid wallet state", self.path.display()))?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &WalletState) -> Result<()> {
        let raw = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Loads the persisted wallet, or creates one from `private_key` (random when
/// absent), then writes the result back.
pub fn load_or_create(
    store: &WalletStateStore,
    network: Network,
    private_key: Option<&str>,
) -> Result<WalletState> {
    let state = match store.load()? {
        Some(state) => {
            if state.network_id != network.id() {
                tracing::warn!(
                    "wallet state is on {}, ignoring configured network {}",
                    state.network_id,
                    network
                );
            }
            state
        }
        None => {
            tracing::info!("no wallet state at {}, creating a wallet", store.path().display());
            match private_key {
                Some(key) => WalletState::from_private_key(key, network)?,
                None => WalletState::generate(network),
            }
        }
    };

    store.save(&state)?;
    Ok(state)
}
