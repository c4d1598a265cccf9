use crate::wallet::Network;
use anyhow::Context;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub model_timeout: Duration,
    pub network: Network,
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
    pub wallet_data_file: String,
    pub faucet_url: Option<url::Url>,
    pub jwt_secret: String,
    pub jwt_ttl: Duration,
    pub require_auth: bool,
    pub allowed_origin: String,
    pub bind_addr: String,
    pub thread_id: String,
    pub max_iterations: usize,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let openai_api_key = var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?;
        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let network = Network::from_str(&or("NETWORK_ID", "base-sepolia"))?;
        let faucet_url = var("FAUCET_URL")
            .map(|raw| url::Url::parse(&raw).with_context(|| format!("FAUCET_URL '{raw}' is not a url")))
            .transpose()?;

        Ok(Self {
            openai_api_key,
            openai_model: or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model_timeout: Duration::from_secs(parse(&var, "MODEL_TIMEOUT_SECS", 60)?),
            network,
            rpc_url: var("ETHEREUM_RPC_URL"),
            private_key: var("PRIVATE_KEY"),
            wallet_data_file: or("WALLET_DATA_FILE", "wallet_data.txt"),
            faucet_url,
            jwt_secret,
            jwt_ttl: Duration::from_secs(parse(&var, "JWT_TTL_SECS", 3600)?),
            require_auth: parse(&var, "REQUIRE_AUTH", true)?,
            allowed_origin: or("ALLOWED_ORIGIN", "http://localhost:3000"),
            bind_addr: or("BIND_ADDR", "127.0.0.1:5001"),
            thread_id: or("THREAD_ID", "onchain-agent"),
            max_iterations: parse(&var, "AGENT_MAX_ITERATIONS", 10)?,
            confirmation_timeout: Duration::from_secs(parse(
                &var,
                "TX_CONFIRMATION_TIMEOUT_SECS",
                120,
            )?),
            poll_interval: Duration::from_millis(parse(&var, "TX_POLL_INTERVAL_MILLIS", 2000)?),
        })
    }

    /// The configured RPC endpoint, or the public one for `network`.
    pub fn rpc_url_for(&self, network: Network) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| network.default_rpc_url().to_string())
    }
}

fn parse<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}='{raw}' is invalid: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [("OPENAI_API_KEY", "sk-test"), ("JWT_SECRET", "secret")];

    #[test]
    fn defaults() {
        let parsed = config(&REQUIRED).unwrap();
        assert_eq!(parsed.network, Network::BaseSepolia);
        assert_eq!(parsed.wallet_data_file, "wallet_data.txt");
        assert_eq!(parsed.bind_addr, "127.0.0.1:5001");
        assert_eq!(parsed.max_iterations, 10);
        assert!(parsed.require_auth);
        assert!(parsed.faucet_url.is_none());
        assert_eq!(parsed.rpc_url_for(Network::BaseMainnet), "https://mainnet.base.org");
    }

    #[test]
    fn required_values() {
        assert!(config(&[("JWT_SECRET", "secret")]).is_err());
        assert!(config(&[("OPENAI_API_KEY", "sk-test")]).is_err());
    }

    #[test]
    fn overrides_and_bad_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("NETWORK_ID", "base-mainnet"),
            ("REQUIRE_AUTH", "false"),
            ("TX_CONFIRMATION_TIMEOUT_SECS", "30"),
            ("ETHEREUM_RPC_URL", "http://localhost:8545"),
        ]);
        let parsed = config(&pairs).unwrap();
        assert_eq!(parsed.network, Network::BaseMainnet);
        assert!(!parsed.require_auth);
        assert_eq!(parsed.confirmation_timeout, Duration::from_secs(30));
        assert_eq!(parsed.rpc_url_for(Network::BaseMainnet), "http://localhost:8545");

        let mut bad = REQUIRED.to_vec();
        bad.push(("AGENT_MAX_ITERATIONS", "many"));
        assert!(config(&bad).is_err());
    }
}
