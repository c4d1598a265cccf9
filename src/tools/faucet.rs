use super::{Tool, ToolContext, ToolError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use url::Url;

const ACTION: &str = "requesting faucet funds";

#[derive(Deserialize)]
struct FaucetReply {
    transaction_hash: String,
}

/// Requests testnet ETH from an HTTP faucet.
pub struct FaucetTool {
    http: reqwest::Client,
    url: Url,
}

impl FaucetTool {
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }
}

#[async_trait::async_trait]
impl Tool for FaucetTool {
    fn name(&self) -> &'static str {
        "request_faucet_funds"
    }

    fn description(&self) -> &'static str {
        "Request test ETH from the faucet. Only works on base-sepolia."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn call(&self, ctx: &ToolContext, _args: Value) -> Result<String, ToolError> {
        let wallet = ctx.wallet.wallet();
        let network = wallet.network();
        if network.is_mainnet() {
            return Err(ToolError::Unsupported(format!(
                "The faucet is only available on base-sepolia, this wallet is on {network}"
            )));
        }

        info!("requesting faucet funds for {}", wallet.address());
        let response = self
            .http
            .post(self.url.clone())
            .json(&json!({
                "address": wallet.address().to_string(),
                "network_id": network.id()
            }))
            .send()
            .await
            .map_err(|e| ToolError::failed(ACTION, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::failed(
                ACTION,
                anyhow::anyhow!("faucet answered {status}: {body}"),
            ));
        }

        let reply: FaucetReply = response
            .json()
            .await
            .map_err(|e| ToolError::failed(ACTION, e))?;

        Ok(format!(
            "Received ETH from the faucet. Transaction: {}",
            reply.transaction_hash
        ))
    }
}
