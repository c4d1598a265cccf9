use super::{Tool, ToolContext, ToolError};
use serde_json::{json, Value};

pub struct WalletDetailsTool;

#[async_trait::async_trait]
impl Tool for WalletDetailsTool {
    fn name(&self) -> &'static str {
        "get_wallet_details"
    }

    fn description(&self) -> &'static str {
        "Get the address of the agent's wallet and the network it is on. Call this before the first onchain action."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn call(&self, ctx: &ToolContext, _args: Value) -> Result<String, ToolError> {
        let wallet = ctx.wallet.wallet();
        Ok(format!(
            "Wallet: {} on network: {}",
            wallet.address(),
            wallet.network()
        ))
    }
}

pub struct GetBalanceTool;

#[async_trait::async_trait]
impl Tool for GetBalanceTool {
    fn name(&self) -> &'static str {
        "get_balance"
    }

    fn description(&self) -> &'static str {
        "Get the ETH balance of the agent's wallet"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "asset_id": {
                    "type": "string",
                    "description": "Asset to check. Only 'eth' is supported; defaults to 'eth'.",
                    "examples": ["eth"]
                }
            }
        })
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let asset = args
            .get("asset_id")
            .and_then(|v| v.as_str())
            .unwrap_or("eth");
        if !asset.eq_ignore_ascii_case("eth") {
            return Err(ToolError::Unsupported(format!(
                "Balances for asset '{asset}' are not supported, only 'eth'"
            )));
        }

        let wallet = ctx.wallet.wallet();
        let balance = wallet
            .balance()
            .await
            .map_err(|e| ToolError::failed("getting the ETH balance", e))?;

        Ok(format!("Balances for wallet {}:\n  eth: {balance}", wallet.address()))
    }
}
