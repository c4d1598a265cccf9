use super::{
    parse_amount, schema_amount, submit_and_confirm, Tool, ToolContext, ToolError,
};
use crate::wallet::ContractInvocation;
use alloy::primitives::Address;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

const ACTION: &str = "transferring ETH";

pub struct TransferTool;

#[async_trait::async_trait]
impl Tool for TransferTool {
    fn name(&self) -> &'static str {
        "transfer"
    }

    fn description(&self) -> &'static str {
        "Transfer ETH from the agent's wallet to another onchain address. \
         Checks the balance first and waits for the transfer to be mined."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "amount": schema_amount("Amount of ETH to transfer (e.g. 0.01)"),
                "asset_id": {
                    "type": "string",
                    "description": "Asset to transfer. Only 'eth' is supported.",
                    "examples": ["eth"]
                },
                "destination": {
                    "type": "string",
                    "description": "The 0x-prefixed address receiving the ETH",
                    "examples": ["0x0000000000000000000000000000000000000001"]
                }
            },
            "required": ["amount", "destination"]
        })
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let name = self.name();
        let amount = parse_amount(name, args.get("amount"))?;

        let asset = args.get("asset_id").and_then(|v| v.as_str()).unwrap_or("eth");
        if !asset.eq_ignore_ascii_case("eth") {
            return Err(ToolError::InvalidInput {
                tool: name,
                reason: format!("asset '{asset}' is not supported, only 'eth'"),
            });
        }

        let destination = args
            .get("destination")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::InvalidInput {
                tool: name,
                reason: "missing required field 'destination'".into(),
            })?;
        let destination = Address::from_str(destination.trim()).map_err(|e| {
            ToolError::InvalidInput {
                tool: name,
                reason: format!("'{destination}' is not an address: {e}"),
            }
        })?;

        let _guard = ctx.wallet.lock().await;
        let wallet = ctx.wallet.wallet();

        let available = wallet
            .balance()
            .await
            .map_err(|e| ToolError::failed(ACTION, e))?;
        if available < amount {
            return Err(ToolError::InsufficientBalance {
                verb: "transfer",
                available,
                requested: amount,
            });
        }

        info!(amount_eth = %amount, destination = %destination, "transferring ETH");
        let invocation = ContractInvocation::native_transfer(destination, amount);
        let tx = submit_and_confirm(ctx, ACTION, &invocation).await?;

        Ok(format!(
            "Transferred {amount} ETH to {destination}.\nTransaction hash for the transfer: {tx}"
        ))
    }
}
