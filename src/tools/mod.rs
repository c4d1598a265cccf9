pub mod aave;
pub mod balance;
pub mod faucet;
pub mod registry;
pub mod transfer;

use crate::units::to_base_units;
use crate::wallet::{ContractInvocation, TxStatus, WalletHandle};
use alloy::primitives::TxHash;
use rust_decimal::Decimal;
use serde_json::{value::RawValue, Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

pub use registry::{RegistryError, ToolRegistry};

/// What every tool call gets to work with.
#[derive(Clone)]
pub struct ToolContext {
    pub wallet: WalletHandle,
    pub confirmation_timeout: Duration,
}

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> Value;
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError>;
}

/// Failures a tool reports back to the reasoning loop.
///
/// `Display` is the narrative the model sees, so every variant reads as a
/// sentence it can relay to the user.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidInput { tool: &'static str, reason: String },

    #[error("Tool {0} is not available")]
    UnknownTool(String),

    #[error("Insufficient ETH balance. You have {available} ETH, but tried to {verb} {requested} ETH")]
    InsufficientBalance {
        verb: &'static str,
        available: Decimal,
        requested: Decimal,
    },

    #[error("{0}")]
    Unsupported(String),

    #[error("Error {action}: {cause:#}")]
    Failed {
        action: &'static str,
        cause: anyhow::Error,
    },

    #[error("Error {action}: transaction {tx} reverted")]
    Reverted { action: &'static str, tx: TxHash },

    #[error(
        "Error {action}: transaction {tx} was submitted but not confirmed within {}s. \
         It may still be mined; check its status before trying again, resubmitting could duplicate the transfer",
        .timeout.as_secs()
    )]
    Unconfirmed {
        action: &'static str,
        tx: TxHash,
        timeout: Duration,
    },

    #[error(
        "Error {action}: transaction {tx} was submitted but its status could not be read ({cause:#}). \
         Check it before trying again, resubmitting could duplicate the transfer"
    )]
    StatusUnknown {
        action: &'static str,
        tx: TxHash,
        cause: anyhow::Error,
    },
}

impl ToolError {
    pub fn failed(action: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        ToolError::Failed {
            action,
            cause: cause.into(),
        }
    }
}

/// A strictly positive ETH amount, parsed from a JSON number or string
/// without passing through `f64` arithmetic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmountInput {
    pub amount: Decimal,
}

impl AmountInput {
    pub fn from_args(tool: &'static str, args: &Value) -> Result<Self, ToolError> {
        let amount = parse_amount(tool, args.get("amount"))?;
        Ok(Self { amount })
    }
}

/// Parses model-supplied tool arguments.
///
/// Top-level number literals are kept as their exact digits (as JSON
/// strings) so amounts never round through `f64`. Anything that is not an
/// object is parsed as plain JSON and left for the tool to reject.
pub fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    let Ok(fields) = serde_json::from_str::<HashMap<String, Box<RawValue>>>(raw) else {
        return serde_json::from_str(raw);
    };

    fields
        .into_iter()
        .map(|(key, value)| {
            let text = value.get().trim();
            let parsed = if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
                Value::String(text.to_string())
            } else {
                serde_json::from_str(text)?
            };
            Ok((key, parsed))
        })
        .collect::<Result<Map<String, Value>, serde_json::Error>>()
        .map(Value::Object)
}

pub(crate) fn parse_amount(tool: &'static str, value: Option<&Value>) -> Result<Decimal, ToolError> {
    let invalid = |reason: String| ToolError::InvalidInput { tool, reason };

    let text = match value {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => return Err(invalid(format!("amount must be a number, got {other}"))),
        None => return Err(invalid("missing required field 'amount'".into())),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| invalid(format!("'{text}' is not a decimal amount")))?;

    if amount <= Decimal::ZERO {
        return Err(invalid(format!("amount must be greater than 0, got {amount}")));
    }
    if to_base_units(amount).is_zero() {
        return Err(invalid(format!("amount {amount} ETH is less than 1 wei")));
    }
    Ok(amount)
}

pub(crate) fn schema_amount(description: &str) -> Value {
    serde_json::json!({
        "type": "number",
        "description": description,
        "exclusiveMinimum": 0,
        "examples": [0.1]
    })
}

/// Submits `invocation` and waits for it to resolve under the configured
/// timeout. Callers hold the wallet lock across this call.
pub(crate) async fn submit_and_confirm(
    ctx: &ToolContext,
    action: &'static str,
    invocation: &ContractInvocation,
) -> Result<TxHash, ToolError> {
    let wallet = ctx.wallet.wallet();

    let tx = wallet
        .invoke_contract(invocation)
        .await
        .map_err(|e| ToolError::failed(action, e))?;
    info!("submitted {} transaction {}", invocation.method, tx);

    match tokio::time::timeout(ctx.confirmation_timeout, wallet.wait_for_receipt(tx)).await {
        Ok(Ok(TxStatus::Mined)) => Ok(tx),
        Ok(Ok(TxStatus::Reverted)) => {
            warn!("transaction {} reverted", tx);
            Err(ToolError::Reverted { action, tx })
        }
        Ok(Err(cause)) => {
            warn!("could not read receipt for {}: {:#}", tx, cause);
            Err(ToolError::StatusUnknown { action, tx, cause })
        }
        Err(_) => {
            warn!(
                "transaction {} unconfirmed after {}s",
                tx,
                ctx.confirmation_timeout.as_secs()
            );
            Err(ToolError::Unconfirmed {
                action,
                tx,
                timeout: ctx.confirmation_timeout,
            })
        }
    }
}
