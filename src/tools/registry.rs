use super::aave::{SupplyToAaveTool, WithdrawFromAaveTool};
use super::balance::{GetBalanceTool, WalletDetailsTool};
use super::faucet::FaucetTool;
use super::transfer::TransferTool;
use super::{Tool, ToolContext, ToolError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is registered twice")]
    Duplicate(&'static str),
}

/// Name-keyed table of the tools the reasoning loop may call, in
/// registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wallet tools followed by the Aave tools. The faucet is only offered
    /// when one is configured.
    pub fn standard(faucet: Option<FaucetTool>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(WalletDetailsTool)?;
        registry.register(GetBalanceTool)?;
        registry.register(TransferTool)?;
        if let Some(faucet) = faucet {
            registry.register(faucet)?;
        }
        registry.register(SupplyToAaveTool)?;
        registry.register(WithdrawFromAaveTool)?;
        Ok(registry)
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        let name = tool.name();
        if self.index.contains_key(name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(Box::new(tool));
        Ok(())
    }

    pub fn all(&self) -> impl Iterator<Item = &dyn Tool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Runs a tool and turns any failure into the text the model reads.
    pub async fn dispatch(&self, name: &str, args: Value, ctx: &ToolContext) -> String {
        info!("dispatching tool {}", name);
        debug!("tool {} arguments: {}", name, args);

        let result = match self.get(name) {
            Some(tool) => tool.call(ctx, args).await,
            None => Err(ToolError::UnknownTool(name.to_string())),
        };

        match result {
            Ok(output) => output,
            Err(e) => {
                info!("tool {} failed: {}", name, e);
                e.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_keeps_registration_order() {
        let registry = ToolRegistry::standard(None).unwrap();
        let names: Vec<_> = registry.all().map(|t| t.name()).collect();
        assert_eq!(
            names,
            [
                "get_wallet_details",
                "get_balance",
                "transfer",
                "supply_to_aave",
                "withdrawal_from_aave"
            ]
        );
        assert!(registry.get("request_faucet_funds").is_none());
    }

    #[test]
    fn faucet_is_registered_when_configured() {
        let faucet = FaucetTool::new(
            reqwest::Client::new(),
            "http://localhost:9/faucet".parse().unwrap(),
        );
        let registry = ToolRegistry::standard(Some(faucet)).unwrap();
        assert_eq!(registry.len(), 6);
        assert!(registry.get("request_faucet_funds").is_some());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(SupplyToAaveTool).unwrap();
        assert_eq!(
            registry.register(SupplyToAaveTool),
            Err(RegistryError::Duplicate("supply_to_aave"))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn schemas_are_objects() {
        let registry = ToolRegistry::standard(None).unwrap();
        for tool in registry.all() {
            assert_eq!(tool.schema()["type"], "object", "{}", tool.name());
            assert!(!tool.description().is_empty());
        }
    }
}
