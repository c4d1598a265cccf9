//! Aave V3 supply and withdrawal of native ETH through the WETH gateway on Base.

use super::{schema_amount, submit_and_confirm, AmountInput, Tool, ToolContext, ToolError};
use crate::units::to_base_units;
use crate::wallet::{ContractInvocation, Network};
use alloy::{
    primitives::{address, Address},
    sol,
    sol_types::SolCall,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;

sol! {
    #[allow(missing_docs)]
    function depositETH(address lendingPool, address onBehalfOf, uint16 referralCode) external payable;
    #[allow(missing_docs)]
    function withdrawETH(address lendingPool, uint256 amount, address to) external;
}

pub const WETH_GATEWAY: Address = address!("d5DDE725b0A2dE43fBDb4E488A7fdA389210d461");
pub const POOL_MAINNET: Address = address!("A238Dd80C259a72e81d7e4664a9801593F98d1c5");
pub const POOL_TESTNET: Address = address!("bE781D7Bdf469f3d94a62Cdcc407aCe106AEcA74");

pub fn pool_address(network: Network) -> Address {
    if network.is_mainnet() {
        POOL_MAINNET
    } else {
        POOL_TESTNET
    }
}

const SUPPLY_DESCRIPTION: &str = "\
This tool supplies ETH to the Aave V3 protocol through the WETH Gateway on Base.
The supplied ETH is wrapped to WETH by the gateway before it reaches the pool.
Mainnet and testnet are selected automatically from the wallet's network.
Use this tool when you want to:
- Supply ETH to Aave to earn interest
- Provide collateral for potential borrowing
- Participate in the Aave lending protocol
The tool will:
1. Check that the wallet holds enough ETH
2. Convert the ETH amount to wei
3. Supply the ETH through Aave's WETH Gateway
4. Return the transaction status and hash";

const WITHDRAW_DESCRIPTION: &str = "\
This tool withdraws ETH from the Aave V3 protocol through the WETH Gateway on Base.
Mainnet and testnet are selected automatically from the wallet's network.
Use this tool when you want to:
- Withdraw supplied ETH from Aave back to the wallet
- Withdraw collateral
The tool will:
1. Convert the ETH amount to wei
2. Withdraw the ETH through Aave's WETH Gateway
3. Return the transaction status and hash";

const SUPPLY_ACTION: &str = "supplying ETH to Aave";
const WITHDRAW_ACTION: &str = "withdrawing ETH from Aave";

fn amount_schema(verb: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "amount": schema_amount(&format!(
                "Amount of ETH to {verb} in ETH units (e.g. 0.1 for 0.1 ETH)"
            ))
        },
        "required": ["amount"]
    })
}

pub struct SupplyToAaveTool;

impl SupplyToAaveTool {
    /// Supplies `amount` ETH and always answers with text, success or not.
    pub async fn execute(&self, ctx: &ToolContext, amount: Decimal) -> String {
        match self.supply(ctx, amount).await {
            Ok(message) => message,
            Err(e) => e.to_string(),
        }
    }

    async fn supply(&self, ctx: &ToolContext, amount: Decimal) -> Result<String, ToolError> {
        let _guard = ctx.wallet.lock().await;
        let wallet = ctx.wallet.wallet();
        let network = wallet.network();
        let pool = pool_address(network);

        let available = wallet
            .balance()
            .await
            .map_err(|e| ToolError::failed(SUPPLY_ACTION, e))?;
        if available < amount {
            return Err(ToolError::InsufficientBalance {
                verb: "supply",
                available,
                requested: amount,
            });
        }

        let amount_wei = to_base_units(amount);
        info!(
            amount_eth = %amount,
            amount_wei = %amount_wei,
            gateway = %WETH_GATEWAY,
            pool = %pool,
            wallet = %wallet.address(),
            "supplying ETH to Aave"
        );

        let invocation = deposit_invocation(pool, wallet.address(), amount);
        let tx = submit_and_confirm(ctx, SUPPLY_ACTION, &invocation).await?;

        Ok(format!(
            "Successfully supplied {amount} ETH to Aave on Base {} with tx: {tx}",
            network.label()
        ))
    }
}

fn deposit_invocation(pool: Address, on_behalf_of: Address, amount: Decimal) -> ContractInvocation {
    let call = depositETHCall {
        lendingPool: pool,
        onBehalfOf: on_behalf_of,
        referralCode: 0,
    };
    ContractInvocation {
        contract: WETH_GATEWAY,
        method: "depositETH",
        args: vec![
            ("lendingPool", pool.to_string()),
            ("onBehalfOf", on_behalf_of.to_string()),
            ("referralCode", "0".to_string()),
        ],
        value: amount,
        calldata: call.abi_encode().into(),
    }
}

#[async_trait::async_trait]
impl Tool for SupplyToAaveTool {
    fn name(&self) -> &'static str {
        "supply_to_aave"
    }

    fn description(&self) -> &'static str {
        SUPPLY_DESCRIPTION
    }

    fn schema(&self) -> Value {
        amount_schema("supply")
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let input = AmountInput::from_args(self.name(), &args)?;
        self.supply(ctx, input.amount).await
    }
}

pub struct WithdrawFromAaveTool;

impl WithdrawFromAaveTool {
    pub async fn execute(&self, ctx: &ToolContext, amount: Decimal) -> String {
        match self.withdraw(ctx, amount).await {
            Ok(message) => message,
            Err(e) => e.to_string(),
        }
    }

    // No balance precheck: the pool enforces the withdrawable amount.
    async fn withdraw(&self, ctx: &ToolContext, amount: Decimal) -> Result<String, ToolError> {
        let _guard = ctx.wallet.lock().await;
        let wallet = ctx.wallet.wallet();
        let network = wallet.network();
        let pool = pool_address(network);

        let invocation = withdraw_invocation(pool, wallet.address(), amount);
        info!(
            amount_eth = %amount,
            amount_wei = invocation.arg("amount").unwrap_or_default(),
            gateway = %WETH_GATEWAY,
            pool = %pool,
            wallet = %wallet.address(),
            "withdrawing ETH from Aave"
        );

        let tx = submit_and_confirm(ctx, WITHDRAW_ACTION, &invocation).await?;

        Ok(format!(
            "Successfully withdrew {amount} ETH from Aave on Base {} with tx: {tx}",
            network.label()
        ))
    }
}

fn withdraw_invocation(pool: Address, to: Address, amount: Decimal) -> ContractInvocation {
    let amount_wei = to_base_units(amount);
    let call = withdrawETHCall {
        lendingPool: pool,
        amount: amount_wei,
        to,
    };
    ContractInvocation {
        contract: WETH_GATEWAY,
        method: "withdrawETH",
        args: vec![
            ("lendingPool", pool.to_string()),
            ("amount", amount_wei.to_string()),
            ("to", to.to_string()),
        ],
        // withdrawETH is nonpayable
        value: Decimal::ZERO,
        calldata: call.abi_encode().into(),
    }
}

#[async_trait::async_trait]
impl Tool for WithdrawFromAaveTool {
    fn name(&self) -> &'static str {
        "withdrawal_from_aave"
    }

    fn description(&self) -> &'static str {
        WITHDRAW_DESCRIPTION
    }

    fn schema(&self) -> Value {
        amount_schema("withdraw")
    }

    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<String, ToolError> {
        let input = AmountInput::from_args(self.name(), &args)?;
        self.withdraw(ctx, input.amount).await
    }
}
