#![allow(dead_code)]

use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use onchain_agent_gateway::{
    agent::{
        model::{ChatMessage, ChatModel, ModelReply, ToolDescriptor},
        AgentRuntime, AgentSettings,
    },
    tools::{ToolContext, ToolRegistry},
    wallet::{ContractInvocation, Network, TxStatus, Wallet, WalletHandle},
};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const TX: TxHash = TxHash::repeat_byte(0xab);

pub enum Receipt {
    Mined,
    Reverted,
    Never,
    Fails,
    /// Mined once the gate is notified.
    Gated(Arc<Notify>),
}

/// Records every invocation instead of touching a chain.
pub struct MockWallet {
    pub address: Address,
    pub network: Network,
    pub balance: Decimal,
    pub receipt: Receipt,
    pub submit_error: Option<String>,
    pub invocations: Mutex<Vec<ContractInvocation>>,
}

impl MockWallet {
    pub fn new(network: Network, balance: Decimal) -> Self {
        Self {
            address: Address::repeat_byte(0x42),
            network,
            balance,
            receipt: Receipt::Mined,
            submit_error: None,
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipt = receipt;
        self
    }

    pub fn failing_submission(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<ContractInvocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Wallet for MockWallet {
    fn address(&self) -> Address {
        self.address
    }

    fn network(&self) -> Network {
        self.network
    }

    async fn balance(&self) -> Result<Decimal> {
        Ok(self.balance)
    }

    async fn invoke_contract(&self, invocation: &ContractInvocation) -> Result<TxHash> {
        if let Some(message) = &self.submit_error {
            anyhow::bail!("{message}");
        }
        self.invocations.lock().unwrap().push(invocation.clone());
        Ok(TX)
    }

    async fn wait_for_receipt(&self, _tx: TxHash) -> Result<TxStatus> {
        match &self.receipt {
            Receipt::Mined => Ok(TxStatus::Mined),
            Receipt::Gated(gate) => {
                gate.notified().await;
                Ok(TxStatus::Mined)
            }
            Receipt::Reverted => Ok(TxStatus::Reverted),
            Receipt::Fails => anyhow::bail!("connection reset"),
            Receipt::Never => std::future::pending().await,
        }
    }
}

/// Replays canned replies and keeps the transcripts it was sent.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelReply>>,
    pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    delay: Option<Duration>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Every turn takes `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _tools: &[ToolDescriptor],
    ) -> Result<ModelReply> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.seen.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("model script exhausted"))
    }
}

pub fn tool_context(wallet: Arc<MockWallet>) -> ToolContext {
    ToolContext {
        wallet: WalletHandle::new(wallet),
        confirmation_timeout: Duration::from_millis(200),
    }
}

pub fn runtime(model: Arc<ScriptedModel>, wallet: Arc<MockWallet>) -> AgentRuntime {
    AgentRuntime::new(
        model,
        ToolRegistry::standard(None).unwrap(),
        tool_context(wallet),
        AgentSettings {
            default_thread_id: "test-thread".into(),
            max_iterations: 5,
        },
    )
}
