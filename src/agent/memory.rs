use super::model::ChatMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// In-process conversation checkpoints keyed by thread id. Nothing here
/// survives a restart.
#[derive(Default)]
pub struct CheckpointMemory {
    threads: RwLock<HashMap<String, Vec<ChatMessage>>>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CheckpointMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclusive use of `thread_id` until the guard is dropped.
    pub async fn lock_thread(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .await
            .entry(thread_id.to_string())
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    pub async fn load(&self, thread_id: &str) -> Vec<ChatMessage> {
        self.threads
            .read()
            .await
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn save(&self, thread_id: &str, history: Vec<ChatMessage>) {
        self.threads
            .write()
            .await
            .insert(thread_id.to_string(), history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn threads_are_independent() {
        let memory = CheckpointMemory::new();
        memory.save("a", vec![ChatMessage::user("hello")]).await;

        assert_eq!(memory.load("a").await, vec![ChatMessage::user("hello")]);
        assert!(memory.load("b").await.is_empty());
    }

    #[tokio::test]
    async fn thread_lock_is_per_thread() {
        let memory = CheckpointMemory::new();
        let held = memory.lock_thread("a").await;

        // Another thread is free while "a" is held.
        drop(memory.lock_thread("b").await);

        let waiting = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            memory.lock_thread("a"),
        )
        .await;
        assert!(waiting.is_err());

        drop(held);
        drop(memory.lock_thread("a").await);
    }
}
