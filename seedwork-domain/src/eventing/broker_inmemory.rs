//! 内存版 broker（InMemoryBroker）
//!
//! 基于 `tokio::sync::broadcast` 的轻量实现，同时满足发布与订阅两侧的协议：
//! - `EventPublisher::publish`：克隆并广播事件信封；
//! - `EventSource::subscribe`：返回 `'static` 生命周期事件流，供 `EventRelay` 消费；
//! - 典型用途：测试环境、示例与本地开发。
//!
//! 注意：无订阅者时发送的事件会被丢弃，这与“至多一次”的投递语义一致。

use super::{EventPublisher, EventSource};
use crate::domain_event::SerializedEvent;
use crate::error::{DomainError, DomainResult as Result};
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// 广播缓冲区的默认容量
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Clone)]
pub struct InMemoryBroker {
    tx: broadcast::Sender<SerializedEvent>,
}

impl InMemoryBroker {
    /// 创建一个内存 broker，`capacity` 为广播缓冲区容量（至少为 1）
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for InMemoryBroker {
    fn publisher_name(&self) -> &str {
        "in-memory-broker"
    }

    async fn publish(&self, event: &SerializedEvent) -> Result<()> {
        // 若当前无订阅者，broadcast 的 send 会返回错误，这里视为非致命并忽略
        let receivers = self.tx.send(event.clone()).unwrap_or(0);
        tracing::debug!(
            topic = event.event_type(),
            event_id = event.event_id(),
            receivers,
            "event published to in-memory broker"
        );
        Ok(())
    }
}

#[async_trait]
impl EventSource for InMemoryBroker {
    async fn subscribe(&self) -> BoxStream<'static, Result<SerializedEvent>> {
        let rx = self.tx.subscribe();
        let stream =
            BroadcastStream::new(rx).map(|r| r.map_err(|e| DomainError::event_bus(e.to_string())));
        Box::pin(stream)
    }
}
