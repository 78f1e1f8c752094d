//! 事件源（EventSource）
//!
//! broker 的消费侧：返回 'static 生命周期的事件流，便于在 tokio::spawn 中消费。
//!
use crate::{domain_event::SerializedEvent, error::DomainResult as Result};
use async_trait::async_trait;
use futures_core::stream::BoxStream;

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self) -> BoxStream<'static, Result<SerializedEvent>>;
}
