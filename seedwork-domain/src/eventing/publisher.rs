//! 外部发布者（EventPublisher）契约
//!
//! 分发器与具体 broker 之间唯一的集成点：替换 broker 或在测试中使用内存实现，
//! 只需实现 `publish` 一个能力。topic 即 `event.event_type()`，消息体为信封的 JSON。
//!
use crate::{domain_event::SerializedEvent, error::DomainResult as Result};
use async_trait::async_trait;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// 发布者名称（用于日志）
    fn publisher_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn publish(&self, event: &SerializedEvent) -> Result<()>;
}
