//! 事件处理器（EventHandler）
//!
//! 本地订阅者按事件类型名注册到分发器。处理器接收传输信封，
//! 因此同一个处理器既能消费本进程发布的事件，也能消费经 broker 到达的远程事件。
//!
use crate::domain_event::{DomainEvent, SerializedEvent};
use crate::error::DomainError;
use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;

/// 事件处理器：处理某一类型的事件
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// 处理器名称（用于日志与审计）
    fn handler_name(&self) -> &str;
    /// 处理事件
    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()>;
}

/// 强类型事件处理器：由 [`typed`] 适配为 [`EventHandler`]，载荷在调用前解码
#[async_trait]
pub trait DomainEventHandler<E>: Send + Sync
where
    E: DomainEvent,
{
    fn handler_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// `envelope` 为原始信封，可用于读取因果链等元数据
    async fn handle(&self, event: E, envelope: &SerializedEvent) -> anyhow::Result<()>;
}

/// 将强类型处理器适配为按信封分发的处理器
pub struct TypedEventHandler<E, H> {
    inner: H,
    _event: PhantomData<fn() -> E>,
}

impl<E, H> TypedEventHandler<E, H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _event: PhantomData,
        }
    }
}

pub fn typed<E, H>(handler: H) -> Arc<dyn EventHandler>
where
    E: DomainEvent,
    H: DomainEventHandler<E> + 'static,
{
    Arc::new(TypedEventHandler::<E, H>::new(handler))
}

#[async_trait]
impl<E, H> EventHandler for TypedEventHandler<E, H>
where
    E: DomainEvent,
    H: DomainEventHandler<E>,
{
    fn handler_name(&self) -> &str {
        <H as DomainEventHandler<E>>::handler_name(&self.inner)
    }

    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        let decoded = event
            .decode::<E>()
            .map_err(|err| DomainError::EventHandler {
                handler: self.handler_name().to_string(),
                reason: err.to_string(),
            })?;
        <H as DomainEventHandler<E>>::handle(&self.inner, decoded, event).await
    }
}
