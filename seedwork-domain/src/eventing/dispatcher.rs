//! 领域事件分发器（EventDispatcher）
//!
//! 维护两张进程级注册表：事件类型名 → 本地处理器列表，以及外部发布者列表。
//! 一次 `publish` 的顺序固定为：
//! 1. 按注册顺序依次调用该类型的全部本地处理器；
//! 2. 依次转交给每一个外部发布者。
//!
//! 单个处理器或发布者的失败（返回错误或 panic）只记录日志，不影响后续步骤，
//! 也不会返回给触发事件的调用方。跨调用之间不保证顺序，同一事件不做去重。
//!
use super::handler::{DomainEventHandler, EventHandler, typed};
use super::publisher::EventPublisher;
use crate::domain_event::{BusinessContext, DomainEvent, SerializedEvent};
use dashmap::DashMap;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

/// 一次扇出的统计结果，调用方可以忽略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub handlers_invoked: usize,
    pub handler_failures: usize,
    pub publishers_invoked: usize,
    pub publish_failures: usize,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.handler_failures == 0 && self.publish_failures == 0
    }
}

pub struct EventDispatcher {
    handlers: DashMap<String, Vec<Arc<dyn EventHandler>>>,
    publishers: RwLock<Vec<Arc<dyn EventPublisher>>>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self {
            handlers: DashMap::new(),
            publishers: RwLock::new(Vec::new()),
        }
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> EventDispatcherBuilder {
        EventDispatcherBuilder::default()
    }

    /// 追加一个本地处理器；同一事件类型可注册多个，按注册顺序调用
    pub fn register_handler(&self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let event_type = event_type.into();
        tracing::debug!(
            event_type = %event_type,
            handler = handler.handler_name(),
            "event handler registered"
        );
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// 以 `E::EVENT_TYPE` 注册强类型处理器
    pub fn subscribe<E, H>(&self, handler: H)
    where
        E: DomainEvent,
        H: DomainEventHandler<E> + 'static,
    {
        self.register_handler(E::EVENT_TYPE, typed::<E, H>(handler));
    }

    pub fn register_publisher(&self, publisher: Arc<dyn EventPublisher>) {
        tracing::debug!(
            publisher = publisher.publisher_name(),
            "event publisher registered"
        );
        self.publishers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(publisher);
    }

    /// 发布领域事件（不携带业务上下文）
    pub async fn publish<E>(&self, event: &E) -> DispatchReport
    where
        E: DomainEvent,
    {
        self.publish_in(&BusinessContext::default(), event).await
    }

    /// 发布领域事件，并把业务上下文写入信封
    ///
    /// 序列化失败时记录错误并直接返回，不做任何投递。
    pub async fn publish_in<E>(&self, biz: &BusinessContext, event: &E) -> DispatchReport
    where
        E: DomainEvent,
    {
        match SerializedEvent::from_event(event, biz) {
            Ok(serialized) => self.publish_serialized(&serialized).await,
            Err(err) => {
                tracing::error!(
                    event_type = E::EVENT_TYPE,
                    error = %err,
                    "failed to serialize domain event, nothing dispatched"
                );
                DispatchReport::default()
            }
        }
    }

    /// 本地扇出后转交全部外部发布者
    pub async fn publish_serialized(&self, event: &SerializedEvent) -> DispatchReport {
        let mut report = self.deliver_local(event).await;

        let publishers = self
            .publishers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for publisher in publishers {
            report.publishers_invoked += 1;

            let outcome = AssertUnwindSafe(publisher.publish(event))
                .catch_unwind()
                .await;

            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(panic) => panic_message(panic),
            };

            report.publish_failures += 1;
            tracing::error!(
                event_type = event.event_type(),
                event_id = event.event_id(),
                publisher = publisher.publisher_name(),
                error = %reason,
                "failed to forward event to external publisher"
            );
        }

        report
    }

    /// 只调用本地处理器，不转交外部发布者
    ///
    /// 用于经 broker 到达的远程事件，避免再次发布形成回环。
    pub async fn deliver_local(&self, event: &SerializedEvent) -> DispatchReport {
        let mut report = DispatchReport::default();

        // 先复制列表再调用，避免跨 await 持有 DashMap 的读锁
        let handlers = self
            .handlers
            .get(event.event_type())
            .map(|entry| entry.value().clone())
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::debug!(
                event_type = event.event_type(),
                "no local handlers for event"
            );
            return report;
        }

        for handler in handlers {
            report.handlers_invoked += 1;

            let outcome = AssertUnwindSafe(handler.handle(event))
                .catch_unwind()
                .await;

            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic),
            };

            report.handler_failures += 1;
            tracing::warn!(
                event_type = event.event_type(),
                event_id = event.event_id(),
                handler = handler.handler_name(),
                error = %reason,
                "local event handler failed"
            );
        }

        report
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .get(event_type)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    pub fn publisher_count(&self) -> usize {
        self.publishers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 已注册处理器的事件类型名列表（只读视图）
    pub fn event_types(&self) -> Vec<String> {
        self.handlers.iter().map(|e| e.key().clone()).collect()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

/// 进程启动时显式装配分发器
///
/// ```rust
/// use seedwork_domain::eventing::EventDispatcher;
///
/// let dispatcher = EventDispatcher::builder().build();
/// assert_eq!(dispatcher.publisher_count(), 0);
/// ```
#[derive(Default)]
pub struct EventDispatcherBuilder {
    handlers: Vec<(String, Arc<dyn EventHandler>)>,
    publishers: Vec<Arc<dyn EventPublisher>>,
}

impl EventDispatcherBuilder {
    pub fn bind_handler(
        mut self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        self.handlers.push((event_type.into(), handler));
        self
    }

    pub fn subscribe<E, H>(self, handler: H) -> Self
    where
        E: DomainEvent,
        H: DomainEventHandler<E> + 'static,
    {
        self.bind_handler(E::EVENT_TYPE, typed::<E, H>(handler))
    }

    pub fn bind_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn build(self) -> EventDispatcher {
        let dispatcher = EventDispatcher::new();
        for (event_type, handler) in self.handlers {
            dispatcher.register_handler(event_type, handler);
        }
        for publisher in self.publishers {
            dispatcher.register_publisher(publisher);
        }
        dispatcher
    }
}
