//! 领域事件（Domain Event）与传输信封
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`）、随事件传播的业务上下文，
//! 以及事件在进程内分发与跨服务投递时共用的 `SerializedEvent`。

mod business_context;
mod domain_event_trait;
mod serialized_event;

pub use business_context::BusinessContext;
pub use domain_event_trait::DomainEvent;
pub use serialized_event::SerializedEvent;
