//! 事件子系统（eventing）
//!
//! 提供领域事件分发的基础抽象与运行时：
//! - `EventDispatcher`：按事件类型名扇出到本地处理器，再转交所有外部发布者；
//! - `EventHandler`：本地订阅者，可对同一事件类型注册多个；
//! - `EventPublisher`：外部投递契约，分发器只依赖这一个能力；
//! - `EventSource`：可订阅的事件流（broker 的消费侧）；
//! - `InMemoryBroker` / `EventRelay`：内存 broker 与入站 relay，把远程事件送回本地分发。
//!
//! 该模块仅定义协议与分发机制，不绑定具体传输实现。
//!
pub mod dispatcher;
pub mod handler;
pub mod publisher;
pub mod source;

#[cfg(feature = "eventing")]
pub mod broker_inmemory;
#[cfg(feature = "eventing")]
pub mod relay;

pub use dispatcher::{DispatchReport, EventDispatcher, EventDispatcherBuilder};
pub use handler::{DomainEventHandler, EventHandler, TypedEventHandler, typed};
pub use publisher::EventPublisher;
pub use source::EventSource;

#[cfg(feature = "eventing")]
pub use broker_inmemory::InMemoryBroker;
#[cfg(feature = "eventing")]
pub use relay::{EventRelay, RelayConfig, RelayHandle};
