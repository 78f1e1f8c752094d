//! 微服务共享的 seedwork 领域层（seedwork-domain）
//!
//! 提供跨服务复用的领域事件抽象与分发机制：
//! - 领域事件（`domain_event`）：事件载荷约束、业务上下文与传输信封 `SerializedEvent`
//! - 事件系统（`eventing`）：进程内分发器、外部发布者契约、内存 broker 与入站 relay
//!
//! 本 crate 不绑定任何具体的消息中间件，外部投递只依赖 `EventPublisher` 一个能力，
//! 以便各服务替换为 Kafka、NATS 或测试用的内存实现。
//!
//! 典型用法：
//! 1. 用 `#[domain_event]` 定义事件结构体，得到稳定的事件类型名；
//! 2. 进程启动时通过 `EventDispatcher::builder()` 绑定本地处理器与外部发布者；
//! 3. 命令处理器在状态变更成功后调用 `publish`，由分发器完成本地与外部的扇出；
//! 4. 消费方服务以 `EventRelay` 订阅 broker，将远程事件重新送入本地分发。
//!
pub mod domain_event;
pub mod error;
pub mod eventing;

// 允许在本 crate 内部通过 ::seedwork_domain 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::seedwork_domain 路径。
extern crate self as seedwork_domain;
