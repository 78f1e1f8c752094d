//! 微服务共享的 seedwork 应用层（seedwork-application）
//!
//! 所有用例都以命令（写）或查询（读）的形式进入，经注册表路由到唯一的处理器：
//! - `CommandRegistry` / `QueryRegistry`：按请求的具体类型单一分发；
//! - `CommandOnEvent`：把远程领域事件翻译为命令，再次进入命令注册表。
//!
//! 注册表是显式构造的对象，在进程启动时装配并以引用注入 HTTP 层与事件处理器。
pub mod command;
pub mod command_bus;
pub mod command_handler;
pub mod command_registry;
pub mod context;
pub mod dto;
pub mod error;
pub mod event_bridge;
pub mod query;
pub mod query_bus;
pub mod query_handler;
pub mod query_registry;

pub use command_registry::CommandRegistry;
pub use event_bridge::CommandOnEvent;
pub use query_registry::QueryRegistry;

// 允许过程宏在本 crate 的测试中通过 ::seedwork_application 解析路径
extern crate self as seedwork_application;
