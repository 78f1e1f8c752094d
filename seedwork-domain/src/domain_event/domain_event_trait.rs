use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;

/// 领域事件载荷需要满足的通用能力边界
///
/// 事件是已经发生的事实，创建后不再修改；字段即为跨服务传输时的扁平字段表。
pub trait DomainEvent:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// 稳定的事件类型名（如 `PedidoConfirmado`），既是本地路由键也是 broker 的 topic
    const EVENT_TYPE: &'static str;
}
