//! 事件传输信封（SerializedEvent）
//!
//! 事件在分发器、外部发布者与入站 relay 之间流转的统一形态：
//! - `event_type` 为稳定的事件类型名，同时作为 broker 的 topic / 路由键；
//! - `payload` 为事件声明字段的扁平 JSON 对象（id 为字符串、时间为 ISO-8601、金额为十进制数）；
//! - 其余字段为事件元数据，便于消费方还原因果链。
//!
use super::{BusinessContext, DomainEvent};
use crate::error::{DomainError, DomainResult};
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct SerializedEvent {
    /// 事件唯一标识符
    #[builder(default = Uuid::new_v4().to_string())]
    event_id: String,
    /// 事件类型，用于路由与 topic 命名
    #[builder(into)]
    event_type: String,
    /// 事件发生时间
    #[builder(default = Utc::now())]
    occurred_at: DateTime<Utc>,
    /// 关联 ID，用于将多个事件关联到同一个业务操作
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    /// 因果 ID，用于表示事件的触发来源
    #[serde(default, skip_serializing_if = "Option::is_none")]
    causation_id: Option<String>,
    /// 触发事件的主体类型（如用户、系统等）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor_type: Option<String>,
    /// 触发事件的主体 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor_id: Option<String>,
    /// 事件负载：扁平字段表
    payload: Value,
}

impl SerializedEvent {
    /// 将领域事件与业务上下文封装为信封
    ///
    /// 事件必须序列化为 JSON 对象（具名字段结构体），否则返回 `InvalidValue`。
    pub fn from_event<E>(event: &E, biz: &BusinessContext) -> DomainResult<Self>
    where
        E: DomainEvent,
    {
        let payload = serde_json::to_value(event)?;
        if !payload.is_object() {
            return Err(DomainError::invalid_value(format!(
                "event {} must serialize to a field map, got {}",
                E::EVENT_TYPE,
                payload
            )));
        }

        Ok(Self::builder()
            .event_type(E::EVENT_TYPE)
            .maybe_correlation_id(biz.correlation_id().map(str::to_owned))
            .maybe_causation_id(biz.causation_id().map(str::to_owned))
            .maybe_actor_type(biz.actor_type().map(str::to_owned))
            .maybe_actor_id(biz.actor_id().map(str::to_owned))
            .payload(payload)
            .build())
    }

    /// 还原为具体事件类型；类型名不一致时返回 `TypeMismatch`
    pub fn decode<E>(&self) -> DomainResult<E>
    where
        E: DomainEvent,
    {
        if self.event_type != E::EVENT_TYPE {
            return Err(DomainError::TypeMismatch {
                expected: E::EVENT_TYPE.to_string(),
                found: self.event_type.clone(),
            });
        }

        Ok(serde_json::from_value(self.payload.clone())?)
    }

    pub fn to_bytes(&self) -> DomainResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> DomainResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// 事件自身携带的业务上下文
    pub fn business_context(&self) -> BusinessContext {
        BusinessContext::builder()
            .maybe_correlation_id(self.correlation_id.clone())
            .maybe_causation_id(self.causation_id.clone())
            .maybe_actor_type(self.actor_type.clone())
            .maybe_actor_id(self.actor_id.clone())
            .build()
    }

    /// 由本事件触发的后续操作所用的上下文：
    /// 因果 ID 指向本事件，关联 ID 沿用（缺失时以本事件 ID 开启新的关联链）
    pub fn causal_context(&self) -> BusinessContext {
        let correlation_id = self
            .correlation_id
            .clone()
            .unwrap_or_else(|| self.event_id.clone());

        BusinessContext::builder()
            .correlation_id(correlation_id)
            .causation_id(self.event_id.clone())
            .maybe_actor_type(self.actor_type.clone())
            .maybe_actor_id(self.actor_id.clone())
            .build()
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn actor_type(&self) -> Option<&str> {
        self.actor_type.as_deref()
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwork_macros::domain_event;

    #[domain_event(name = "PedidoConfirmado")]
    struct PedidoConfirmado {
        pedido_id: String,
        cliente_id: String,
        total: f64,
        fecha: DateTime<Utc>,
    }

    #[domain_event]
    struct PedidoEntregado {
        pedido_id: String,
    }

    fn confirmado() -> PedidoConfirmado {
        PedidoConfirmado {
            pedido_id: "p-1".into(),
            cliente_id: "c-9".into(),
            total: 125.5,
            fecha: "2024-05-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn payload_is_flat_field_map_with_iso_timestamps() {
        let ev = SerializedEvent::from_event(&confirmado(), &BusinessContext::default()).unwrap();

        assert_eq!(ev.event_type(), "PedidoConfirmado");
        assert_eq!(ev.payload()["pedido_id"], "p-1");
        assert_eq!(ev.payload()["total"], 125.5);
        assert_eq!(ev.payload()["fecha"], "2024-05-01T10:00:00Z");
        assert!(Uuid::parse_str(ev.event_id()).is_ok());
    }

    #[test]
    fn carries_business_context() {
        let biz = BusinessContext::builder()
            .correlation_id("cor-1".to_string())
            .actor_type("user".to_string())
            .build();
        let ev = SerializedEvent::from_event(&confirmado(), &biz).unwrap();

        assert_eq!(ev.correlation_id(), Some("cor-1"));
        assert_eq!(ev.causation_id(), None);
        assert_eq!(ev.business_context(), biz);
    }

    #[test]
    fn decode_rejects_other_event_type() {
        let ev = SerializedEvent::from_event(&confirmado(), &BusinessContext::default()).unwrap();

        let err = ev.decode::<PedidoEntregado>().unwrap_err();
        match err {
            DomainError::TypeMismatch { expected, found } => {
                assert_eq!(expected, "PedidoEntregado");
                assert_eq!(found, "PedidoConfirmado");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(ev.decode::<PedidoConfirmado>().unwrap(), confirmado());
    }

    #[test]
    fn wire_bytes_reconstruct_the_event() {
        let ev = SerializedEvent::from_event(&confirmado(), &BusinessContext::default()).unwrap();
        let bytes = ev.to_bytes().unwrap();

        let back = SerializedEvent::from_bytes(&bytes).unwrap();
        assert_eq!(back, ev);

        // 消费方无需共享代码即可读取字段
        let raw: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(raw["event_type"], "PedidoConfirmado");
        assert_eq!(raw["payload"]["cliente_id"], "c-9");
        assert!(raw.get("correlation_id").is_none());
    }

    #[test]
    fn causal_context_links_follow_up_work() {
        let ev = SerializedEvent::builder()
            .event_id("e-1".to_string())
            .event_type("PedidoConfirmado")
            .correlation_id("cor-7".to_string())
            .actor_id("u-1".to_string())
            .payload(serde_json::json!({}))
            .build();

        let next = ev.causal_context();
        assert_eq!(next.correlation_id(), Some("cor-7"));
        assert_eq!(next.causation_id(), Some("e-1"));
        assert_eq!(next.actor_id(), Some("u-1"));

        let orphan = SerializedEvent::builder()
            .event_id("e-2".to_string())
            .event_type("PedidoConfirmado")
            .payload(serde_json::json!({}))
            .build();
        assert_eq!(orphan.causal_context().correlation_id(), Some("e-2"));
    }
}
