use seedwork_domain::domain_event::{BusinessContext, SerializedEvent};

/// 应用层上下文（Application Context）
///
/// 承载一次应用层调用（命令/查询）所需的横切信息，例如：
/// - 业务语境（`BusinessContext`）：关联追踪 `correlation_id`、因果链 `causation_id`、
///   执行者类型/ID 等，处理器发布事件时原样写入事件信封；
/// - 幂等键（`idempotency_key`）：由远程事件触发的命令会带上事件 ID，
///   便于处理器识别 broker 的重复投递。
///
/// 典型用法：
/// ```rust
/// use seedwork_application::context::AppContext;
/// use seedwork_domain::domain_event::BusinessContext;
///
/// let ctx = AppContext {
///     biz: BusinessContext::builder()
///         .maybe_correlation_id(Some("cor-123".into()))
///         .maybe_actor_type(Some("user".into()))
///         .maybe_actor_id(Some("u-1".into()))
///         .build(),
///     idempotency_key: Some("idem-xyz".into()),
/// };
/// assert_eq!(ctx.biz.actor_id(), Some("u-1"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 业务语境（链路追踪、审计主体、操作因果）
    pub biz: BusinessContext,
    /// 幂等键（可选）：为空则由上层或基础设施决定是否参与幂等
    pub idempotency_key: Option<String>,
}

impl AppContext {
    /// 由远程事件触发的调用：因果 ID 指向该事件，幂等键为事件 ID
    pub fn caused_by(event: &SerializedEvent) -> Self {
        Self {
            biz: event.causal_context(),
            idempotency_key: Some(event.event_id().to_string()),
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
