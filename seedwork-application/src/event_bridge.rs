//! 事件 → 命令桥接（CommandOnEvent）
//!
//! 消费方服务对远程事件的典型反应：把事件翻译为零个或多个命令，
//! 再经命令注册表执行。注册为普通的 `EventHandler`，因此失败由分发器记录并隔离。
//!
//! 一个事件需要触发多种命令时，为每种命令各注册一个桥接处理器。
//!
use crate::{
    command::Command, command_bus::CommandBus, command_registry::CommandRegistry,
    context::AppContext,
};
use anyhow::Context as _;
use async_trait::async_trait;
use seedwork_domain::domain_event::{DomainEvent, SerializedEvent};
use seedwork_domain::eventing::EventHandler;
use std::marker::PhantomData;
use std::sync::Arc;

pub struct CommandOnEvent<E, C, F> {
    name: String,
    commands: Arc<CommandRegistry>,
    translate: F,
    _marker: PhantomData<fn(E) -> C>,
}

impl<E, C, F> CommandOnEvent<E, C, F>
where
    E: DomainEvent,
    C: Command,
    F: Fn(E) -> Vec<C> + Send + Sync + 'static,
{
    pub fn new(commands: Arc<CommandRegistry>, translate: F) -> Self {
        Self {
            name: format!("{}->{}", E::EVENT_TYPE, C::NAME),
            commands,
            translate,
            _marker: PhantomData,
        }
    }

    pub fn into_handler(self) -> Arc<dyn EventHandler> {
        Arc::new(self)
    }
}

#[async_trait]
impl<E, C, F> EventHandler for CommandOnEvent<E, C, F>
where
    E: DomainEvent,
    C: Command,
    F: Fn(E) -> Vec<C> + Send + Sync + 'static,
{
    fn handler_name(&self) -> &str {
        &self.name
    }

    /// 依次执行翻译出的命令，遇到第一个错误即停止并返回
    async fn handle(&self, event: &SerializedEvent) -> anyhow::Result<()> {
        let decoded = event.decode::<E>()?;
        let commands = (self.translate)(decoded);

        for (idx, cmd) in commands.into_iter().enumerate() {
            let ctx = AppContext::caused_by(event)
                .with_idempotency_key(format!("{}#{idx}", event.event_id()));

            self.commands.execute(&ctx, cmd).await.with_context(|| {
                format!(
                    "command {} triggered by {} {}",
                    C::NAME,
                    event.event_type(),
                    event.event_id()
                )
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_handler::CommandHandler;
    use crate::error::AppError;
    use seedwork_domain::domain_event::BusinessContext;
    use seedwork_macros::{command, domain_event};
    use std::sync::Mutex;

    #[domain_event]
    struct PedidoConfirmado {
        pedido_id: String,
        productos: Vec<String>,
    }

    #[command]
    #[derive(Debug, Clone, PartialEq)]
    struct ReservarProducto {
        pedido_id: String,
        producto_id: String,
    }

    #[derive(Default)]
    struct Reservas {
        seen: Mutex<Vec<(ReservarProducto, AppContext)>>,
        reject: Option<&'static str>,
    }

    #[async_trait]
    impl CommandHandler<ReservarProducto> for Reservas {
        async fn handle(&self, ctx: &AppContext, cmd: ReservarProducto) -> Result<(), AppError> {
            if self.reject == Some(cmd.producto_id.as_str()) {
                return Err(AppError::Validation(format!("sin stock: {}", cmd.producto_id)));
            }
            self.seen.lock().unwrap().push((cmd, ctx.clone()));
            Ok(())
        }
    }

    fn bridge(
        reservas: Arc<Reservas>,
    ) -> CommandOnEvent<
        PedidoConfirmado,
        ReservarProducto,
        impl Fn(PedidoConfirmado) -> Vec<ReservarProducto> + Send + Sync + 'static,
    > {
        let commands = Arc::new(
            CommandRegistry::new()
                .bind::<ReservarProducto, _>(reservas)
                .unwrap(),
        );
        CommandOnEvent::new(commands, |ev: PedidoConfirmado| {
            ev.productos
                .into_iter()
                .map(|producto_id| ReservarProducto {
                    pedido_id: ev.pedido_id.clone(),
                    producto_id,
                })
                .collect::<Vec<_>>()
        })
    }

    fn envelope() -> SerializedEvent {
        let biz = BusinessContext::builder()
            .correlation_id("cor-1".to_string())
            .build();
        SerializedEvent::from_event(
            &PedidoConfirmado {
                pedido_id: "p-1".into(),
                productos: vec!["ibuprofeno".into(), "paracetamol".into()],
            },
            &biz,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn event_becomes_commands_with_causal_context() {
        let reservas = Arc::new(Reservas::default());
        let handler = bridge(reservas.clone());
        let event = envelope();

        handler.handle(&event).await.unwrap();

        let seen = reservas.seen.lock().unwrap();
        assert_eq!(handler.handler_name(), "PedidoConfirmado->ReservarProducto");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0.producto_id, "ibuprofeno");
        assert_eq!(seen[1].0.producto_id, "paracetamol");
        let ctx = &seen[0].1;
        assert_eq!(ctx.biz.correlation_id(), Some("cor-1"));
        assert_eq!(ctx.biz.causation_id(), Some(event.event_id()));
        assert_eq!(
            seen[1].1.idempotency_key.as_deref(),
            Some(format!("{}#1", event.event_id()).as_str())
        );
    }

    #[tokio::test]
    async fn first_command_error_stops_and_is_reported() {
        let reservas = Arc::new(Reservas {
            reject: Some("ibuprofeno"),
            ..Default::default()
        });
        let handler = bridge(reservas.clone());

        let err = handler.handle(&envelope()).await.unwrap_err();

        assert!(format!("{err:#}").contains("sin stock: ibuprofeno"));
        assert!(reservas.seen.lock().unwrap().is_empty());
    }
}
