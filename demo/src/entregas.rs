//! 服务 entregas：订单确认时创建配送单，订单状态变化时同步配送状态
use crate::eventos::{PedidoConfirmado, PedidoEstadoCambiado};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use seedwork_application::command_handler::CommandHandler;
use seedwork_application::context::AppContext;
use seedwork_application::dto::Dto;
use seedwork_application::error::AppError;
use seedwork_application::query_handler::QueryHandler;
use seedwork_application::{CommandOnEvent, CommandRegistry, QueryRegistry};
use seedwork_domain::eventing::{EventDispatcher, EventRelay, EventSource, RelayConfig};
use seedwork_macros::{command, query};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct EntregaDto {
    pub id: String,
    pub pedido_id: String,
    pub direccion: String,
    pub estado: String,
    pub actualizada_en: DateTime<Utc>,
}

impl Dto for EntregaDto {}

#[command(output = EntregaDto)]
#[derive(Debug)]
pub struct CrearEntrega {
    pub pedido_id: String,
    pub direccion: String,
}

#[command]
#[derive(Debug)]
pub struct ActualizarEntrega {
    pub pedido_id: String,
    pub estado: String,
}

#[query(dto = EntregaDto)]
#[derive(Debug)]
pub struct ObtenerEntrega {
    pub pedido_id: String,
}

/// 按 pedido_id 索引的配送单
#[derive(Default)]
pub struct Entregas {
    rows: DashMap<String, EntregaDto>,
}

struct CrearEntregaHandler {
    entregas: Arc<Entregas>,
}

#[async_trait]
impl CommandHandler<CrearEntrega> for CrearEntregaHandler {
    async fn handle(&self, _ctx: &AppContext, cmd: CrearEntrega) -> Result<EntregaDto, AppError> {
        // 重复投递时返回已存在的配送单
        let dto = match self.entregas.rows.entry(cmd.pedido_id.clone()) {
            Entry::Occupied(row) => row.get().clone(),
            Entry::Vacant(slot) => {
                let dto = EntregaDto {
                    id: Uuid::new_v4().to_string(),
                    pedido_id: cmd.pedido_id,
                    direccion: cmd.direccion,
                    estado: "pendiente".into(),
                    actualizada_en: Utc::now(),
                };
                slot.insert(dto.clone());
                tracing::info!(pedido_id = %dto.pedido_id, entrega_id = %dto.id, "entrega creada");
                dto
            }
        };
        Ok(dto)
    }
}

struct ActualizarEntregaHandler {
    entregas: Arc<Entregas>,
}

#[async_trait]
impl CommandHandler<ActualizarEntrega> for ActualizarEntregaHandler {
    async fn handle(&self, _ctx: &AppContext, cmd: ActualizarEntrega) -> Result<(), AppError> {
        let mut row = self
            .entregas
            .rows
            .get_mut(&cmd.pedido_id)
            .ok_or_else(|| AppError::NotFound(format!("entrega del pedido {}", cmd.pedido_id)))?;

        let estado = match cmd.estado.as_str() {
            "enviado" => "en_ruta",
            "entregado" => "entregada",
            "cancelado" => "anulada",
            _ => "pendiente",
        };
        row.estado = estado.to_string();
        row.actualizada_en = Utc::now();

        tracing::info!(pedido_id = %cmd.pedido_id, estado, "entrega actualizada");
        Ok(())
    }
}

struct ObtenerEntregaHandler {
    entregas: Arc<Entregas>,
}

#[async_trait]
impl QueryHandler<ObtenerEntrega> for ObtenerEntregaHandler {
    async fn handle(&self, _ctx: &AppContext, q: ObtenerEntrega) -> Result<EntregaDto, AppError> {
        self.entregas
            .rows
            .get(&q.pedido_id)
            .map(|row| row.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("entrega del pedido {}", q.pedido_id)))
    }
}

pub struct ServicioEntregas {
    pub commands: Arc<CommandRegistry>,
    pub queries: Arc<QueryRegistry>,
    pub events: Arc<EventDispatcher>,
}

impl ServicioEntregas {
    pub fn new() -> Result<Self, AppError> {
        let entregas = Arc::new(Entregas::default());

        let commands = Arc::new(
            CommandRegistry::new()
                .bind::<CrearEntrega, _>(Arc::new(CrearEntregaHandler {
                    entregas: entregas.clone(),
                }))?
                .bind::<ActualizarEntrega, _>(Arc::new(ActualizarEntregaHandler {
                    entregas: entregas.clone(),
                }))?,
        );
        let queries = Arc::new(
            QueryRegistry::new()
                .bind::<ObtenerEntrega, _>(Arc::new(ObtenerEntregaHandler { entregas }))?,
        );

        let crear = CommandOnEvent::new(commands.clone(), |ev: PedidoConfirmado| {
            vec![CrearEntrega {
                pedido_id: ev.pedido_id,
                direccion: ev.direccion,
            }]
        });
        let actualizar = CommandOnEvent::new(commands.clone(), |ev: PedidoEstadoCambiado| {
            vec![ActualizarEntrega {
                pedido_id: ev.pedido_id,
                estado: ev.estado,
            }]
        });
        let events = Arc::new(
            EventDispatcher::builder()
                .bind_handler("PedidoConfirmado", crear.into_handler())
                .bind_handler("PedidoEstadoCambiado", actualizar.into_handler())
                .build(),
        );

        Ok(Self {
            commands,
            queries,
            events,
        })
    }

    pub fn relay(&self, source: Arc<dyn EventSource>) -> Arc<EventRelay> {
        Arc::new(
            EventRelay::builder()
                .source(source)
                .dispatcher(self.events.clone())
                .config(RelayConfig::topics([
                    "PedidoConfirmado",
                    "PedidoEstadoCambiado",
                ]))
                .build(),
        )
    }
}
