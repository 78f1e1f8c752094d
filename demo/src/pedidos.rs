//! 服务 pedidos：确认订单与订单状态流转，事件经 broker 发往其它服务
use crate::eventos::{PedidoConfirmado, PedidoEstadoCambiado};
use async_trait::async_trait;
use dashmap::DashMap;
use seedwork_application::command_handler::CommandHandler;
use seedwork_application::context::AppContext;
use seedwork_application::dto::Dto;
use seedwork_application::error::AppError;
use seedwork_application::query_handler::QueryHandler;
use seedwork_application::{CommandRegistry, QueryRegistry};
use seedwork_domain::eventing::{EventDispatcher, EventPublisher};
use seedwork_macros::{command, query};
use serde::Serialize;
use std::sync::Arc;

const ESTADOS: [&str; 4] = ["confirmado", "enviado", "entregado", "cancelado"];

#[derive(Debug, Clone, Serialize)]
pub struct PedidoDto {
    pub id: String,
    pub cliente: String,
    pub direccion: String,
    pub productos: Vec<String>,
    pub estado: String,
}

impl Dto for PedidoDto {}

#[command(output = PedidoDto)]
#[derive(Debug)]
pub struct ConfirmarPedido {
    pub pedido_id: String,
    pub cliente: String,
    pub direccion: String,
    pub productos: Vec<String>,
}

#[command(output = PedidoDto)]
#[derive(Debug)]
pub struct CambiarEstadoPedido {
    pub pedido_id: String,
    pub estado: String,
}

#[query(dto = PedidoDto)]
#[derive(Debug)]
pub struct ObtenerPedido {
    pub pedido_id: String,
}

#[derive(Default)]
pub struct Pedidos {
    rows: DashMap<String, PedidoDto>,
}

struct ConfirmarPedidoHandler {
    pedidos: Arc<Pedidos>,
    events: Arc<EventDispatcher>,
}

#[async_trait]
impl CommandHandler<ConfirmarPedido> for ConfirmarPedidoHandler {
    async fn handle(&self, ctx: &AppContext, cmd: ConfirmarPedido) -> Result<PedidoDto, AppError> {
        if cmd.productos.is_empty() {
            return Err(AppError::Validation("un pedido necesita productos".into()));
        }
        if self.pedidos.rows.contains_key(&cmd.pedido_id) {
            return Err(AppError::Validation(format!(
                "pedido {} ya confirmado",
                cmd.pedido_id
            )));
        }

        let dto = PedidoDto {
            id: cmd.pedido_id,
            cliente: cmd.cliente,
            direccion: cmd.direccion,
            productos: cmd.productos,
            estado: "confirmado".into(),
        };
        self.pedidos.rows.insert(dto.id.clone(), dto.clone());

        let event = PedidoConfirmado {
            pedido_id: dto.id.clone(),
            cliente: dto.cliente.clone(),
            direccion: dto.direccion.clone(),
            productos: dto.productos.clone(),
        };
        self.events.publish_in(&ctx.biz, &event).await;

        Ok(dto)
    }
}

struct CambiarEstadoPedidoHandler {
    pedidos: Arc<Pedidos>,
    events: Arc<EventDispatcher>,
}

#[async_trait]
impl CommandHandler<CambiarEstadoPedido> for CambiarEstadoPedidoHandler {
    async fn handle(
        &self,
        ctx: &AppContext,
        cmd: CambiarEstadoPedido,
    ) -> Result<PedidoDto, AppError> {
        if !ESTADOS.contains(&cmd.estado.as_str()) {
            return Err(AppError::Validation(format!("estado desconocido: {}", cmd.estado)));
        }

        // 先释放 DashMap 的写锁，再发布事件
        let (dto, anterior) = {
            let mut row = self
                .pedidos
                .rows
                .get_mut(&cmd.pedido_id)
                .ok_or_else(|| AppError::NotFound(format!("pedido {}", cmd.pedido_id)))?;
            let anterior = std::mem::replace(&mut row.estado, cmd.estado.clone());
            (row.clone(), anterior)
        };

        if anterior != dto.estado {
            let event = PedidoEstadoCambiado {
                pedido_id: dto.id.clone(),
                anterior,
                estado: dto.estado.clone(),
            };
            self.events.publish_in(&ctx.biz, &event).await;
        }

        Ok(dto)
    }
}

struct ObtenerPedidoHandler {
    pedidos: Arc<Pedidos>,
}

#[async_trait]
impl QueryHandler<ObtenerPedido> for ObtenerPedidoHandler {
    async fn handle(&self, _ctx: &AppContext, q: ObtenerPedido) -> Result<PedidoDto, AppError> {
        self.pedidos
            .rows
            .get(&q.pedido_id)
            .map(|row| row.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("pedido {}", q.pedido_id)))
    }
}

pub struct ServicioPedidos {
    pub commands: Arc<CommandRegistry>,
    pub queries: Arc<QueryRegistry>,
    pub events: Arc<EventDispatcher>,
}

impl ServicioPedidos {
    /// 装配服务：事件全部转交给 `broker`
    pub fn new(broker: Arc<dyn EventPublisher>) -> Result<Self, AppError> {
        let pedidos = Arc::new(Pedidos::default());
        let events = Arc::new(EventDispatcher::builder().bind_publisher(broker).build());

        let commands = CommandRegistry::new()
            .bind::<ConfirmarPedido, _>(Arc::new(ConfirmarPedidoHandler {
                pedidos: pedidos.clone(),
                events: events.clone(),
            }))?
            .bind::<CambiarEstadoPedido, _>(Arc::new(CambiarEstadoPedidoHandler {
                pedidos: pedidos.clone(),
                events: events.clone(),
            }))?;
        let queries = QueryRegistry::new()
            .bind::<ObtenerPedido, _>(Arc::new(ObtenerPedidoHandler { pedidos }))?;

        Ok(Self {
            commands: Arc::new(commands),
            queries: Arc::new(queries),
            events,
        })
    }
}
