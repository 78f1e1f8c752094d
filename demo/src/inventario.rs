//! 服务 inventario：订单确认后为每个产品预留库存
use crate::eventos::PedidoConfirmado;
use async_trait::async_trait;
use dashmap::DashMap;
use seedwork_application::command_handler::CommandHandler;
use seedwork_application::context::AppContext;
use seedwork_application::dto::Dto;
use seedwork_application::error::AppError;
use seedwork_application::query_handler::QueryHandler;
use seedwork_application::{CommandOnEvent, CommandRegistry, QueryRegistry};
use seedwork_domain::eventing::{EventDispatcher, EventRelay, EventSource, RelayConfig};
use seedwork_macros::{command, query};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Serialize)]
pub struct StockDto {
    pub producto_id: String,
    pub disponible: u32,
    pub reservado: u32,
}

impl Dto for StockDto {}

#[command]
#[derive(Debug)]
pub struct ReservarInventario {
    pub pedido_id: String,
    pub producto_id: String,
}

#[query(dto = StockDto)]
#[derive(Debug)]
pub struct ConsultarStock {
    pub producto_id: String,
}

#[derive(Default)]
pub struct Almacen {
    stock: DashMap<String, StockDto>,
    // 已处理的幂等键，broker 重复投递时跳过
    aplicados: Mutex<HashSet<String>>,
}

impl Almacen {
    pub fn con_stock<'a>(items: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let almacen = Self::default();
        for (producto_id, disponible) in items {
            almacen.stock.insert(
                producto_id.to_string(),
                StockDto {
                    producto_id: producto_id.to_string(),
                    disponible,
                    reservado: 0,
                },
            );
        }
        almacen
    }
}

struct ReservarInventarioHandler {
    almacen: Arc<Almacen>,
}

#[async_trait]
impl CommandHandler<ReservarInventario> for ReservarInventarioHandler {
    async fn handle(&self, ctx: &AppContext, cmd: ReservarInventario) -> Result<(), AppError> {
        if let Some(key) = &ctx.idempotency_key {
            let mut aplicados = self
                .almacen
                .aplicados
                .lock()
                .map_err(|e| AppError::Infra(e.to_string()))?;
            if !aplicados.insert(key.clone()) {
                tracing::info!(idempotency_key = %key, "reserva ya aplicada, se omite");
                return Ok(());
            }
        }

        let mut item = self
            .almacen
            .stock
            .get_mut(&cmd.producto_id)
            .ok_or_else(|| AppError::NotFound(format!("producto {}", cmd.producto_id)))?;
        if item.disponible == 0 {
            return Err(AppError::Validation(format!(
                "sin stock de {} para el pedido {}",
                cmd.producto_id, cmd.pedido_id
            )));
        }
        item.disponible -= 1;
        item.reservado += 1;

        tracing::info!(
            pedido_id = %cmd.pedido_id,
            producto_id = %cmd.producto_id,
            disponible = item.disponible,
            "inventario reservado"
        );
        Ok(())
    }
}

struct ConsultarStockHandler {
    almacen: Arc<Almacen>,
}

#[async_trait]
impl QueryHandler<ConsultarStock> for ConsultarStockHandler {
    async fn handle(&self, _ctx: &AppContext, q: ConsultarStock) -> Result<StockDto, AppError> {
        self.almacen
            .stock
            .get(&q.producto_id)
            .map(|item| item.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("producto {}", q.producto_id)))
    }
}

pub struct ServicioInventario {
    pub commands: Arc<CommandRegistry>,
    pub queries: Arc<QueryRegistry>,
    pub events: Arc<EventDispatcher>,
}

impl ServicioInventario {
    pub fn new(almacen: Almacen) -> Result<Self, AppError> {
        let almacen = Arc::new(almacen);

        let commands = Arc::new(CommandRegistry::new().bind::<ReservarInventario, _>(
            Arc::new(ReservarInventarioHandler {
                almacen: almacen.clone(),
            }),
        )?);
        let queries = Arc::new(
            QueryRegistry::new()
                .bind::<ConsultarStock, _>(Arc::new(ConsultarStockHandler { almacen }))?,
        );

        let reservar = CommandOnEvent::new(commands.clone(), |ev: PedidoConfirmado| {
            ev.productos
                .into_iter()
                .map(|producto_id| ReservarInventario {
                    pedido_id: ev.pedido_id.clone(),
                    producto_id,
                })
                .collect::<Vec<_>>()
        });
        let events = Arc::new(
            EventDispatcher::builder()
                .bind_handler("PedidoConfirmado", reservar.into_handler())
                .build(),
        );

        Ok(Self {
            commands,
            queries,
            events,
        })
    }

    /// 入站监听：只接收本服务关心的事件类型
    pub fn relay(&self, source: Arc<dyn EventSource>) -> Arc<EventRelay> {
        Arc::new(
            EventRelay::builder()
                .source(source)
                .dispatcher(self.events.clone())
                .config(RelayConfig::topics(["PedidoConfirmado"]))
                .build(),
        )
    }
}
