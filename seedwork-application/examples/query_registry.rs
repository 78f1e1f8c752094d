use async_trait::async_trait;
use seedwork_application::QueryRegistry;
use seedwork_application::context::AppContext;
use seedwork_application::dto::Dto;
use seedwork_application::error::AppError;
use seedwork_application::query_bus::QueryBus;
use seedwork_application::query_handler::QueryHandler;
use seedwork_domain::domain_event::BusinessContext;
use seedwork_macros::query;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
struct ProductoDto {
    id: u32,
    nombre: String,
}

impl Dto for ProductoDto {}

#[query(dto = ProductoDto)]
#[derive(Debug)]
struct ObtenerProducto {
    id: u32,
}

struct ObtenerProductoHandler;

#[async_trait]
impl QueryHandler<ObtenerProducto> for ObtenerProductoHandler {
    async fn handle(&self, _ctx: &AppContext, q: ObtenerProducto) -> Result<ProductoDto, AppError> {
        if q.id != 1 {
            return Err(AppError::NotFound(format!("producto {}", q.id)));
        }
        Ok(ProductoDto {
            id: q.id,
            nombre: "Ibuprofeno".into(),
        })
    }
}

#[query(dto = Vec<ProductoDto>)]
#[derive(Debug)]
struct ListarProductos;

struct ListarProductosHandler;

#[async_trait]
impl QueryHandler<ListarProductos> for ListarProductosHandler {
    async fn handle(
        &self,
        _ctx: &AppContext,
        _q: ListarProductos,
    ) -> Result<Vec<ProductoDto>, AppError> {
        Ok(vec![
            ProductoDto {
                id: 1,
                nombre: "Ibuprofeno".into(),
            },
            ProductoDto {
                id: 2,
                nombre: "Paracetamol".into(),
            },
        ])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let queries = QueryRegistry::new()
        .bind::<ObtenerProducto, _>(Arc::new(ObtenerProductoHandler))?
        .bind::<ListarProductos, _>(Arc::new(ListarProductosHandler))?;

    let ctx = AppContext {
        biz: BusinessContext::builder()
            .maybe_correlation_id(Some("cor-2".into()))
            .build(),
        idempotency_key: None,
    };

    let dto = queries.execute(&ctx, ObtenerProducto { id: 1 }).await?;
    println!("ObtenerProducto: id={}, nombre={}", dto.id, dto.nombre);

    let list = queries.execute(&ctx, ListarProductos).await?;
    println!("ListarProductos: count={}", list.len());

    // 业务上的“未找到”由处理器返回，原样交给调用方
    if let Err(AppError::NotFound(what)) = queries.execute(&ctx, ObtenerProducto { id: 9 }).await {
        eprintln!("not found: {what}");
    }
    Ok(())
}
