use seedwork_application::dto::Dto;
use seedwork_application::query::Query;
use seedwork_macros::query;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ProductoDto {
    id: String,
    stock: u32,
}

impl Dto for ProductoDto {}

#[query(dto = Option<ProductoDto>)]
#[derive(Debug)]
struct ObtenerProducto {
    id: String,
}

#[query(dto = Vec<ProductoDto>, name = "productos.listar")]
struct ListarProductos;

fn main() {
    let _ = ObtenerProducto { id: "x".into() };
    assert_eq!(ObtenerProducto::NAME, "ObtenerProducto");
    assert_eq!(<ListarProductos as Query>::NAME, "productos.listar");
}
