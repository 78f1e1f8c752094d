use seedwork_application::command::Command;
use seedwork_macros::command;

#[command]
#[derive(Debug)]
struct CancelarPedido {
    pedido_id: String,
}

#[command(output = String, name = "pedidos.confirmar")]
#[derive(Debug)]
enum ConfirmarPedido {
    Completo { pedido_id: String },
    Parcial(String, Vec<String>),
}

fn output_of<C: Command>(_: &C) -> &'static str {
    std::any::type_name::<C::Output>()
}

fn main() {
    let cancelar = CancelarPedido {
        pedido_id: "p-1".into(),
    };
    assert_eq!(CancelarPedido::NAME, "CancelarPedido");
    assert_eq!(output_of(&cancelar), "()");
    assert_eq!(ConfirmarPedido::NAME, "pedidos.confirmar");
    assert_eq!(
        output_of(&ConfirmarPedido::Parcial("p-2".into(), vec![])),
        "alloc::string::String"
    );
}
