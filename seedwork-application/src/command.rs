/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，通常会修改领域状态。
/// - 不可变的具名字段集合，只携带处理器需要的输入；
/// - 每个命令类型恰好绑定一个处理器，分发后即被消费；
/// - 建议保持语义化的“动宾结构”命名，如 `CrearCategoria`、`ConfirmarPedido`。
///
/// 关联项：
/// - `NAME`：命令的稳定名称，用于日志、追踪与错误信息。避免依赖 `type_name::<T>()`。
/// - `Output`：处理器的返回值（如创建后的 DTO）；业务上的预期失败走 `Err(AppError)`。
pub trait Command: Send + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    type Output: Send + 'static;
}
