use crate::dto::Dto;

/// 读请求（Query）：与命令结构相同，但约定无副作用、可重复执行
///
/// 通常由 `#[query(dto = T)]` 生成实现。
pub trait Query: Send + 'static {
    /// 日志与错误中使用的稳定名称
    const NAME: &'static str;

    type Dto: Dto;
}
