use serde::Serialize;

/// 查询结果的载体（DTO）
///
/// HTTP 层直接把它序列化为响应体，因此只放读模型字段，不暴露领域对象。
pub trait Dto: Serialize + Send + Sync + 'static {}

// 列表与可选结果无需再包一层
impl<T> Dto for Vec<T> where T: Dto {}

impl<T> Dto for Option<T> where T: Dto {}
