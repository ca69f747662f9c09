//! HTTP 接口层
//!
//! 负责请求解析、参数校验以及错误到 HTTP 状态码的映射，业务逻辑全部委托给服务层。

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
