//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查接口
//! - [`orders`] - 订单管理接口

pub mod health;
pub mod orders;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// Build the full router with state and middleware applied
pub fn router(state: ServerState) -> Router {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(orders::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
}
