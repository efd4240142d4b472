/// 服务器配置 - 订单管理后台的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 8080 | HTTP 服务端口 |
/// | ORDER_STORE_URL | http://localhost:4000 | 订单存储服务地址 |
/// | REQUEST_TIMEOUT_MS | 30000 | 存储请求超时(毫秒) |
/// | SYNC_PAGE_SIZE | 200 | 全量同步分页大小 |
/// | SYNC_MAX_RECORDS | 10000 | 全量同步安全上限 |
/// | DEFAULT_PAGE_SIZE | 12 | 后台列表默认分页大小 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// ORDER_STORE_URL=http://store:4000 HTTP_PORT=9090 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 外部订单存储服务 URL
    pub store_url: String,
    /// 存储请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 全量同步的分页大小
    pub sync_page_size: u32,
    /// 全量同步的安全记录上限 (独立于分页大小)
    pub sync_max_records: usize,
    /// 后台订单列表默认分页大小
    pub default_page_size: u32,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            store_url: std::env::var("ORDER_STORE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            sync_page_size: std::env::var("SYNC_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(200),
            sync_max_records: std::env::var("SYNC_MAX_RECORDS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10_000),
            default_page_size: std::env::var("DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(12),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
