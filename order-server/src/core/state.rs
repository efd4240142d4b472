use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::core::Config;
use crate::orders::{OrderService, SyncConfig};
use crate::store::HttpOrderStore;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是订单后台的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Arc<Config> | 配置项 (不可变) |
/// | service | Arc<OrderService> | 订单服务 (内存集合 + 索引) |
/// | shutdown | CancellationToken | 协作式停机令牌 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub service: Arc<OrderService>,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// 初始化服务器状态：构建存储客户端和订单服务
    pub fn initialize(config: &Config) -> Self {
        let store = HttpOrderStore::new(
            &config.store_url,
            Duration::from_millis(config.request_timeout_ms),
        );

        let sync_config = SyncConfig {
            page_size: config.sync_page_size,
            max_records: config.sync_max_records,
        };

        let service = Arc::new(OrderService::new(Arc::new(store), sync_config));

        Self {
            config: Arc::new(config.clone()),
            service,
            shutdown: CancellationToken::new(),
        }
    }

    /// 启动后台任务：初始全量同步
    ///
    /// 同步在后台运行，期间查询走降级的子串扫描路径；
    /// 停机令牌取消后不再请求后续分页。
    pub fn start_background_tasks(&self) {
        let service = self.service.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            match service.reload(&shutdown).await {
                Ok(outcome) => {
                    tracing::info!(
                        loaded = outcome.loaded,
                        pages = outcome.pages_fetched,
                        warning = ?outcome.warning,
                        "Initial order sync complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Initial order sync failed");
                }
            }
        });
    }
}
