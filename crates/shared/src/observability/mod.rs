//! 统一可观测性模块
//!
//! 提供日志和指标的统一初始化。指标只通过 `metrics` 门面记录，
//! 是否导出由宿主进程安装的 recorder 决定。

pub mod metrics;
pub mod tracing;

use crate::config::ObservabilityConfig;
use ::tracing::info;
use anyhow::Result;

/// 统一初始化可观测性
///
/// 初始化顺序：
/// 1. Tracing（日志）
/// 2. Metrics（注册指标描述）
///
/// # Example
///
/// ```ignore
/// use verdict_shared::config::AppConfig;
/// use verdict_shared::observability;
///
/// fn main() -> anyhow::Result<()> {
///     let config = AppConfig::load("verdict")?;
///     observability::init(&config.observability, &config.service_name)?;
///     Ok(())
/// }
/// ```
pub fn init(config: &ObservabilityConfig, service_name: &str) -> Result<()> {
    tracing::init(config)?;
    metrics::describe_metrics();

    info!(
        service = %service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Observability initialized"
    );
    Ok(())
}
