//! 配置管理模块
//!
//! 分层加载 TOML 配置文件，环境变量覆盖，类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 未显式指定时规则是否短路执行
    pub short_circuit: bool,
    /// 渲染解释文本的默认语言标签，如 en、fr-FR、zh-CN
    pub locale: String,
    /// 输出每个节点的求值统计
    pub trace: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            short_circuit: true,
            locale: "en".to_string(),
            trace: false,
        }
    }
}

/// 可观测性配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    /// true 输出 JSON 结构化日志，false 输出人类可读格式
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub engine: EngineConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "verdict".to_string(),
            environment: "development".to_string(),
            engine: EngineConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 配置目录取 `CONFIG_DIR`（默认 `config`），环境取 `VERDICT_ENV`（默认 development）。
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("VERDICT_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 加载顺序（后加载的覆盖先加载的同名配置项）：
    /// 1. {dir}/default.toml
    /// 2. {dir}/{environment}.toml
    /// 3. {dir}/{service_name}.toml
    /// 4. 环境变量（VERDICT_ 前缀，层级用双下划线，如 VERDICT_ENGINE__LOCALE -> engine.locale）
    pub fn load_from(dir: &Path, env: &str, service_name: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(dir.join("default.toml")).required(false))
            .add_source(File::from(dir.join(format!("{}.toml", env))).required(false))
            .add_source(File::from(dir.join(format!("{}.toml", service_name))).required(false))
            .add_source(
                Environment::with_prefix("VERDICT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("verdict-config-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.engine.short_circuit);
        assert_eq!(config.engine.locale, "en");
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.is_production());
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = temp_dir("empty");
        let config = AppConfig::load_from(&dir, "development", "verdict").unwrap();

        assert_eq!(config.service_name, "verdict");
        assert_eq!(config.environment, "development");
        assert!(config.engine.short_circuit);
    }

    #[test]
    fn test_layered_files() {
        let dir = temp_dir("layered");
        fs::write(
            dir.join("default.toml"),
            "[engine]\nlocale = \"fr\"\ntrace = true\n\n[observability]\nlog_level = \"debug\"\n",
        )
        .unwrap();
        fs::write(dir.join("production.toml"), "[engine]\nshort_circuit = false\n").unwrap();
        fs::write(dir.join("verdict.toml"), "[engine]\nlocale = \"zh-CN\"\n").unwrap();

        let config = AppConfig::load_from(&dir, "production", "verdict").unwrap();

        assert_eq!(config.engine.locale, "zh-CN");
        assert!(config.engine.trace);
        assert!(!config.engine.short_circuit);
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.is_production());
    }
}
