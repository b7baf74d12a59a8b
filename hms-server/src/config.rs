//! 配置管理
//!
//! 默认值、可选配置文件与 `HMS__` 前缀环境变量三层合并。

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 连接URL
    pub url: String,
    /// 连接池大小
    pub max_connections: u32,
}

/// 管理员引导配置
///
/// 默认凭据仅用于首次启动，上线前必须轮换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_username: String,
    pub admin_password: String,
}

/// HMS完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmsConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub bootstrap: BootstrapConfig,
}

impl HmsConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "postgres://localhost/hospital")?
            .set_default("database.max_connections", 5)?
            .set_default("bootstrap.admin_username", "admin")?
            .set_default("bootstrap.admin_password", "admin123")?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path));
        }

        let config = builder
            .add_source(Environment::with_prefix("HMS").separator("__"))
            .build()
            .context("failed to build configuration")?;

        config
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HmsConfig::load(None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.bootstrap.admin_username, "admin");
    }
}
