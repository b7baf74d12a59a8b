//! 预约服务主程序

use clap::Parser;
use hms_core::{HmsError, Result};
use hms_database::{DatabasePool, HospitalStore, PgHospitalStore};
use hms_web::{AppState, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use crate::config::HmsConfig;

/// 预约服务命令行参数
#[derive(Parser, Debug)]
#[command(name = "hms-server")]
#[command(about = "医院预约管理系统服务器")]
struct Args {
    /// 服务器端口（覆盖配置文件）
    #[arg(short, long)]
    port: Option<u16>,

    /// 数据库连接URL（覆盖配置文件）
    #[arg(short, long)]
    database_url: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    info!("启动医院预约服务...");

    let mut config =
        HmsConfig::load(args.config.as_deref()).map_err(|e| HmsError::Config(e.to_string()))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    info!("服务配置:");
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  连接池大小: {}", config.database.max_connections);

    // 建立数据库连接并初始化表结构
    let pool = DatabasePool::connect(&config.database.url, config.database.max_connections).await?;
    let pg_store = PgHospitalStore::new(pool);
    pg_store.create_tables().await?;
    let store: Arc<dyn HospitalStore> = Arc::new(pg_store);

    let state = AppState::new(store);

    // 首次启动时创建默认管理员
    state
        .auth
        .bootstrap_admin(
            &config.bootstrap.admin_username,
            &config.bootstrap.admin_password,
        )
        .await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| HmsError::Config(format!("invalid listen address: {}", e)))?;

    // 启动Web服务器
    let server = WebServer::new(addr, state);
    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e);
    }

    Ok(())
}
