use anyhow::Context;
use asset_server::{Config, Server, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment();

    print_banner();

    tracing::info!("🦀 Asset Server starting...");

    // 2. 加载配置
    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Configuration loaded"
    );

    // 3. 启动 HTTP 服务器 (初始化状态与后台任务)
    let server = Server::new(config);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
