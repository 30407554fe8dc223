//! 奖励兑换运维工具入口

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use reward_redemption::cli::{Cli, CommandRunner};
use reward_shared::{config::AppConfig, database::Database, observability};

const SERVICE_NAME: &str = "reward-redemption-service";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. 加载配置，失败时退回默认值
    let (config, load_error) = match AppConfig::load(SERVICE_NAME) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // 2. 初始化日志和指标
    observability::init(SERVICE_NAME, &config.observability)?;
    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {}", e);
    }
    info!(environment = %config.environment, "Configuration loaded");

    // 3. 连接数据库
    let db = Database::connect(&config.database).await?;
    db.health_check().await?;
    info!("Database connection established");

    // 4. 执行命令
    let runner = CommandRunner::new(db.pool().clone(), config.redemption.history_limit);
    let result = runner.run(cli.command).await;

    db.close().await;
    result
}
