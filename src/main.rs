// ==========================================
// 工厂自适应排产系统 - 维护入口
// ==========================================
// 用途: 初始化数据库 + 输出指定工厂的驾驶舱快照 (JSON)
// 用法: factory-aps [db_path] [factory_id]
// ==========================================

use std::sync::{Arc, Mutex};

use factory_aps::api::DashboardApi;
use factory_aps::config::{ApsConfig, ConfigManager};
use factory_aps::db::{init_schema, open_sqlite_connection};
use factory_aps::engine::{ApsRepositories, EffectivenessEvaluator, TriggerDetector};

const DEFAULT_DB_PATH: &str = "factory_aps.db";
const DEFAULT_FACTORY_ID: &str = "F001";
const DEFAULT_TOP_N: usize = 10;

fn main() -> anyhow::Result<()> {
    factory_aps::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", factory_aps::APP_NAME);
    tracing::info!("系统版本: {}", factory_aps::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let factory_id = args.next().unwrap_or_else(|| DEFAULT_FACTORY_ID.to_string());

    tracing::info!("使用数据库: {}", db_path);
    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let repos = ApsRepositories::from_connection(conn.clone());
    let config_manager = ConfigManager::from_connection(conn);
    let config: ApsConfig = config_manager.load_aps_config()?;

    let evaluator = Arc::new(EffectivenessEvaluator::new(repos.task_repo.clone()));
    let trigger_detector = Arc::new(TriggerDetector::new(
        repos.task_repo.clone(),
        repos.line_repo.clone(),
        repos.inventory_repo.clone(),
        config,
    ));
    let dashboard = DashboardApi::new(
        repos.task_repo.clone(),
        repos.line_repo.clone(),
        evaluator,
        trigger_detector,
    );

    let view = dashboard
        .get_dashboard(&factory_id, DEFAULT_TOP_N)
        .map_err(|e| anyhow::anyhow!("驾驶舱聚合失败: {}", e))?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
