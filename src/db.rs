// ==========================================
// 工厂自适应排产系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供 APS 核心所需表的统一建表入口
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 APS 核心表结构 (幂等)
///
/// 表清单:
/// - scheduled_task: 排产任务
/// - production_line: 产线
/// - efficiency_history: 效率采样 (只追加)
/// - feature_weight: 工厂级预测特征权重
/// - strategy_config: 工厂级策略权重配置
/// - weight_adjustment_record: 权重调整审计 (只追加)
/// - material_stock: 物料库存 (低库存信号来源)
/// - config_kv: 策略调参配置覆写 (key-value + scope)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS scheduled_task (
            task_id                 TEXT PRIMARY KEY,
            factory_id              TEXT NOT NULL,
            line_id                 TEXT NOT NULL,
            plan_id                 TEXT,
            planned_qty             REAL NOT NULL,
            completed_qty           REAL NOT NULL DEFAULT 0,
            planned_start           TEXT NOT NULL,
            planned_end             TEXT NOT NULL,
            actual_start            TEXT,
            actual_end              TEXT,
            assigned_workers        INTEGER,
            actual_efficiency       REAL,
            completion_probability  REAL,
            risk_level              TEXT,
            status                  TEXT NOT NULL DEFAULT 'PENDING',
            adjustment_count        INTEGER NOT NULL DEFAULT 0,
            last_adjustment_reason  TEXT,
            last_adjustment_at      TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_task_factory_status
            ON scheduled_task (factory_id, status);
        CREATE INDEX IF NOT EXISTS idx_task_line_status
            ON scheduled_task (line_id, status);
        CREATE INDEX IF NOT EXISTS idx_task_plan
            ON scheduled_task (plan_id);

        CREATE TABLE IF NOT EXISTS production_line (
            line_id            TEXT PRIMARY KEY,
            factory_id         TEXT NOT NULL,
            line_name          TEXT NOT NULL,
            status             TEXT NOT NULL DEFAULT 'ACTIVE',
            rolling_efficiency REAL NOT NULL DEFAULT 1.0,
            min_workers        INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_line_factory
            ON production_line (factory_id, status);

        CREATE TABLE IF NOT EXISTS efficiency_history (
            sample_id       TEXT PRIMARY KEY,
            line_id         TEXT NOT NULL,
            task_id         TEXT NOT NULL,
            recorded_at     TEXT NOT NULL,
            actual_output   REAL NOT NULL,
            expected_output REAL NOT NULL,
            ratio           REAL NOT NULL,
            worker_count    INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_efficiency_line_time
            ON efficiency_history (line_id, recorded_at);

        CREATE TABLE IF NOT EXISTS feature_weight (
            factory_id   TEXT NOT NULL,
            feature_name TEXT NOT NULL,
            weight       REAL NOT NULL,
            PRIMARY KEY (factory_id, feature_name)
        );

        CREATE TABLE IF NOT EXISTS strategy_config (
            factory_id       TEXT PRIMARY KEY,
            weights_json     TEXT NOT NULL,
            last_adapted_at  TEXT,
            adaptation_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS weight_adjustment_record (
            record_id           TEXT PRIMARY KEY,
            factory_id          TEXT NOT NULL,
            adjusted_at         TEXT NOT NULL,
            weights_before_json TEXT NOT NULL,
            weights_after_json  TEXT NOT NULL,
            scores_json         TEXT,
            reason              TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_adjustment_factory_time
            ON weight_adjustment_record (factory_id, adjusted_at);

        CREATE TABLE IF NOT EXISTS material_stock (
            material_id   TEXT PRIMARY KEY,
            factory_id    TEXT NOT NULL,
            material_name TEXT NOT NULL,
            current_qty   REAL NOT NULL DEFAULT 0,
            safety_qty    REAL NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_stock_factory
            ON material_stock (factory_id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key      TEXT NOT NULL,
            value    TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;
    Ok(())
}
