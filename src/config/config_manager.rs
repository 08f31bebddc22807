// ==========================================
// 工厂自适应排产系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 策略: 缺失配置项回落到 ApsConfig 默认值,从不报错
// ==========================================

use crate::config::aps_config::ApsConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// config_kv 键名 (scope_id = 'global')
const KEY_EWMA_ALPHA: &str = "aps/ewma_alpha";
const KEY_WINDOW_HOURS: &str = "aps/efficiency_window_hours";
const KEY_LEARNING_RATE: &str = "aps/learning_rate";
const KEY_MIN_WEIGHT: &str = "aps/min_weight";
const KEY_MAX_WEIGHT: &str = "aps/max_weight";
const KEY_SIM_BOOST: &str = "aps/simulate_probability_boost";
const KEY_ATTENTION: &str = "aps/attention_threshold";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RepositoryError::DatabaseQueryError(e.to_string())),
        }
    }

    /// 写入 global scope 配置覆写
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn load_f64(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(key, raw, "配置值无法解析为浮点数,回落默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    fn load_i64(&self, key: &str, default: i64) -> RepositoryResult<i64> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(key, raw, "配置值无法解析为整数,回落默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 加载 APS 调参配置 (缺失项回落默认值)
    pub fn load_aps_config(&self) -> RepositoryResult<ApsConfig> {
        let defaults = ApsConfig::default();
        Ok(ApsConfig {
            ewma_alpha: self.load_f64(KEY_EWMA_ALPHA, defaults.ewma_alpha)?,
            efficiency_window_hours: self
                .load_i64(KEY_WINDOW_HOURS, defaults.efficiency_window_hours)?,
            learning_rate: self.load_f64(KEY_LEARNING_RATE, defaults.learning_rate)?,
            min_weight: self.load_f64(KEY_MIN_WEIGHT, defaults.min_weight)?,
            max_weight: self.load_f64(KEY_MAX_WEIGHT, defaults.max_weight)?,
            simulate_probability_boost: self
                .load_f64(KEY_SIM_BOOST, defaults.simulate_probability_boost)?,
            attention_threshold: self.load_f64(KEY_ATTENTION, defaults.attention_threshold)?,
        })
    }
}
