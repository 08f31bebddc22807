// ==========================================
// 工厂自适应排产系统 - 策略配置仓储
// ==========================================
// 职责: 管理 strategy_config 表与 weight_adjustment_record 表
// 约定: 权重以闭合键集 JSON 持久化 (未知键在解析时拒绝);
//       审计记录只追加,从不修改
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::strategy::{
    EffectivenessScores, StrategyConfig, StrategyWeights, WeightAdjustmentRecord,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// StrategyConfigRepository - 策略权重配置仓储
// ==========================================
pub struct StrategyConfigRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StrategyConfigRepository {
    /// 创建新的 StrategyConfigRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询工厂策略配置 (不存在时返回 None)
    pub fn find(&self, factory_id: &str) -> RepositoryResult<Option<StrategyConfig>> {
        let conn = self.get_conn()?;
        let row: Option<(String, Option<NaiveDateTime>, i32)> = conn
            .query_row(
                "SELECT weights_json, last_adapted_at, adaptation_count \
                 FROM strategy_config WHERE factory_id = ?1",
                params![factory_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((weights_json, last_adapted_at, adaptation_count)) => {
                let weights: StrategyWeights = serde_json::from_str(&weights_json)?;
                Ok(Some(StrategyConfig {
                    factory_id: factory_id.to_string(),
                    weights,
                    last_adapted_at,
                    adaptation_count,
                }))
            }
            None => Ok(None),
        }
    }

    /// 查询工厂策略配置,不存在时惰性创建默认配置
    pub fn get_or_create_default(&self, factory_id: &str) -> RepositoryResult<StrategyConfig> {
        if let Some(config) = self.find(factory_id)? {
            return Ok(config);
        }
        let config = StrategyConfig::new_default(factory_id);
        self.save(&config)?;
        tracing::info!(factory_id, "策略配置不存在,已按默认权重分配创建");
        Ok(config)
    }

    /// 保存策略配置 (INSERT OR REPLACE)
    pub fn save(&self, config: &StrategyConfig) -> RepositoryResult<()> {
        let weights_json = serde_json::to_string(&config.weights)?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO strategy_config \
             (factory_id, weights_json, last_adapted_at, adaptation_count) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                config.factory_id,
                weights_json,
                config.last_adapted_at.map(|dt| dt.format(DT_FMT).to_string()),
                config.adaptation_count,
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// WeightAdjustmentRepository - 权重调整审计仓储
// ==========================================
pub struct WeightAdjustmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WeightAdjustmentRepository {
    /// 创建新的 WeightAdjustmentRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<RawAdjustmentRow> {
        Ok(RawAdjustmentRow {
            record_id: row.get(0)?,
            factory_id: row.get(1)?,
            adjusted_at: row.get(2)?,
            weights_before_json: row.get(3)?,
            weights_after_json: row.get(4)?,
            scores_json: row.get(5)?,
            reason: row.get(6)?,
        })
    }

    /// 追加一条审计记录 (只追加)
    ///
    /// 序列化失败返回 SerializationError,由调用方决定是否阻断
    /// (权重自适应引擎约定: 只记日志,不阻断权重写入)
    pub fn append(&self, record: &WeightAdjustmentRecord) -> RepositoryResult<()> {
        let weights_before_json = serde_json::to_string(&record.weights_before)?;
        let weights_after_json = serde_json::to_string(&record.weights_after)?;
        let scores_json = record
            .scores
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO weight_adjustment_record \
             (record_id, factory_id, adjusted_at, weights_before_json, weights_after_json, scores_json, reason) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.record_id,
                record.factory_id,
                record.adjusted_at.format(DT_FMT).to_string(),
                weights_before_json,
                weights_after_json,
                scores_json,
                record.reason,
            ],
        )?;
        Ok(())
    }

    /// 查询工厂自指定时刻起的审计记录 (adjusted_at 升序)
    pub fn list_since(
        &self,
        factory_id: &str,
        since: NaiveDateTime,
    ) -> RepositoryResult<Vec<WeightAdjustmentRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT record_id, factory_id, adjusted_at, weights_before_json, weights_after_json, scores_json, reason \
             FROM weight_adjustment_record \
             WHERE factory_id = ?1 AND adjusted_at >= ?2 \
             ORDER BY adjusted_at ASC",
        )?;
        let rows = stmt.query_map(
            params![factory_id, since.format(DT_FMT).to_string()],
            Self::map_row,
        )?;
        let mut records = Vec::new();
        for raw in rows {
            records.push(raw?.into_record()?);
        }
        Ok(records)
    }

    /// 统计工厂的审计记录总数
    pub fn count_by_factory(&self, factory_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM weight_adjustment_record WHERE factory_id = ?1",
            params![factory_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

struct RawAdjustmentRow {
    record_id: String,
    factory_id: String,
    adjusted_at: NaiveDateTime,
    weights_before_json: String,
    weights_after_json: String,
    scores_json: Option<String>,
    reason: String,
}

impl RawAdjustmentRow {
    fn into_record(self) -> RepositoryResult<WeightAdjustmentRecord> {
        let weights_before: StrategyWeights = serde_json::from_str(&self.weights_before_json)?;
        let weights_after: StrategyWeights = serde_json::from_str(&self.weights_after_json)?;
        let scores: Option<EffectivenessScores> = self
            .scores_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;
        Ok(WeightAdjustmentRecord {
            record_id: self.record_id,
            factory_id: self.factory_id,
            adjusted_at: self.adjusted_at,
            weights_before,
            weights_after,
            scores,
            reason: self.reason,
        })
    }
}

// ==========================================
// FeatureWeightRepository - 预测特征权重仓储
// ==========================================
// 约定: 工厂缺某特征的行时,预测器回落到内置默认权重表
pub struct FeatureWeightRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FeatureWeightRepository {
    /// 创建新的 FeatureWeightRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 加载工厂的全部特征权重行 (feature_name -> weight)
    pub fn load_for_factory(
        &self,
        factory_id: &str,
    ) -> RepositoryResult<std::collections::HashMap<String, f64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT feature_name, weight FROM feature_weight WHERE factory_id = ?1",
        )?;
        let rows = stmt.query_map(params![factory_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;
        let mut weights = std::collections::HashMap::new();
        for raw in rows {
            let (name, weight) = raw?;
            weights.insert(name, weight);
        }
        Ok(weights)
    }

    /// 写入单个特征权重 (INSERT OR REPLACE)
    pub fn upsert(&self, factory_id: &str, feature_name: &str, weight: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO feature_weight (factory_id, feature_name, weight) \
             VALUES (?1, ?2, ?3)",
            params![factory_id, feature_name, weight],
        )?;
        Ok(())
    }
}
