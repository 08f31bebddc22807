// ==========================================
// 工厂自适应排产系统 - 效率采样仓储
// ==========================================
// 职责: 管理 efficiency_history 表 (只追加日志)
// 约束: 查询按 recorded_at 升序返回 —— EWMA 从最旧走到最新,
//       该顺序是承重约定,不可反转
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::efficiency::EfficiencySample;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// EfficiencyHistoryRepository - 效率采样仓储
// ==========================================
pub struct EfficiencyHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EfficiencyHistoryRepository {
    /// 创建新的 EfficiencyHistoryRepository 实例
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

    // rusqlite chrono feature 直接解析 "%Y-%m-%d %H:%M:%S" 文本列
    fn map_row(row: &Row) -> rusqlite::Result<EfficiencySample> {
        Ok(EfficiencySample {
            sample_id: row.get(0)?,
            line_id: row.get(1)?,
            task_id: row.get(2)?,
            recorded_at: row.get(3)?,
            actual_output: row.get(4)?,
            expected_output: row.get(5)?,
            ratio: row.get(6)?,
            worker_count: row.get(7)?,
        })
    }

    /// 追加一条采样 (只追加,从不修改)
    pub fn append(&self, sample: &EfficiencySample) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO efficiency_history \
             (sample_id, line_id, task_id, recorded_at, actual_output, expected_output, ratio, worker_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                sample.sample_id,
                sample.line_id,
                sample.task_id,
                sample.recorded_at.format(DT_FMT).to_string(),
                sample.actual_output,
                sample.expected_output,
                sample.ratio,
                sample.worker_count,
            ],
        )?;
        Ok(())
    }

    /// 查询某产线自指定时刻起的采样 (recorded_at 升序)
    pub fn list_since(
        &self,
        line_id: &str,
        since: NaiveDateTime,
    ) -> RepositoryResult<Vec<EfficiencySample>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT sample_id, line_id, task_id, recorded_at, actual_output, expected_output, ratio, worker_count \
             FROM efficiency_history \
             WHERE line_id = ?1 AND recorded_at >= ?2 \
             ORDER BY recorded_at ASC",
        )?;
        let rows = stmt.query_map(
            params![line_id, since.format(DT_FMT).to_string()],
            Self::map_row,
        )?;
        let mut samples = Vec::new();
        for raw in rows {
            samples.push(raw?);
        }
        Ok(samples)
    }
}
