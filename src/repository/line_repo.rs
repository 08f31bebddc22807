// ==========================================
// 工厂自适应排产系统 - 产线仓储
// ==========================================
// 职责: 管理 production_line 表的数据访问
// 红线: Repository 不含业务逻辑,只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::line::ProductionLine;
use crate::domain::types::LineStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// LineRepository - 产线仓储
// ==========================================
pub struct LineRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LineRepository {
    /// 创建新的 LineRepository 实例
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

    fn map_row(row: &Row) -> rusqlite::Result<(String, String, String, String, f64, i32)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn into_line(
        (line_id, factory_id, line_name, status, rolling_efficiency, min_workers): (
            String,
            String,
            String,
            String,
            f64,
            i32,
        ),
    ) -> RepositoryResult<ProductionLine> {
        let status = LineStatus::from_db_str(&status).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: status.clone(),
            }
        })?;
        Ok(ProductionLine {
            line_id,
            factory_id,
            line_name,
            status,
            rolling_efficiency,
            min_workers,
        })
    }

    /// 按ID查询产线
    ///
    /// # 返回
    /// - Ok(ProductionLine): 找到产线
    /// - Err(NotFound): 产线不存在
    pub fn find_by_id(&self, line_id: &str) -> RepositoryResult<ProductionLine> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                "SELECT line_id, factory_id, line_name, status, rolling_efficiency, min_workers \
                 FROM production_line WHERE line_id = ?1",
                params![line_id],
                Self::map_row,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    RepositoryError::not_found("ProductionLine", line_id)
                }
                other => RepositoryError::from(other),
            })?;
        Self::into_line(raw)
    }

    /// 按工厂查询产线 (全部状态)
    pub fn list_by_factory(&self, factory_id: &str) -> RepositoryResult<Vec<ProductionLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT line_id, factory_id, line_name, status, rolling_efficiency, min_workers \
             FROM production_line WHERE factory_id = ?1 ORDER BY line_id",
        )?;
        let rows = stmt.query_map(params![factory_id], Self::map_row)?;
        let mut lines = Vec::new();
        for raw in rows {
            lines.push(Self::into_line(raw?)?);
        }
        Ok(lines)
    }

    /// 按工厂+状态查询产线
    pub fn list_by_factory_and_status(
        &self,
        factory_id: &str,
        status: LineStatus,
    ) -> RepositoryResult<Vec<ProductionLine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT line_id, factory_id, line_name, status, rolling_efficiency, min_workers \
             FROM production_line WHERE factory_id = ?1 AND status = ?2 ORDER BY line_id",
        )?;
        let rows = stmt.query_map(params![factory_id, status.to_db_str()], Self::map_row)?;
        let mut lines = Vec::new();
        for raw in rows {
            lines.push(Self::into_line(raw?)?);
        }
        Ok(lines)
    }

    /// 保存产线 (INSERT OR REPLACE 实现 upsert 语义)
    pub fn save(&self, line: &ProductionLine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO production_line \
             (line_id, factory_id, line_name, status, rolling_efficiency, min_workers) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                line.line_id,
                line.factory_id,
                line.line_name,
                line.status.to_db_str(),
                line.rolling_efficiency,
                line.min_workers,
            ],
        )?;
        Ok(())
    }

    /// 更新滚动效率字段 (滚动效率计算器专用)
    pub fn update_rolling_efficiency(
        &self,
        line_id: &str,
        rolling_efficiency: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let updated = conn.execute(
            "UPDATE production_line SET rolling_efficiency = ?2 WHERE line_id = ?1",
            params![line_id, rolling_efficiency],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("ProductionLine", line_id));
        }
        Ok(())
    }
}
