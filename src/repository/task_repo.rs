// ==========================================
// 工厂自适应排产系统 - 排产任务仓储
// ==========================================
// 职责: 管理 scheduled_task 表的数据访问
// 红线: Repository 不含业务逻辑,只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::task::ScheduledTask;
use crate::domain::types::{RiskLevel, TaskStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const DT_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(DT_FMT).to_string()
}

fn parse_dt(raw: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DT_FMT).map_err(|e| RepositoryError::FieldValueError {
        field: "datetime".to_string(),
        message: format!("{}: {}", raw, e),
    })
}

// ==========================================
// TaskRepository - 排产任务仓储
// ==========================================
pub struct TaskRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TaskRepository {
    /// 创建新的 TaskRepository 实例
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

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row) -> rusqlite::Result<RawTaskRow> {
        Ok(RawTaskRow {
            task_id: row.get(0)?,
            factory_id: row.get(1)?,
            line_id: row.get(2)?,
            planned_qty: row.get(3)?,
            completed_qty: row.get(4)?,
            planned_start: row.get(5)?,
            planned_end: row.get(6)?,
            actual_start: row.get(7)?,
            actual_end: row.get(8)?,
            assigned_workers: row.get(9)?,
            actual_efficiency: row.get(10)?,
            completion_probability: row.get(11)?,
            risk_level: row.get(12)?,
            status: row.get(13)?,
            adjustment_count: row.get(14)?,
            last_adjustment_reason: row.get(15)?,
            last_adjustment_at: row.get(16)?,
            plan_id: row.get(17)?,
        })
    }

    const SELECT_COLS: &'static str = "task_id, factory_id, line_id, planned_qty, completed_qty, \
         planned_start, planned_end, actual_start, actual_end, assigned_workers, \
         actual_efficiency, completion_probability, risk_level, status, \
         adjustment_count, last_adjustment_reason, last_adjustment_at, plan_id";

    /// 按ID查询任务
    ///
    /// # 返回
    /// - Ok(ScheduledTask): 找到任务
    /// - Err(NotFound): 任务不存在
    pub fn find_by_id(&self, task_id: &str) -> RepositoryResult<ScheduledTask> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM scheduled_task WHERE task_id = ?1",
            Self::SELECT_COLS
        );
        let raw = conn
            .query_row(&sql, params![task_id], Self::map_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    RepositoryError::not_found("ScheduledTask", task_id)
                }
                other => RepositoryError::from(other),
            })?;
        raw.into_task()
    }

    /// 按工厂查询任务 (全部状态)
    pub fn list_by_factory(&self, factory_id: &str) -> RepositoryResult<Vec<ScheduledTask>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM scheduled_task WHERE factory_id = ?1 ORDER BY planned_start",
            Self::SELECT_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![factory_id], Self::map_row)?;
        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        Ok(tasks)
    }

    /// 按工厂+状态查询任务
    pub fn list_by_factory_and_status(
        &self,
        factory_id: &str,
        status: TaskStatus,
    ) -> RepositoryResult<Vec<ScheduledTask>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM scheduled_task WHERE factory_id = ?1 AND status = ?2 \
             ORDER BY planned_start",
            Self::SELECT_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![factory_id, status.to_db_str()], Self::map_row)?;
        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        Ok(tasks)
    }

    /// 按产线+状态查询任务
    pub fn list_by_line_and_status(
        &self,
        line_id: &str,
        status: TaskStatus,
    ) -> RepositoryResult<Vec<ScheduledTask>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM scheduled_task WHERE line_id = ?1 AND status = ?2 \
             ORDER BY planned_start",
            Self::SELECT_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![line_id, status.to_db_str()], Self::map_row)?;
        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        Ok(tasks)
    }

    /// 按排产计划查询任务 (排产构建流程写入 plan_id; 手工建任务无计划归属)
    pub fn list_by_plan_id(&self, plan_id: &str) -> RepositoryResult<Vec<ScheduledTask>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM scheduled_task WHERE plan_id = ?1 ORDER BY planned_start",
            Self::SELECT_COLS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![plan_id], Self::map_row)?;
        let mut tasks = Vec::new();
        for raw in rows {
            tasks.push(raw?.into_task()?);
        }
        Ok(tasks)
    }

    /// 保存任务 (INSERT OR REPLACE 实现 upsert 语义)
    pub fn save(&self, task: &ScheduledTask) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO scheduled_task (
                task_id, factory_id, line_id, planned_qty, completed_qty,
                planned_start, planned_end, actual_start, actual_end,
                assigned_workers, actual_efficiency, completion_probability,
                risk_level, status, adjustment_count,
                last_adjustment_reason, last_adjustment_at, plan_id
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18
            )
            "#,
            params![
                task.task_id,
                task.factory_id,
                task.line_id,
                task.planned_qty,
                task.completed_qty,
                fmt_dt(&task.planned_start),
                fmt_dt(&task.planned_end),
                task.actual_start.as_ref().map(fmt_dt),
                task.actual_end.as_ref().map(fmt_dt),
                task.assigned_workers,
                task.actual_efficiency,
                task.completion_probability,
                task.risk_level.map(|r| r.to_db_str()),
                task.status.to_db_str(),
                task.adjustment_count,
                task.last_adjustment_reason,
                task.last_adjustment_at.as_ref().map(fmt_dt),
                task.plan_id,
            ],
        )?;
        Ok(())
    }
}

// ==========================================
// 行映射中间结构
// ==========================================
struct RawTaskRow {
    task_id: String,
    factory_id: String,
    line_id: String,
    planned_qty: f64,
    completed_qty: f64,
    planned_start: String,
    planned_end: String,
    actual_start: Option<String>,
    actual_end: Option<String>,
    assigned_workers: Option<i32>,
    actual_efficiency: Option<f64>,
    completion_probability: Option<f64>,
    risk_level: Option<String>,
    status: String,
    adjustment_count: i32,
    last_adjustment_reason: Option<String>,
    last_adjustment_at: Option<String>,
    plan_id: Option<String>,
}

impl RawTaskRow {
    fn into_task(self) -> RepositoryResult<ScheduledTask> {
        let status = TaskStatus::from_db_str(&self.status).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: self.status.clone(),
            }
        })?;
        let risk_level = match self.risk_level.as_deref() {
            Some(raw) => Some(RiskLevel::from_db_str(raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "risk_level".to_string(),
                    message: raw.to_string(),
                }
            })?),
            None => None,
        };
        Ok(ScheduledTask {
            task_id: self.task_id,
            factory_id: self.factory_id,
            line_id: self.line_id,
            plan_id: self.plan_id,
            planned_qty: self.planned_qty,
            completed_qty: self.completed_qty,
            planned_start: parse_dt(&self.planned_start)?,
            planned_end: parse_dt(&self.planned_end)?,
            actual_start: self.actual_start.as_deref().map(parse_dt).transpose()?,
            actual_end: self.actual_end.as_deref().map(parse_dt).transpose()?,
            assigned_workers: self.assigned_workers,
            actual_efficiency: self.actual_efficiency,
            completion_probability: self.completion_probability,
            risk_level,
            status,
            adjustment_count: self.adjustment_count,
            last_adjustment_reason: self.last_adjustment_reason,
            last_adjustment_at: self.last_adjustment_at.as_deref().map(parse_dt).transpose()?,
        })
    }
}
