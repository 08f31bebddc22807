// ==========================================
// 工厂自适应排产系统 - 物料库存仓储
// ==========================================
// 职责: 为重排触发检测提供低库存信号
// 约定: "低库存" = current_qty < safety_qty
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// InventoryRepository - 物料库存仓储
// ==========================================
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 创建新的 InventoryRepository 实例
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

    /// 统计工厂低库存物料数
    pub fn count_low_stock(&self, factory_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM material_stock \
             WHERE factory_id = ?1 AND current_qty < safety_qty",
            params![factory_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 写入/更新物料库存行 (测试与数据维护入口)
    pub fn upsert_material(
        &self,
        material_id: &str,
        factory_id: &str,
        material_name: &str,
        current_qty: f64,
        safety_qty: f64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO material_stock \
             (material_id, factory_id, material_name, current_qty, safety_qty) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![material_id, factory_id, material_name, current_qty, safety_qty],
        )?;
        Ok(())
    }
}
