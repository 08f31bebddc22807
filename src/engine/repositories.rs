// ==========================================
// 工厂自适应排产系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合 APS 引擎所需的所有 Repository
// 目标: 减少引擎构造函数参数数量,提升可维护性
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    EfficiencyHistoryRepository, FeatureWeightRepository, InventoryRepository, LineRepository,
    StrategyConfigRepository, TaskRepository, WeightAdjustmentRepository,
};

/// APS 引擎仓储集合
///
/// 聚合 APS 引擎所需的所有 Repository,简化依赖注入。
#[derive(Clone)]
pub struct ApsRepositories {
    /// 任务仓储
    pub task_repo: Arc<TaskRepository>,
    /// 产线仓储
    pub line_repo: Arc<LineRepository>,
    /// 效率采样仓储
    pub efficiency_repo: Arc<EfficiencyHistoryRepository>,
    /// 策略配置仓储
    pub strategy_repo: Arc<StrategyConfigRepository>,
    /// 权重调整审计仓储
    pub adjustment_repo: Arc<WeightAdjustmentRepository>,
    /// 预测特征权重仓储
    pub feature_weight_repo: Arc<FeatureWeightRepository>,
    /// 物料库存仓储
    pub inventory_repo: Arc<InventoryRepository>,
}

impl ApsRepositories {
    /// 在共享连接上构建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            task_repo: Arc::new(TaskRepository::from_connection(conn.clone())),
            line_repo: Arc::new(LineRepository::from_connection(conn.clone())),
            efficiency_repo: Arc::new(EfficiencyHistoryRepository::from_connection(conn.clone())),
            strategy_repo: Arc::new(StrategyConfigRepository::from_connection(conn.clone())),
            adjustment_repo: Arc::new(WeightAdjustmentRepository::from_connection(conn.clone())),
            feature_weight_repo: Arc::new(FeatureWeightRepository::from_connection(conn.clone())),
            inventory_repo: Arc::new(InventoryRepository::from_connection(conn)),
        }
    }
}
