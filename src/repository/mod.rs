// ==========================================
// 工厂自适应排产系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod efficiency_repo;
pub mod error;
pub mod inventory_repo;
pub mod line_repo;
pub mod strategy_repo;
pub mod task_repo;

// 重导出核心仓储
pub use efficiency_repo::EfficiencyHistoryRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryRepository;
pub use line_repo::LineRepository;
pub use strategy_repo::{
    FeatureWeightRepository, StrategyConfigRepository, WeightAdjustmentRepository,
};
pub use task_repo::TaskRepository;
