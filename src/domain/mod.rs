// ==========================================
// 工厂自适应排产系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod efficiency;
pub mod line;
pub mod strategy;
pub mod task;
pub mod trigger;
pub mod types;

// 重导出核心类型
pub use efficiency::EfficiencySample;
pub use line::ProductionLine;
pub use strategy::{
    EffectivenessScores, StrategyConfig, StrategyKind, StrategyWeights, WeightAdjustmentRecord,
};
pub use task::ScheduledTask;
pub use trigger::{RescheduleRecommendation, RescheduleTrigger};
pub use types::{
    LineStatus, RescheduleMode, RescheduleUrgency, RiskLevel, TaskStatus, TriggerPriority,
    TriggerType,
};
