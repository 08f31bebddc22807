// ==========================================
// 工厂自适应排产系统 - 引擎层
// ==========================================
// 职责: 实现 APS 业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 所有决策必须输出 reason
// ==========================================

pub mod adaptation;
pub mod effectiveness;
pub mod efficiency;
pub mod lock_map;
pub mod predictor;
pub mod progress;
pub mod repositories;
pub mod reschedule;
pub mod risk;
pub mod trigger;

// 重导出核心引擎
pub use adaptation::{AdaptationResult, StrategyAdaptationEngine};
pub use effectiveness::{EffectivenessEvaluator, KpiSnapshot};
pub use efficiency::RollingEfficiencyCalculator;
pub use predictor::CompletionPredictor;
pub use progress::{ProgressTracker, ProgressUpdateResult};
pub use repositories::ApsRepositories;
pub use reschedule::{RescheduleExecutor, RescheduleReport};
pub use risk::{classify_risk, dashboard_bucket, DashboardBucket};
pub use trigger::TriggerDetector;
