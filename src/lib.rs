// ==========================================
// 工厂自适应排产系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 多租户工厂管理后端的自适应排产核心
//           (进度跟踪 / 完工预测 / 策略自适应 / 重排决策)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    LineStatus, RescheduleMode, RescheduleUrgency, RiskLevel, TaskStatus, TriggerPriority,
    TriggerType,
};

// 领域实体
pub use domain::{
    EfficiencySample, ProductionLine, RescheduleRecommendation, RescheduleTrigger, ScheduledTask,
    StrategyConfig, StrategyKind, StrategyWeights, WeightAdjustmentRecord,
};

// 引擎
pub use engine::{
    ApsRepositories, CompletionPredictor, EffectivenessEvaluator, ProgressTracker,
    RescheduleExecutor, RollingEfficiencyCalculator, StrategyAdaptationEngine, TriggerDetector,
};

// 配置
pub use config::{ApsConfig, ConfigManager};

// API
pub use api::DashboardApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工厂自适应排产系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================
