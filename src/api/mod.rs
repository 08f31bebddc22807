// ==========================================
// 工厂自适应排产系统 - API层
// ==========================================
// 职责: 对外只读/编排入口,错误转换为用户友好消息
// ==========================================

pub mod dashboard_api;
pub mod error;

pub use dashboard_api::{DashboardApi, DashboardView, LineSummary, RiskTaskView, TaskSummary};
pub use error::{ApiError, ApiResult};
