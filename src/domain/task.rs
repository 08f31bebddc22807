// ==========================================
// 工厂自适应排产系统 - 排产任务领域模型
// ==========================================
// 生命周期: 由排产构建流程创建; 进度跟踪器与重排执行器修改;
//           只转移状态,从不删除
// ==========================================

use crate::domain::types::{RiskLevel, TaskStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduledTask - 排产任务
// ==========================================
// 注: completed_qty <= planned_qty 是期望而非写入时强制约束,
//     进度可能超过 100% (上游上报数据质量问题)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: String,                        // 任务ID
    pub factory_id: String,                     // 工厂ID (多租户)
    pub line_id: String,                        // 产线ID
    pub plan_id: Option<String>,                // 所属排产计划ID (手工建任务时为空)
    pub planned_qty: f64,                       // 计划数量
    pub completed_qty: f64,                     // 已完成数量
    pub planned_start: NaiveDateTime,           // 计划开工时间
    pub planned_end: NaiveDateTime,             // 计划完工时间
    pub actual_start: Option<NaiveDateTime>,    // 实际开工时间
    pub actual_end: Option<NaiveDateTime>,      // 实际完工时间
    pub assigned_workers: Option<i32>,          // 指派人数
    pub actual_efficiency: Option<f64>,         // 实际效率 (吞吐比)
    pub completion_probability: Option<f64>,    // 预测完工概率 [0,1]
    pub risk_level: Option<RiskLevel>,          // 风险等级
    pub status: TaskStatus,                     // 任务状态
    pub adjustment_count: i32,                  // 调整次数
    pub last_adjustment_reason: Option<String>, // 最近调整原因
    pub last_adjustment_at: Option<NaiveDateTime>, // 最近调整时间
}

impl ScheduledTask {
    /// 进度比例 (completed/planned, planned 为 0 时返回 0)
    pub fn progress_fraction(&self) -> f64 {
        if self.planned_qty <= 0.0 {
            0.0
        } else {
            self.completed_qty / self.planned_qty
        }
    }

    /// 进度百分比
    pub fn progress_percent(&self) -> f64 {
        self.progress_fraction() * 100.0
    }

    /// 计划时间窗宽度 (分钟)
    pub fn planned_window_minutes(&self) -> i64 {
        (self.planned_end - self.planned_start).num_minutes()
    }

    /// 是否按期完工
    ///
    /// 无 actual_end 的已完工任务视为按期 (宽松默认值,
    /// 驾驶舱将该人群作为数据质量信号单独展示)
    pub fn is_on_time(&self) -> bool {
        match self.actual_end {
            Some(end) => end <= self.planned_end,
            None => true,
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn make_task() -> ScheduledTask {
        ScheduledTask {
            task_id: "T001".to_string(),
            factory_id: "F001".to_string(),
            line_id: "L001".to_string(),
            plan_id: None,
            planned_qty: 100.0,
            completed_qty: 80.0,
            planned_start: dt(8),
            planned_end: dt(16),
            actual_start: Some(dt(8)),
            actual_end: None,
            assigned_workers: Some(4),
            actual_efficiency: None,
            completion_probability: None,
            risk_level: None,
            status: TaskStatus::InProgress,
            adjustment_count: 0,
            last_adjustment_reason: None,
            last_adjustment_at: None,
        }
    }

    #[test]
    fn test_progress_fraction() {
        let task = make_task();
        assert_eq!(task.progress_fraction(), 0.8);
    }

    #[test]
    fn test_progress_fraction_zero_planned() {
        let mut task = make_task();
        task.planned_qty = 0.0;
        assert_eq!(task.progress_fraction(), 0.0);
    }

    #[test]
    fn test_is_on_time_without_actual_end() {
        let task = make_task();
        assert!(task.is_on_time());
    }

    #[test]
    fn test_is_on_time_with_late_end() {
        let mut task = make_task();
        task.actual_end = Some(dt(18));
        assert!(!task.is_on_time());
    }

    #[test]
    fn test_planned_window_minutes() {
        let task = make_task();
        assert_eq!(task.planned_window_minutes(), 480);
    }
}
