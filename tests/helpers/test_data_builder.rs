// ==========================================
// 测试数据构建器
// ==========================================
// 职责: 生成集成测试用的任务/产线/物料样本数据
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use factory_aps::domain::line::ProductionLine;
use factory_aps::domain::task::ScheduledTask;
use factory_aps::domain::types::{LineStatus, TaskStatus};

pub const TEST_FACTORY: &str = "F001";

/// 固定基准时刻: 2026-03-10 的整点
pub fn base_time(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 10)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

/// 创建测试用 ScheduledTask (计划窗口 08:00 - 16:00)
pub fn create_test_task(task_id: &str, line_id: &str, status: TaskStatus) -> ScheduledTask {
    ScheduledTask {
        task_id: task_id.to_string(),
        factory_id: TEST_FACTORY.to_string(),
        line_id: line_id.to_string(),
        plan_id: None,
        planned_qty: 100.0,
        completed_qty: 0.0,
        planned_start: base_time(8),
        planned_end: base_time(16),
        actual_start: None,
        actual_end: None,
        assigned_workers: Some(4),
        actual_efficiency: None,
        completion_probability: None,
        risk_level: None,
        status,
        adjustment_count: 0,
        last_adjustment_reason: None,
        last_adjustment_at: None,
    }
}

/// 创建测试用 ProductionLine
pub fn create_test_line(line_id: &str, status: LineStatus) -> ProductionLine {
    ProductionLine {
        line_id: line_id.to_string(),
        factory_id: TEST_FACTORY.to_string(),
        line_name: format!("测试产线{}", line_id),
        status,
        rolling_efficiency: 1.0,
        min_workers: 3,
    }
}
