// ==========================================
// 工厂自适应排产系统 - 驾驶舱 API
// ==========================================
// 职责: 纯读聚合,不做任何落库
// 组成: 任务摘要 (驾驶舱 0.8/0.5 分桶) + KPI 快照 (原始值)
//       + 产线摘要 + Top-N 风险任务 (概率升序+建议动作)
//       + 重排触发建议
// 数据质量信号: 缺 actual_end 的已完工任务数 ("默认按期"人群)
// 一致性: 单次调用取一致快照,跨仓储读偏差可容忍
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::line::ProductionLine;
use crate::domain::task::ScheduledTask;
use crate::domain::trigger::RescheduleRecommendation;
use crate::domain::types::{LineStatus, RiskLevel, TaskStatus};
use crate::engine::effectiveness::{EffectivenessEvaluator, KpiSnapshot};
use crate::engine::risk::{dashboard_bucket, DashboardBucket};
use crate::engine::trigger::TriggerDetector;
use crate::repository::{LineRepository, TaskRepository};
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// KPI 快照的默认回溯窗口 (天)
pub const KPI_WINDOW_DAYS: i64 = 7;

// ==========================================
// 驾驶舱读模型
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    // 驾驶舱分桶 (对已评分的待开工+在制任务)
    pub on_track: usize,
    pub at_risk: usize,
    pub delayed: usize,
    pub unscored: usize, // 尚无预测概率的活动任务
    // 数据质量信号: 缺 actual_end 的已完工任务 (按宽松口径计为按期)
    pub completed_missing_actual_end: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub maintenance: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTaskView {
    pub task_id: String,
    pub line_id: String,
    pub completion_probability: f64,
    pub risk_level: Option<RiskLevel>,
    pub progress_pct: f64,
    pub suggested_actions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub factory_id: String,
    pub generated_at: NaiveDateTime,
    pub task_summary: TaskSummary,
    pub kpis: KpiSnapshot,
    pub line_summary: LineSummary,
    pub top_risks: Vec<RiskTaskView>,
    pub reschedule: RescheduleRecommendation,
}

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    task_repo: Arc<TaskRepository>,
    line_repo: Arc<LineRepository>,
    evaluator: Arc<EffectivenessEvaluator>,
    trigger_detector: Arc<TriggerDetector>,
}

impl DashboardApi {
    pub fn new(
        task_repo: Arc<TaskRepository>,
        line_repo: Arc<LineRepository>,
        evaluator: Arc<EffectivenessEvaluator>,
        trigger_detector: Arc<TriggerDetector>,
    ) -> Self {
        Self {
            task_repo,
            line_repo,
            evaluator,
            trigger_detector,
        }
    }

    /// 聚合驾驶舱读模型
    ///
    /// # 参数
    /// - factory_id: 工厂ID
    /// - top_n: 风险任务榜单长度
    pub fn get_dashboard(&self, factory_id: &str, top_n: usize) -> ApiResult<DashboardView> {
        self.get_dashboard_at(factory_id, top_n, Utc::now().naive_utc())
    }

    /// 指定"当前时刻"聚合 (测试入口)
    pub fn get_dashboard_at(
        &self,
        factory_id: &str,
        top_n: usize,
        now: NaiveDateTime,
    ) -> ApiResult<DashboardView> {
        if factory_id.trim().is_empty() {
            return Err(crate::api::error::ApiError::InvalidInput(
                "工厂ID不能为空".to_string(),
            ));
        }

        let tasks = self.task_repo.list_by_factory(factory_id)?;
        let lines = self.line_repo.list_by_factory(factory_id)?;

        let task_summary = summarize_tasks(&tasks);
        let line_summary = summarize_lines(&lines);
        let kpis = self
            .evaluator
            .compute_kpis(factory_id, now - Duration::days(KPI_WINDOW_DAYS), now)?;
        let top_risks = top_risk_tasks(&tasks, &lines, top_n);
        let reschedule = self.trigger_detector.check_reschedule_need(factory_id)?;

        Ok(DashboardView {
            factory_id: factory_id.to_string(),
            generated_at: now,
            task_summary,
            kpis,
            line_summary,
            top_risks,
            reschedule,
        })
    }
}

/// 任务摘要: 状态计数 + 驾驶舱分桶 + 数据质量信号
fn summarize_tasks(tasks: &[ScheduledTask]) -> TaskSummary {
    let mut summary = TaskSummary {
        total: tasks.len(),
        pending: 0,
        in_progress: 0,
        completed: 0,
        on_track: 0,
        at_risk: 0,
        delayed: 0,
        unscored: 0,
        completed_missing_actual_end: 0,
    };
    for task in tasks {
        match task.status {
            TaskStatus::Pending => summary.pending += 1,
            TaskStatus::InProgress => summary.in_progress += 1,
            TaskStatus::Completed => {
                summary.completed += 1;
                if task.actual_end.is_none() {
                    summary.completed_missing_actual_end += 1;
                }
                continue;
            }
        }
        // 分桶只针对活动任务
        match task.completion_probability {
            Some(p) => match dashboard_bucket(p) {
                DashboardBucket::OnTrack => summary.on_track += 1,
                DashboardBucket::AtRisk => summary.at_risk += 1,
                DashboardBucket::Delayed => summary.delayed += 1,
            },
            None => summary.unscored += 1,
        }
    }
    summary
}

/// 产线摘要: 按状态计数
fn summarize_lines(lines: &[ProductionLine]) -> LineSummary {
    let mut summary = LineSummary {
        total: lines.len(),
        active: 0,
        inactive: 0,
        maintenance: 0,
    };
    for line in lines {
        match line.status {
            LineStatus::Active => summary.active += 1,
            LineStatus::Inactive => summary.inactive += 1,
            LineStatus::Maintenance => summary.maintenance += 1,
        }
    }
    summary
}

/// Top-N 风险任务: 活动任务按概率升序,附建议动作
fn top_risk_tasks(
    tasks: &[ScheduledTask],
    lines: &[ProductionLine],
    top_n: usize,
) -> Vec<RiskTaskView> {
    let line_map: HashMap<&str, &ProductionLine> =
        lines.iter().map(|l| (l.line_id.as_str(), l)).collect();

    let mut scored: Vec<&ScheduledTask> = tasks
        .iter()
        .filter(|t| t.status != TaskStatus::Completed && t.completion_probability.is_some())
        .collect();
    scored.sort_by(|a, b| {
        a.completion_probability
            .partial_cmp(&b.completion_probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    scored
        .into_iter()
        .take(top_n)
        .map(|task| {
            let probability = task.completion_probability.unwrap_or(0.0);
            let line = line_map.get(task.line_id.as_str()).copied();
            RiskTaskView {
                task_id: task.task_id.clone(),
                line_id: task.line_id.clone(),
                completion_probability: probability,
                risk_level: task.risk_level,
                progress_pct: task.progress_percent(),
                suggested_actions: suggest_actions(task, line, probability),
            }
        })
        .collect()
}

/// 建议动作启发式 (按概率与效率偏差的 if/else 规则)
fn suggest_actions(
    task: &ScheduledTask,
    line: Option<&ProductionLine>,
    probability: f64,
) -> Vec<String> {
    let mut actions = Vec::new();
    let efficiency_deviation = line.map(|l| l.efficiency_deviation()).unwrap_or(0.0);

    if probability < 0.4 {
        actions.push("完工风险危急,建议立即重排该任务".to_string());
    } else if probability < 0.6 {
        actions.push("完工风险偏高,建议跟踪进度并评估重排".to_string());
    }

    if efficiency_deviation < -0.1 {
        actions.push("产线效率低于基准,检查设备状态与人员配置".to_string());
    }

    if let (Some(assigned), Some(l)) = (task.assigned_workers, line) {
        if assigned < l.min_workers {
            actions.push(format!(
                "指派人数 {} 低于产线最低配置 {},建议增派",
                assigned, l.min_workers
            ));
        }
    }

    if actions.is_empty() {
        actions.push("保持当前排程,持续监控".to_string());
    }
    actions
}

// ==========================================
// 单元测试 (纯聚合部分; 端到端见集成测试)
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

    fn make_task(id: &str, status: TaskStatus, probability: Option<f64>) -> ScheduledTask {
        ScheduledTask {
            task_id: id.to_string(),
            factory_id: "F001".to_string(),
            line_id: "L001".to_string(),
            plan_id: None,
            planned_qty: 100.0,
            completed_qty: 40.0,
            planned_start: dt(8),
            planned_end: dt(16),
            actual_start: None,
            actual_end: None,
            assigned_workers: Some(4),
            actual_efficiency: None,
            completion_probability: probability,
            risk_level: probability.map(crate::engine::risk::classify_risk),
            status,
            adjustment_count: 0,
            last_adjustment_reason: None,
            last_adjustment_at: None,
        }
    }

    fn make_line(id: &str, status: LineStatus, efficiency: f64) -> ProductionLine {
        ProductionLine {
            line_id: id.to_string(),
            factory_id: "F001".to_string(),
            line_name: format!("产线{}", id),
            status,
            rolling_efficiency: efficiency,
            min_workers: 4,
        }
    }

    #[test]
    fn test_summarize_tasks_buckets() {
        let tasks = vec![
            make_task("T1", TaskStatus::InProgress, Some(0.9)), // on_track
            make_task("T2", TaskStatus::InProgress, Some(0.6)), // at_risk
            make_task("T3", TaskStatus::Pending, Some(0.3)),    // delayed
            make_task("T4", TaskStatus::Pending, None),         // unscored
            make_task("T5", TaskStatus::Completed, Some(0.9)),  // completed, 缺 actual_end
        ];
        let summary = summarize_tasks(&tasks);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.on_track, 1);
        assert_eq!(summary.at_risk, 1);
        assert_eq!(summary.delayed, 1);
        assert_eq!(summary.unscored, 1);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.completed_missing_actual_end, 1);
    }

    #[test]
    fn test_top_risks_sorted_ascending() {
        let tasks = vec![
            make_task("T1", TaskStatus::InProgress, Some(0.7)),
            make_task("T2", TaskStatus::InProgress, Some(0.2)),
            make_task("T3", TaskStatus::InProgress, Some(0.5)),
            make_task("T4", TaskStatus::Completed, Some(0.1)), // 已完工不入榜
        ];
        let lines = vec![make_line("L001", LineStatus::Active, 1.0)];
        let top = top_risk_tasks(&tasks, &lines, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].task_id, "T2");
        assert_eq!(top[1].task_id, "T3");
    }

    #[test]
    fn test_suggest_actions_low_probability_and_low_efficiency() {
        let task = make_task("T1", TaskStatus::InProgress, Some(0.3));
        let line = make_line("L001", LineStatus::Active, 0.8);
        let actions = suggest_actions(&task, Some(&line), 0.3);
        assert!(actions.iter().any(|a| a.contains("立即重排")));
        assert!(actions.iter().any(|a| a.contains("效率低于基准")));
    }

    #[test]
    fn test_suggest_actions_healthy_task() {
        let task = make_task("T1", TaskStatus::InProgress, Some(0.9));
        let line = make_line("L001", LineStatus::Active, 1.05);
        let actions = suggest_actions(&task, Some(&line), 0.9);
        assert_eq!(actions.len(), 1);
        assert!(actions[0].contains("保持当前排程"));
    }

    #[test]
    fn test_summarize_lines() {
        let lines = vec![
            make_line("L1", LineStatus::Active, 1.0),
            make_line("L2", LineStatus::Maintenance, 1.0),
            make_line("L3", LineStatus::Inactive, 1.0),
            make_line("L4", LineStatus::Active, 1.0),
        ];
        let summary = summarize_lines(&lines);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.maintenance, 1);
        assert_eq!(summary.inactive, 1);
    }
}
