// ==========================================
// 工厂自适应排产系统 - 重排执行器
// ==========================================
// 职责: 按模式重评任务 (AFFECTED_ONLY / ALL),报告前后按期率改善
// 口径:
//   - "前"按期率 = 已完工任务中 actual_end <= planned_end 的占比
//     (缺 actual_end 计为按期 —— 宽松默认,驾驶舱单独展示该人群)
//   - "后"投影按期率 = (按期完工数 + Σ在制任务预测概率) / 任务总数
//   - 改善% = (后-前)/前×100, 前为 0 时取 0
// 容错: 单任务重评失败记日志后跳过,不中断批次
// simulate: 用朴素 +boost 概率启发式做同口径对比,不落库
// ==========================================

use crate::config::ApsConfig;
use crate::domain::task::ScheduledTask;
use crate::domain::types::{RescheduleMode, TaskStatus};
use crate::engine::predictor::CompletionPredictor;
use crate::engine::risk::classify_risk;
use crate::repository::{RepositoryResult, TaskRepository};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

// ==========================================
// RescheduleReport - 重排结果报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleReport {
    pub factory_id: String,
    pub mode: RescheduleMode,
    pub evaluated_count: usize,
    pub failed_count: usize,
    pub before_on_time_rate: f64,
    pub after_on_time_rate: f64,
    pub improvement_pct: f64,
    pub simulated: bool,
}

// ==========================================
// RescheduleExecutor - 重排执行器
// ==========================================
pub struct RescheduleExecutor {
    task_repo: Arc<TaskRepository>,
    predictor: Arc<CompletionPredictor>,
    config: ApsConfig,
}

impl RescheduleExecutor {
    pub fn new(
        task_repo: Arc<TaskRepository>,
        predictor: Arc<CompletionPredictor>,
        config: ApsConfig,
    ) -> Self {
        Self {
            task_repo,
            predictor,
            config,
        }
    }

    /// 执行重排
    ///
    /// # 参数
    /// - factory_id: 工厂ID
    /// - mode: AFFECTED_ONLY 时只重评 affected_task_ids; ALL 重评全部待开工+在制
    /// - affected_task_ids: 受影响任务集 (mode=ALL 时忽略)
    /// - reason: 调整原因 (写入任务审计字段)
    pub fn execute(
        &self,
        factory_id: &str,
        mode: RescheduleMode,
        affected_task_ids: Option<&[String]>,
        reason: &str,
    ) -> RepositoryResult<RescheduleReport> {
        self.execute_at(factory_id, mode, affected_task_ids, reason, Utc::now().naive_utc())
    }

    /// 指定"当前时刻"执行 (测试入口)
    pub fn execute_at(
        &self,
        factory_id: &str,
        mode: RescheduleMode,
        affected_task_ids: Option<&[String]>,
        reason: &str,
        now: NaiveDateTime,
    ) -> RepositoryResult<RescheduleReport> {
        let all_tasks = self.task_repo.list_by_factory(factory_id)?;
        let before_on_time_rate = completed_on_time_rate(&all_tasks);

        let targets = select_targets(&all_tasks, mode, affected_task_ids);

        // 逐任务独立重评: 单任务失败记日志后跳过
        let mut evaluated_count = 0usize;
        let mut failed_count = 0usize;
        for task_id in &targets {
            match self.reevaluate_one(task_id, reason, now) {
                Ok(()) => evaluated_count += 1,
                Err(e) => {
                    failed_count += 1;
                    tracing::warn!(task_id = %task_id, error = %e, "任务重评失败,跳过");
                }
            }
        }

        // 重评后的投影按期率
        let refreshed = self.task_repo.list_by_factory(factory_id)?;
        let after_on_time_rate = projected_on_time_rate(&refreshed);
        let improvement_pct = improvement(before_on_time_rate, after_on_time_rate);

        tracing::info!(
            factory_id,
            mode = %mode,
            evaluated_count,
            failed_count,
            before_on_time_rate,
            after_on_time_rate,
            "重排执行完成"
        );

        Ok(RescheduleReport {
            factory_id: factory_id.to_string(),
            mode,
            evaluated_count,
            failed_count,
            before_on_time_rate,
            after_on_time_rate,
            improvement_pct,
            simulated: false,
        })
    }

    /// 模拟重排: 受影响任务概率按朴素 +boost 启发式抬升,不落库
    pub fn simulate(
        &self,
        factory_id: &str,
        mode: RescheduleMode,
        affected_task_ids: Option<&[String]>,
    ) -> RepositoryResult<RescheduleReport> {
        let all_tasks = self.task_repo.list_by_factory(factory_id)?;
        let before_on_time_rate = completed_on_time_rate(&all_tasks);

        let targets: HashSet<String> =
            select_targets(&all_tasks, mode, affected_task_ids).into_iter().collect();

        // 同"后"口径,但受影响在制任务的概率取 min(1, p + boost)
        let boost = self.config.simulate_probability_boost;
        let mut boosted = all_tasks.clone();
        for task in boosted.iter_mut() {
            if targets.contains(&task.task_id) {
                if let Some(p) = task.completion_probability {
                    task.completion_probability = Some((p + boost).min(1.0));
                }
            }
        }
        let after_on_time_rate = projected_on_time_rate(&boosted);
        let improvement_pct = improvement(before_on_time_rate, after_on_time_rate);

        Ok(RescheduleReport {
            factory_id: factory_id.to_string(),
            mode,
            evaluated_count: targets.len(),
            failed_count: 0,
            before_on_time_rate,
            after_on_time_rate,
            improvement_pct,
            simulated: true,
        })
    }

    /// 重评单个任务: 重算概率/风险 + 调整计数与原因 + 持久化
    fn reevaluate_one(&self, task_id: &str, reason: &str, now: NaiveDateTime) -> RepositoryResult<()> {
        let mut task = self.task_repo.find_by_id(task_id)?;
        let probability = self.predictor.predict_at(&task, now)?;
        task.completion_probability = Some(probability);
        task.risk_level = Some(classify_risk(probability));
        task.adjustment_count += 1;
        task.last_adjustment_reason = Some(reason.to_string());
        task.last_adjustment_at = Some(now);
        self.task_repo.save(&task)
    }
}

/// 选择重评对象
fn select_targets(
    all_tasks: &[ScheduledTask],
    mode: RescheduleMode,
    affected_task_ids: Option<&[String]>,
) -> Vec<String> {
    match mode {
        RescheduleMode::AffectedOnly => affected_task_ids
            .map(|ids| ids.to_vec())
            .unwrap_or_default(),
        RescheduleMode::All => all_tasks
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::InProgress))
            .map(|t| t.task_id.clone())
            .collect(),
    }
}

/// "前"按期率: 已完工任务的按期占比 (无已完工任务时为 0)
fn completed_on_time_rate(tasks: &[ScheduledTask]) -> f64 {
    let completed: Vec<&ScheduledTask> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();
    if completed.is_empty() {
        return 0.0;
    }
    let on_time = completed.iter().filter(|t| t.is_on_time()).count();
    on_time as f64 / completed.len() as f64
}

/// "后"投影按期率: (按期完工数 + Σ在制任务概率) / 任务总数
fn projected_on_time_rate(tasks: &[ScheduledTask]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let mut numerator = 0.0;
    for task in tasks {
        match task.status {
            TaskStatus::Completed => {
                if task.is_on_time() {
                    numerator += 1.0;
                }
            }
            TaskStatus::InProgress => {
                numerator += task.completion_probability.unwrap_or(0.0);
            }
            TaskStatus::Pending => {}
        }
    }
    numerator / tasks.len() as f64
}

/// 改善% = (后-前)/前×100, 前为 0 时取 0
fn improvement(before: f64, after: f64) -> f64 {
    if before == 0.0 {
        0.0
    } else {
        (after - before) / before * 100.0
    }
}

// ==========================================
// 单元测试 (纯计算部分; 持久化行为见集成测试)
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

    fn make_task(id: &str, status: TaskStatus) -> ScheduledTask {
        ScheduledTask {
            task_id: id.to_string(),
            factory_id: "F001".to_string(),
            line_id: "L001".to_string(),
            plan_id: None,
            planned_qty: 100.0,
            completed_qty: 50.0,
            planned_start: dt(8),
            planned_end: dt(16),
            actual_start: Some(dt(8)),
            actual_end: None,
            assigned_workers: Some(4),
            actual_efficiency: None,
            completion_probability: Some(0.6),
            risk_level: None,
            status,
            adjustment_count: 0,
            last_adjustment_reason: None,
            last_adjustment_at: None,
        }
    }

    #[test]
    fn test_before_rate_missing_actual_end_is_on_time() {
        let mut done = make_task("T1", TaskStatus::Completed);
        done.actual_end = None;
        let mut late = make_task("T2", TaskStatus::Completed);
        late.actual_end = Some(dt(20));
        let rate = completed_on_time_rate(&[done, late]);
        assert!((rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_projected_rate_mixes_completed_and_in_progress() {
        let mut done = make_task("T1", TaskStatus::Completed);
        done.actual_end = Some(dt(15));
        let wip = make_task("T2", TaskStatus::InProgress);
        let pending = make_task("T3", TaskStatus::Pending);
        let rate = projected_on_time_rate(&[done, wip, pending]);
        // (1 + 0.6 + 0) / 3
        assert!((rate - 1.6 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_improvement_zero_before() {
        assert_eq!(improvement(0.0, 0.8), 0.0);
        assert!((improvement(0.5, 0.6) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_select_targets_all_excludes_completed() {
        let tasks = vec![
            make_task("T1", TaskStatus::Pending),
            make_task("T2", TaskStatus::InProgress),
            make_task("T3", TaskStatus::Completed),
        ];
        let targets = select_targets(&tasks, RescheduleMode::All, None);
        assert_eq!(targets, vec!["T1".to_string(), "T2".to_string()]);
    }

    #[test]
    fn test_select_targets_affected_only() {
        let tasks = vec![make_task("T1", TaskStatus::Pending)];
        let ids = vec!["T9".to_string()];
        let targets = select_targets(&tasks, RescheduleMode::AffectedOnly, Some(&ids));
        assert_eq!(targets, ids);
        let empty = select_targets(&tasks, RescheduleMode::AffectedOnly, None);
        assert!(empty.is_empty());
    }
}
