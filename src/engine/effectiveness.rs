// ==========================================
// 工厂自适应排产系统 - 策略有效性评估器
// ==========================================
// 职责: 工厂级 KPI -> 各调度启发式的归一化有效性评分 [0,1]
// 评分: 以目标比率为中心的 sigmoid
//   - 越大越好: 1/(1+e^{-3(actual/target-1)})
//   - 越小越好: 1/(1+e^{+3(actual/target-1)})
// 回落: 无历史数据时各 KPI 取目标值 (视为达标),从不报错 ——
//       下游驾驶舱将"无数据"与"达标"同等展示
// ==========================================

use crate::domain::strategy::EffectivenessScores;
use crate::domain::task::ScheduledTask;
use crate::domain::types::TaskStatus;
use crate::engine::predictor::sigmoid;
use crate::repository::{RepositoryResult, TaskRepository};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// KPI 目标值 (固定策略常量)
pub const TARGET_ON_TIME_RATE: f64 = 0.85;
pub const TARGET_CHANGEOVER_RATIO: f64 = 0.15;
pub const TARGET_LOAD_CV: f64 = 0.30;
pub const TARGET_THROUGHPUT_RATIO: f64 = 1.0;
pub const TARGET_MATERIAL_WAIT_RATIO: f64 = 0.10;
pub const TARGET_URGENT_ON_TIME_RATE: f64 = 0.95;

/// 评分 sigmoid 斜率
pub const SCORE_SLOPE: f64 = 3.0;

// 换型间隙启发式窗口 (分钟): 间隙落在 [5, 120] 计为换型时间
pub const CHANGEOVER_MIN_GAP_MINUTES: i64 = 5;
pub const CHANGEOVER_MAX_GAP_MINUTES: i64 = 120;

// ==========================================
// KpiSnapshot - 工厂级 KPI 快照 (原始值,非评分)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub on_time_rate: f64,        // 按期完工率
    pub changeover_ratio: f64,    // 换型时间占比
    pub load_cv: f64,             // 产线负载变异系数
    pub throughput_ratio: f64,    // 吞吐比 (完成量/计划量)
    pub material_wait_ratio: f64, // 待料时间占比
    pub urgent_on_time_rate: f64, // 紧急任务按期率
}

impl KpiSnapshot {
    /// 全达标快照 (无数据时的回落值)
    pub fn on_target() -> Self {
        Self {
            on_time_rate: TARGET_ON_TIME_RATE,
            changeover_ratio: TARGET_CHANGEOVER_RATIO,
            load_cv: TARGET_LOAD_CV,
            throughput_ratio: TARGET_THROUGHPUT_RATIO,
            material_wait_ratio: TARGET_MATERIAL_WAIT_RATIO,
            urgent_on_time_rate: TARGET_URGENT_ON_TIME_RATE,
        }
    }
}

/// 越大越好的 KPI 评分
pub fn score_positive(actual: f64, target: f64) -> f64 {
    sigmoid(SCORE_SLOPE * (actual / target - 1.0))
}

/// 越小越好的 KPI 评分
pub fn score_negative(actual: f64, target: f64) -> f64 {
    sigmoid(-SCORE_SLOPE * (actual / target - 1.0))
}

/// KPI 快照 -> 各策略有效性评分
///
/// 映射 (策略 <- 其最敏感的 KPI):
/// - 最早交期优先 <- 按期完工率
/// - 最少换型     <- 换型时间占比 (越小越好)
/// - 产能匹配     <- 负载变异系数 (越小越好)
/// - 最短工时     <- 吞吐比
/// - 物料就绪     <- 待料时间占比 (越小越好)
/// - 紧急优先     <- 紧急任务按期率
pub fn score_kpis(kpis: &KpiSnapshot) -> EffectivenessScores {
    EffectivenessScores {
        earliest_deadline: score_positive(kpis.on_time_rate, TARGET_ON_TIME_RATE),
        min_changeover: score_negative(kpis.changeover_ratio, TARGET_CHANGEOVER_RATIO),
        capacity_match: score_negative(kpis.load_cv, TARGET_LOAD_CV),
        shortest_process: score_positive(kpis.throughput_ratio, TARGET_THROUGHPUT_RATIO),
        material_ready: score_negative(kpis.material_wait_ratio, TARGET_MATERIAL_WAIT_RATIO),
        urgency_first: score_positive(kpis.urgent_on_time_rate, TARGET_URGENT_ON_TIME_RATE),
    }
}

/// 由任务集合聚合 KPI (纯函数)
///
/// 各 KPI 的分母为 0 时取其目标值
pub fn aggregate_kpis(tasks: &[ScheduledTask]) -> KpiSnapshot {
    if tasks.is_empty() {
        return KpiSnapshot::on_target();
    }

    // 按期完工率: 无 actual_end 的已完工任务按宽松口径计为按期
    let completed: Vec<&ScheduledTask> = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .collect();
    let on_time_rate = if completed.is_empty() {
        TARGET_ON_TIME_RATE
    } else {
        let on_time = completed.iter().filter(|t| t.is_on_time()).count();
        on_time as f64 / completed.len() as f64
    };

    // 吞吐比
    let planned_total: f64 = tasks.iter().map(|t| t.planned_qty).sum();
    let completed_total: f64 = tasks.iter().map(|t| t.completed_qty).sum();
    let throughput_ratio = if planned_total > 0.0 {
        completed_total / planned_total
    } else {
        TARGET_THROUGHPUT_RATIO
    };

    // 产线负载变异系数 (按计划量)
    let mut per_line: HashMap<&str, f64> = HashMap::new();
    for task in tasks {
        *per_line.entry(task.line_id.as_str()).or_insert(0.0) += task.planned_qty;
    }
    let load_cv = coefficient_of_variation(per_line.values().copied()).unwrap_or(TARGET_LOAD_CV);

    // 换型时间占比 (间隙启发式)
    let changeover_ratio = changeover_ratio(tasks).unwrap_or(TARGET_CHANGEOVER_RATIO);

    // 待料时间占比: 实际开工晚于计划开工的延迟分钟 / 计划窗口分钟
    let mut wait_minutes = 0.0;
    let mut window_minutes = 0.0;
    for task in tasks {
        window_minutes += task.planned_window_minutes().max(0) as f64;
        if let Some(actual_start) = task.actual_start {
            let delay = (actual_start - task.planned_start).num_minutes();
            if delay > 0 {
                wait_minutes += delay as f64;
            }
        }
    }
    let material_wait_ratio = if window_minutes > 0.0 {
        (wait_minutes / window_minutes).min(1.0)
    } else {
        TARGET_MATERIAL_WAIT_RATIO
    };

    // 紧急任务按期率: 紧急标志上游未接入,回落到目标值
    let urgent_on_time_rate = TARGET_URGENT_ON_TIME_RATE;

    KpiSnapshot {
        on_time_rate,
        changeover_ratio,
        load_cv,
        throughput_ratio,
        material_wait_ratio,
        urgent_on_time_rate,
    }
}

/// 变异系数 = 总体标准差 / 均值 (样本数 < 2 或均值非正时返回 None)
fn coefficient_of_variation(values: impl Iterator<Item = f64>) -> Option<f64> {
    let values: Vec<f64> = values.collect();
    if values.len() < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt() / mean)
}

/// 换型时间占比: 同产线相邻任务之间 [5,120] 分钟的间隙计为换型
fn changeover_ratio(tasks: &[ScheduledTask]) -> Option<f64> {
    let mut per_line: HashMap<&str, Vec<&ScheduledTask>> = HashMap::new();
    for task in tasks {
        per_line.entry(task.line_id.as_str()).or_default().push(task);
    }

    let mut processing_minutes = 0i64;
    let mut changeover_minutes = 0i64;
    for line_tasks in per_line.values_mut() {
        line_tasks.sort_by_key(|t| t.actual_start.unwrap_or(t.planned_start));
        let mut prev_end: Option<NaiveDateTime> = None;
        for task in line_tasks.iter() {
            let start = task.actual_start.unwrap_or(task.planned_start);
            let end = task.actual_end.unwrap_or(task.planned_end);
            processing_minutes += (end - start).num_minutes().max(0);
            if let Some(prev) = prev_end {
                let gap = (start - prev).num_minutes();
                if (CHANGEOVER_MIN_GAP_MINUTES..=CHANGEOVER_MAX_GAP_MINUTES).contains(&gap) {
                    changeover_minutes += gap;
                }
            }
            prev_end = Some(end);
        }
    }

    let total = processing_minutes + changeover_minutes;
    if total <= 0 {
        return None;
    }
    Some(changeover_minutes as f64 / total as f64)
}

// ==========================================
// EffectivenessEvaluator - 策略有效性评估器
// ==========================================
pub struct EffectivenessEvaluator {
    task_repo: Arc<TaskRepository>,
}

impl EffectivenessEvaluator {
    pub fn new(task_repo: Arc<TaskRepository>) -> Self {
        Self { task_repo }
    }

    /// 聚合工厂在日期范围内的 KPI (计划开工时间落入 [from, to))
    pub fn compute_kpis(
        &self,
        factory_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<KpiSnapshot> {
        let tasks: Vec<ScheduledTask> = self
            .task_repo
            .list_by_factory(factory_id)?
            .into_iter()
            .filter(|t| t.planned_start >= from && t.planned_start < to)
            .collect();
        Ok(aggregate_kpis(&tasks))
    }

    /// 聚合 KPI 并给出策略有效性评分
    pub fn evaluate(
        &self,
        factory_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<(KpiSnapshot, EffectivenessScores)> {
        let kpis = self.compute_kpis(factory_id, from, to)?;
        Ok((kpis, score_kpis(&kpis)))
    }
}
