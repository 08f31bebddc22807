// ==========================================
// 工厂自适应排产系统 - 完工概率预测器
// ==========================================
// 职责: 任务当前状态 -> 固定 12 维特征向量 -> 线性 logit -> sigmoid 概率
// 回落: 工厂缺特征权重行时使用内置默认权重表
// 说明: 本引擎是纯计算,唯一的持久化由进度跟踪器/重排执行器负责
// ==========================================

use crate::domain::line::ProductionLine;
use crate::domain::task::ScheduledTask;
use crate::repository::{FeatureWeightRepository, LineRepository, RepositoryResult};
use chrono::{NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// 特征维数 (固定)
pub const FEATURE_COUNT: usize = 12;

/// 时间紧迫度/时间窗宽度的归一化视野 (分钟)
pub const URGENCY_HORIZON_MINUTES: f64 = 480.0;

/// 开工延迟的归一化上限 (分钟)
pub const DELAY_CAP_MINUTES: f64 = 120.0;

/// 历史完工率占位常量 (上游信号未接入)
pub const PLACEHOLDER_HISTORICAL_RATE: f64 = 0.8;

/// 物料就绪度占位常量 (上游信号未接入)
pub const PLACEHOLDER_MATERIAL_READINESS: f64 = 0.9;

/// 特征名全集 (feature_weight 表的键,顺序与特征向量一致)
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "progress",
    "time_urgency",
    "efficiency_deviation",
    "worker_adequacy",
    "historical_rate",
    "start_delay",
    "material_readiness",
    "urgent_flag",
    "time_window",
    "bias",
    "efficiency_trend",
    "conflict_count",
];

/// 内置默认权重表 (符号已调校)
pub const DEFAULT_FEATURE_WEIGHTS: [f64; FEATURE_COUNT] = [
    2.0,  // progress
    -1.5, // time_urgency
    1.0,  // efficiency_deviation
    0.5,  // worker_adequacy
    1.2,  // historical_rate
    -1.0, // start_delay
    0.8,  // material_readiness
    -0.5, // urgent_flag
    0.3,  // time_window
    0.5,  // bias
    0.4,  // efficiency_trend
    -0.3, // conflict_count
];

/// sigmoid(x) = 1 / (1 + e^-x)
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// 构建固定 12 维特征向量 (纯函数)
///
/// # 参数
/// - task: 排产任务
/// - line: 任务所在产线 (未知时各产线相关特征取中性回落值)
/// - now: 当前时刻
pub fn build_features(
    task: &ScheduledTask,
    line: Option<&ProductionLine>,
    now: NaiveDateTime,
) -> [f64; FEATURE_COUNT] {
    // 1. 进度比例
    let progress = task.progress_fraction();

    // 2. 时间紧迫度 = clamp(1 - 剩余分钟/480, 0, 1)
    let remaining_minutes = (task.planned_end - now).num_minutes() as f64;
    let time_urgency = (1.0 - remaining_minutes / URGENCY_HORIZON_MINUTES).clamp(0.0, 1.0);

    // 3. 效率偏差 = 产线滚动效率 - 1.0
    let efficiency_deviation = line.map(|l| l.efficiency_deviation()).unwrap_or(0.0);

    // 4. 人员充足度 = min(1, 指派/产线最低), 未知取 0.5
    let worker_adequacy = match (task.assigned_workers, line) {
        (Some(assigned), Some(l)) if l.min_workers > 0 => {
            (assigned as f64 / l.min_workers as f64).min(1.0)
        }
        _ => 0.5,
    };

    // 6. 当前开工延迟 = min(1, 延迟分钟/120), 仅对尚未开工且已过计划开工的任务
    let start_delay = match task.actual_start {
        None if now > task.planned_start => {
            let delay_minutes = (now - task.planned_start).num_minutes() as f64;
            (delay_minutes / DELAY_CAP_MINUTES).min(1.0)
        }
        _ => 0.0,
    };

    // 9. 时间窗宽度 = min(1, 窗口分钟/480)
    let window_minutes = task.planned_window_minutes() as f64;
    let time_window = (window_minutes / URGENCY_HORIZON_MINUTES).min(1.0);

    [
        progress,
        time_urgency,
        efficiency_deviation,
        worker_adequacy,
        PLACEHOLDER_HISTORICAL_RATE, // 5. 历史完工率 (占位)
        start_delay,
        PLACEHOLDER_MATERIAL_READINESS, // 7. 物料就绪度 (占位)
        0.0,                            // 8. 紧急标志 (上游信号未接入)
        time_window,
        1.0, // 10. 偏置项
        0.0, // 11. 效率趋势 (多采样历史未接入)
        0.0, // 12. 冲突计数 (未接入)
    ]
}

/// 按权重表计算 logit 与概率 (纯函数)
pub fn score_features(
    features: &[f64; FEATURE_COUNT],
    factory_weights: &HashMap<String, f64>,
) -> f64 {
    let mut logit = 0.0;
    for (i, name) in FEATURE_NAMES.iter().enumerate() {
        let weight = factory_weights
            .get(*name)
            .copied()
            .unwrap_or(DEFAULT_FEATURE_WEIGHTS[i]);
        logit += weight * features[i];
    }
    sigmoid(logit)
}

// ==========================================
// CompletionPredictor - 完工概率预测器
// ==========================================
pub struct CompletionPredictor {
    line_repo: Arc<LineRepository>,
    feature_weight_repo: Arc<FeatureWeightRepository>,
}

impl CompletionPredictor {
    pub fn new(
        line_repo: Arc<LineRepository>,
        feature_weight_repo: Arc<FeatureWeightRepository>,
    ) -> Self {
        Self {
            line_repo,
            feature_weight_repo,
        }
    }

    /// 预测任务完工概率
    pub fn predict(&self, task: &ScheduledTask) -> RepositoryResult<f64> {
        self.predict_at(task, Utc::now().naive_utc())
    }

    /// 指定"当前时刻"预测 (测试入口)
    pub fn predict_at(&self, task: &ScheduledTask, now: NaiveDateTime) -> RepositoryResult<f64> {
        let line = match self.line_repo.find_by_id(&task.line_id) {
            Ok(line) => Some(line),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    task_id = %task.task_id,
                    line_id = %task.line_id,
                    "产线不存在,产线相关特征取中性回落值"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let factory_weights = self.feature_weight_repo.load_for_factory(&task.factory_id)?;
        let features = build_features(task, line.as_ref(), now);
        Ok(score_features(&features, &factory_weights))
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{LineStatus, TaskStatus};
    use chrono::NaiveDate;

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
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
            planned_start: dt(10, 8, 0),
            planned_end: dt(10, 16, 0),
            actual_start: Some(dt(10, 8, 0)),
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

    fn make_line() -> ProductionLine {
        ProductionLine {
            line_id: "L001".to_string(),
            factory_id: "F001".to_string(),
            line_name: "一号线".to_string(),
            status: LineStatus::Active,
            rolling_efficiency: 1.0,
            min_workers: 4,
        }
    }

    #[test]
    fn test_sigmoid_basics() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_feature_vector_worked_example() {
        // planned=100, completed=80, 距计划完工 1 小时
        let task = make_task();
        let line = make_line();
        let now = dt(10, 15, 0);
        let features = build_features(&task, Some(&line), now);

        assert!((features[0] - 0.8).abs() < 1e-9); // 进度
        assert!((features[1] - 0.875).abs() < 1e-9); // 紧迫度 = 1 - 60/480
        assert_eq!(features[2], 0.0); // 效率偏差 (滚动效率 1.0)
        assert_eq!(features[3], 1.0); // 人员充足度 4/4
        assert_eq!(features[4], PLACEHOLDER_HISTORICAL_RATE);
        assert_eq!(features[5], 0.0); // 已开工,无延迟
        assert_eq!(features[6], PLACEHOLDER_MATERIAL_READINESS);
        assert_eq!(features[7], 0.0);
        assert_eq!(features[8], 1.0); // 8 小时窗 = 480 分钟
        assert_eq!(features[9], 1.0); // 偏置
        assert_eq!(features[10], 0.0);
        assert_eq!(features[11], 0.0);
    }

    #[test]
    fn test_worker_adequacy_unknown_is_half() {
        let mut task = make_task();
        task.assigned_workers = None;
        let features = build_features(&task, Some(&make_line()), dt(10, 15, 0));
        assert_eq!(features[3], 0.5);

        let task = make_task();
        let features = build_features(&task, None, dt(10, 15, 0));
        assert_eq!(features[3], 0.5);
    }

    #[test]
    fn test_urgency_clamped() {
        let task = make_task();
        // 计划完工已过 -> 紧迫度封顶 1.0
        let features = build_features(&task, Some(&make_line()), dt(10, 20, 0));
        assert_eq!(features[1], 1.0);
        // 剩余远超视野 -> 紧迫度 0
        let features = build_features(&task, Some(&make_line()), dt(10, 0, 0));
        assert_eq!(features[1], 0.0);
    }

    #[test]
    fn test_start_delay_capped() {
        let mut task = make_task();
        task.actual_start = None;
        // 延迟 60 分钟 -> 0.5
        let features = build_features(&task, Some(&make_line()), dt(10, 9, 0));
        assert!((features[5] - 0.5).abs() < 1e-9);
        // 延迟 300 分钟 -> 封顶 1.0
        let features = build_features(&task, Some(&make_line()), dt(10, 13, 0));
        assert_eq!(features[5], 1.0);
    }

    #[test]
    fn test_default_weight_scoring() {
        let task = make_task();
        let features = build_features(&task, Some(&make_line()), dt(10, 15, 0));
        let probability = score_features(&features, &HashMap::new());

        // 手算期望 logit:
        // 2.0*0.8 - 1.5*0.875 + 1.0*0 + 0.5*1.0 + 1.2*0.8 + (-1.0)*0
        // + 0.8*0.9 + (-0.5)*0 + 0.3*1.0 + 0.5*1.0 + 0.4*0 + (-0.3)*0
        let expected_logit =
            2.0 * 0.8 - 1.5 * 0.875 + 0.5 + 1.2 * 0.8 + 0.8 * 0.9 + 0.3 + 0.5;
        assert!((probability - sigmoid(expected_logit)).abs() < 1e-12);
        assert!(probability > 0.0 && probability < 1.0);
    }

    #[test]
    fn test_factory_weight_override() {
        let task = make_task();
        let features = build_features(&task, Some(&make_line()), dt(10, 15, 0));

        let mut overrides = HashMap::new();
        // 全部清零 + 仅保留偏置 => sigmoid(w_bias)
        for name in FEATURE_NAMES {
            overrides.insert(name.to_string(), 0.0);
        }
        overrides.insert("bias".to_string(), 2.0);
        let probability = score_features(&features, &overrides);
        assert!((probability - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_progress_improves_probability() {
        let line = make_line();
        let now = dt(10, 15, 0);
        let mut low = make_task();
        low.completed_qty = 10.0;
        let mut high = make_task();
        high.completed_qty = 95.0;

        let p_low = score_features(&build_features(&low, Some(&line), now), &HashMap::new());
        let p_high = score_features(&build_features(&high, Some(&line), now), &HashMap::new());
        assert!(p_high > p_low);
    }
}
