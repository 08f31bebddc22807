// ==========================================
// 工厂自适应排产系统 - 进度跟踪器
// ==========================================
// 职责: 进度上报编排
//   载入任务 -> 记录前后进度 -> (可选) 记效率采样并刷新产线滚动效率
//   -> 重算完工概率与风险 -> 持久化任务
// 副作用: 一次任务写 + 可能一次产线写 + 一次采样追加
// 约定: 不做内部重试,瞬时存储失败由调用方重试
// ==========================================

use crate::config::ApsConfig;
use crate::domain::efficiency::EfficiencySample;
use crate::domain::types::RiskLevel;
use crate::engine::efficiency::RollingEfficiencyCalculator;
use crate::engine::predictor::CompletionPredictor;
use crate::engine::risk::classify_risk;
use crate::repository::{EfficiencyHistoryRepository, RepositoryResult, TaskRepository};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ==========================================
// ProgressUpdateResult - 进度上报结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdateResult {
    pub task_id: String,
    pub previous_progress_pct: f64,
    pub new_progress_pct: f64,
    pub completion_probability: f64,
    pub risk_level: RiskLevel,
    pub needs_attention: bool, // 概率低于关注阈值
}

// ==========================================
// ProgressTracker - 进度跟踪器
// ==========================================
pub struct ProgressTracker {
    task_repo: Arc<TaskRepository>,
    efficiency_repo: Arc<EfficiencyHistoryRepository>,
    rolling_calc: Arc<RollingEfficiencyCalculator>,
    predictor: Arc<CompletionPredictor>,
    config: ApsConfig,
}

impl ProgressTracker {
    pub fn new(
        task_repo: Arc<TaskRepository>,
        efficiency_repo: Arc<EfficiencyHistoryRepository>,
        rolling_calc: Arc<RollingEfficiencyCalculator>,
        predictor: Arc<CompletionPredictor>,
        config: ApsConfig,
    ) -> Self {
        Self {
            task_repo,
            efficiency_repo,
            rolling_calc,
            predictor,
            config,
        }
    }

    /// 进度上报
    ///
    /// # 参数
    /// - task_id: 任务ID
    /// - completed_qty: 新的已完成数量
    /// - actual_efficiency: 实际效率 (吞吐比),未上报时为 None
    ///
    /// # 返回
    /// - Err(NotFound): 任务不存在
    pub fn update_progress(
        &self,
        task_id: &str,
        completed_qty: f64,
        actual_efficiency: Option<f64>,
    ) -> RepositoryResult<ProgressUpdateResult> {
        self.update_progress_at(task_id, completed_qty, actual_efficiency, Utc::now().naive_utc())
    }

    /// 指定"当前时刻"的进度上报 (测试入口)
    pub fn update_progress_at(
        &self,
        task_id: &str,
        completed_qty: f64,
        actual_efficiency: Option<f64>,
        now: NaiveDateTime,
    ) -> RepositoryResult<ProgressUpdateResult> {
        // 1. 载入任务 (不存在 -> NotFound)
        let mut task = self.task_repo.find_by_id(task_id)?;

        // 2. 记录前后进度
        let previous_progress_pct = task.progress_percent();
        task.completed_qty = completed_qty;
        let new_progress_pct = task.progress_percent();

        // 3. 效率上报: 写任务 + 追加采样 + 刷新产线滚动效率
        if let Some(efficiency) = actual_efficiency {
            task.actual_efficiency = Some(efficiency);
            let sample = EfficiencySample::from_reported_ratio(
                &task.line_id,
                &task.task_id,
                now,
                completed_qty,
                efficiency,
                task.assigned_workers,
            );
            self.efficiency_repo.append(&sample)?;
            self.rolling_calc.refresh_at(&task.line_id, now)?;
        }

        // 4. 重算概率与风险并持久化
        let probability = self.predictor.predict_at(&task, now)?;
        let risk_level = classify_risk(probability);
        task.completion_probability = Some(probability);
        task.risk_level = Some(risk_level);
        self.task_repo.save(&task)?;

        // 5. 关注标记
        let needs_attention = probability < self.config.attention_threshold;
        if needs_attention {
            tracing::warn!(
                task_id,
                probability,
                risk = %risk_level,
                "任务完工概率低于关注阈值"
            );
        }

        Ok(ProgressUpdateResult {
            task_id: task_id.to_string(),
            previous_progress_pct,
            new_progress_pct,
            completion_probability: probability,
            risk_level,
            needs_attention,
        })
    }
}
