// ==========================================
// 工厂自适应排产系统 - 重排触发检测器
// ==========================================
// 职责: 扫描三类独立信号并合并为触发器列表
//   - 检修产线        -> CRITICAL LINE_FAULT (每线一条)
//   - 低概率在制任务  -> HIGH LOW_COMPLETION_PROBABILITY (每任务一条)
//   - 低库存物料      -> MEDIUM MATERIAL_SHORTAGE
// 决策: needs_reschedule <=> 存在 CRITICAL/HIGH 触发器
// 紧迫度: 加权计数 lowProb + 2×faultLine 分档
//   0 无 / 1-2 低 / 3-5 中 / 6-10 高 / >10 危急 (策略常量,非推导值)
// ==========================================

use crate::config::ApsConfig;
use crate::domain::trigger::{RescheduleRecommendation, RescheduleTrigger};
use crate::domain::types::{
    LineStatus, RescheduleUrgency, TaskStatus, TriggerPriority, TriggerType,
};
use crate::repository::{
    InventoryRepository, LineRepository, RepositoryResult, TaskRepository,
};
use std::sync::Arc;

// 紧迫度分档边界 (加权触发计数)
pub const URGENCY_LOW_MAX: i64 = 2;
pub const URGENCY_MEDIUM_MAX: i64 = 5;
pub const URGENCY_HIGH_MAX: i64 = 10;

/// 加权触发计数 -> 紧迫度
pub fn urgency_from_weighted_count(weighted_count: i64) -> RescheduleUrgency {
    match weighted_count {
        0 => RescheduleUrgency::None,
        n if n <= URGENCY_LOW_MAX => RescheduleUrgency::Low,
        n if n <= URGENCY_MEDIUM_MAX => RescheduleUrgency::Medium,
        n if n <= URGENCY_HIGH_MAX => RescheduleUrgency::High,
        _ => RescheduleUrgency::Critical,
    }
}

// ==========================================
// TriggerDetector - 重排触发检测器
// ==========================================
pub struct TriggerDetector {
    task_repo: Arc<TaskRepository>,
    line_repo: Arc<LineRepository>,
    inventory_repo: Arc<InventoryRepository>,
    config: ApsConfig,
}

impl TriggerDetector {
    pub fn new(
        task_repo: Arc<TaskRepository>,
        line_repo: Arc<LineRepository>,
        inventory_repo: Arc<InventoryRepository>,
        config: ApsConfig,
    ) -> Self {
        Self {
            task_repo,
            line_repo,
            inventory_repo,
            config,
        }
    }

    /// 检查工厂是否需要重排
    pub fn check_reschedule_need(
        &self,
        factory_id: &str,
    ) -> RepositoryResult<RescheduleRecommendation> {
        let mut triggers = Vec::new();

        // 1. 检修产线 -> CRITICAL LINE_FAULT
        let fault_lines = self
            .line_repo
            .list_by_factory_and_status(factory_id, LineStatus::Maintenance)?;
        let fault_line_count = fault_lines.len() as i64;
        for line in fault_lines {
            triggers.push(RescheduleTrigger::new(
                TriggerType::LineFault,
                TriggerPriority::Critical,
                &line.line_id,
                format!("产线 {} 处于检修状态", line.line_name),
            ));
        }

        // 2. 低概率在制任务 -> HIGH LOW_COMPLETION_PROBABILITY
        let in_progress = self
            .task_repo
            .list_by_factory_and_status(factory_id, TaskStatus::InProgress)?;
        let mut low_prob_count = 0i64;
        for task in in_progress {
            let probability = match task.completion_probability {
                Some(p) => p,
                None => continue,
            };
            if probability < self.config.attention_threshold {
                low_prob_count += 1;
                triggers.push(RescheduleTrigger::new(
                    TriggerType::LowCompletionProbability,
                    TriggerPriority::High,
                    &task.task_id,
                    format!("任务 {} 完工概率 {:.2} 低于阈值", task.task_id, probability),
                ));
            }
        }

        // 3. 低库存物料 -> MEDIUM MATERIAL_SHORTAGE
        let low_stock_count = self.inventory_repo.count_low_stock(factory_id)?;
        if low_stock_count > 0 {
            triggers.push(RescheduleTrigger::new(
                TriggerType::MaterialShortage,
                TriggerPriority::Medium,
                factory_id,
                format!("{} 种物料低于安全库存", low_stock_count),
            ));
        }

        // 决策规则与紧迫度分档
        let needs_reschedule = triggers
            .iter()
            .any(|t| t.priority >= TriggerPriority::High);
        let weighted_count = low_prob_count + 2 * fault_line_count;
        let urgency = urgency_from_weighted_count(weighted_count);

        tracing::debug!(
            factory_id,
            trigger_count = triggers.len(),
            needs_reschedule,
            urgency = %urgency,
            "重排触发检测完成"
        );

        Ok(RescheduleRecommendation {
            factory_id: factory_id.to_string(),
            needs_reschedule,
            urgency,
            triggers,
        })
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_band_edges() {
        assert_eq!(urgency_from_weighted_count(0), RescheduleUrgency::None);
        assert_eq!(urgency_from_weighted_count(1), RescheduleUrgency::Low);
        assert_eq!(urgency_from_weighted_count(2), RescheduleUrgency::Low);
        assert_eq!(urgency_from_weighted_count(3), RescheduleUrgency::Medium);
        assert_eq!(urgency_from_weighted_count(5), RescheduleUrgency::Medium);
        assert_eq!(urgency_from_weighted_count(6), RescheduleUrgency::High);
        assert_eq!(urgency_from_weighted_count(10), RescheduleUrgency::High);
        assert_eq!(urgency_from_weighted_count(11), RescheduleUrgency::Critical);
    }
}
