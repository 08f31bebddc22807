// ==========================================
// 工厂自适应排产系统 - 重排触发器领域模型
// ==========================================
// 触发器为瞬时对象: 由检测器产出,不持久化
// ==========================================

use crate::domain::types::{RescheduleUrgency, TriggerPriority, TriggerType};
use serde::{Deserialize, Serialize};

// ==========================================
// RescheduleTrigger - 重排触发器
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleTrigger {
    pub trigger_type: TriggerType,   // 触发器类型
    pub priority: TriggerPriority,   // 优先级
    pub entity_id: String,           // 受影响实体ID (产线/任务/工厂)
    pub reason: String,              // 可读原因
}

impl RescheduleTrigger {
    pub fn new(
        trigger_type: TriggerType,
        priority: TriggerPriority,
        entity_id: &str,
        reason: String,
    ) -> Self {
        Self {
            trigger_type,
            priority,
            entity_id: entity_id.to_string(),
            reason,
        }
    }
}

// ==========================================
// RescheduleRecommendation - 重排建议
// ==========================================
// 决策规则: needs_reschedule <=> 存在 CRITICAL/HIGH 触发器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleRecommendation {
    pub factory_id: String,
    pub needs_reschedule: bool,
    pub urgency: RescheduleUrgency,
    pub triggers: Vec<RescheduleTrigger>,
}
