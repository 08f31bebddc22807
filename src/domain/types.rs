// ==========================================
// 工厂自适应排产系统 - 领域类型定义
// ==========================================
// 职责: 定义闭合枚举类型 (任务状态/产线状态/风险等级/触发器)
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 任务状态 (Task Status)
// ==========================================
// 生命周期: PENDING -> IN_PROGRESS -> COMPLETED (只转移,不删除)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,    // 待开工
    InProgress, // 生产中
    Completed,  // 已完工
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::InProgress => write!(f, "IN_PROGRESS"),
            TaskStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl TaskStatus {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(TaskStatus::Pending),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

// ==========================================
// 产线状态 (Line Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineStatus {
    Active,      // 运行中
    Inactive,    // 停用
    Maintenance, // 检修中
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineStatus::Active => write!(f, "ACTIVE"),
            LineStatus::Inactive => write!(f, "INACTIVE"),
            LineStatus::Maintenance => write!(f, "MAINTENANCE"),
        }
    }
}

impl LineStatus {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(LineStatus::Active),
            "INACTIVE" => Some(LineStatus::Inactive),
            "MAINTENANCE" => Some(LineStatus::Maintenance),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LineStatus::Active => "ACTIVE",
            LineStatus::Inactive => "INACTIVE",
            LineStatus::Maintenance => "MAINTENANCE",
        }
    }
}

// ==========================================
// 风险等级 (Risk Level)
// ==========================================
// 由完工概率映射: >=0.8 低 / >=0.6 中 / >=0.4 高 / 其余 危急
// 顺序: Low < Medium < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,      // 低风险
    Medium,   // 中风险
    High,     // 高风险
    Critical, // 危急
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl RiskLevel {
    /// 从数据库字符串解析
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// 重排触发器类型 (Trigger Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    LineFault,                // 产线故障 (检修中)
    LowCompletionProbability, // 完工概率过低
    MaterialShortage,         // 物料短缺
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::LineFault => write!(f, "LINE_FAULT"),
            TriggerType::LowCompletionProbability => write!(f, "LOW_COMPLETION_PROBABILITY"),
            TriggerType::MaterialShortage => write!(f, "MATERIAL_SHORTAGE"),
        }
    }
}

// ==========================================
// 触发器优先级 (Trigger Priority)
// ==========================================
// 决策规则: 存在 CRITICAL/HIGH 触发器 => 需要重排
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for TriggerPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerPriority::Low => write!(f, "LOW"),
            TriggerPriority::Medium => write!(f, "MEDIUM"),
            TriggerPriority::High => write!(f, "HIGH"),
            TriggerPriority::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 重排紧迫度 (Reschedule Urgency)
// ==========================================
// 由加权触发计数分档: 0 无 / 1-2 低 / 3-5 中 / 6-10 高 / >10 危急
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RescheduleUrgency {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RescheduleUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RescheduleUrgency::None => write!(f, "NONE"),
            RescheduleUrgency::Low => write!(f, "LOW"),
            RescheduleUrgency::Medium => write!(f, "MEDIUM"),
            RescheduleUrgency::High => write!(f, "HIGH"),
            RescheduleUrgency::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ==========================================
// 重排模式 (Reschedule Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RescheduleMode {
    AffectedOnly, // 只重评受影响任务
    All,          // 重评全厂待开工+在制任务
}

impl fmt::Display for RescheduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RescheduleMode::AffectedOnly => write!(f, "AFFECTED_ONLY"),
            RescheduleMode::All => write!(f, "ALL"),
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_roundtrip() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            assert_eq!(TaskStatus::from_db_str(status.to_db_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_db_str("UNKNOWN"), None);
    }

    #[test]
    fn test_line_status_roundtrip() {
        for status in [LineStatus::Active, LineStatus::Inactive, LineStatus::Maintenance] {
            assert_eq!(LineStatus::from_db_str(status.to_db_str()), Some(status));
        }
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_trigger_priority_ordering() {
        assert!(TriggerPriority::Low < TriggerPriority::Medium);
        assert!(TriggerPriority::High < TriggerPriority::Critical);
    }
}
