// ==========================================
// 工厂自适应排产系统 - 调度策略领域模型
// ==========================================
// 策略集为闭合集合: 权重 JSON 含未知策略名时直接拒绝,
// 不做静默忽略 (deny_unknown_fields)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 策略标识 (Strategy Kind)
// ==========================================
// 启发式全集 (v1 固定 6 项):
// - 最早交期优先 / 最少换型 / 产能匹配 / 最短工时 / 物料就绪 / 紧急优先
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    EarliestDeadline,
    MinChangeover,
    CapacityMatch,
    ShortestProcess,
    MaterialReady,
    UrgencyFirst,
}

impl StrategyKind {
    /// 策略全集 (固定顺序, 权重遍历/归一化按此序)
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::EarliestDeadline,
        StrategyKind::MinChangeover,
        StrategyKind::CapacityMatch,
        StrategyKind::ShortestProcess,
        StrategyKind::MaterialReady,
        StrategyKind::UrgencyFirst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::EarliestDeadline => "earliest_deadline",
            StrategyKind::MinChangeover => "min_changeover",
            StrategyKind::CapacityMatch => "capacity_match",
            StrategyKind::ShortestProcess => "shortest_process",
            StrategyKind::MaterialReady => "material_ready",
            StrategyKind::UrgencyFirst => "urgency_first",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            StrategyKind::EarliestDeadline => "最早交期优先",
            StrategyKind::MinChangeover => "最少换型",
            StrategyKind::CapacityMatch => "产能匹配",
            StrategyKind::ShortestProcess => "最短工时",
            StrategyKind::MaterialReady => "物料就绪",
            StrategyKind::UrgencyFirst => "紧急优先",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// StrategyWeights - 策略权重集
// ==========================================
// 不变量: 持久化后的权重之和为 1.0 (±1e-9)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyWeights {
    pub earliest_deadline: f64,
    pub min_changeover: f64,
    pub capacity_match: f64,
    pub shortest_process: f64,
    pub material_ready: f64,
    pub urgency_first: f64,
}

impl StrategyWeights {
    /// 默认权重分配 (首次访问时惰性创建)
    pub fn default_split() -> Self {
        Self {
            earliest_deadline: 0.30,
            min_changeover: 0.15,
            capacity_match: 0.15,
            shortest_process: 0.10,
            material_ready: 0.15,
            urgency_first: 0.15,
        }
    }

    pub fn get(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::EarliestDeadline => self.earliest_deadline,
            StrategyKind::MinChangeover => self.min_changeover,
            StrategyKind::CapacityMatch => self.capacity_match,
            StrategyKind::ShortestProcess => self.shortest_process,
            StrategyKind::MaterialReady => self.material_ready,
            StrategyKind::UrgencyFirst => self.urgency_first,
        }
    }

    pub fn set(&mut self, kind: StrategyKind, value: f64) {
        match kind {
            StrategyKind::EarliestDeadline => self.earliest_deadline = value,
            StrategyKind::MinChangeover => self.min_changeover = value,
            StrategyKind::CapacityMatch => self.capacity_match = value,
            StrategyKind::ShortestProcess => self.shortest_process = value,
            StrategyKind::MaterialReady => self.material_ready = value,
            StrategyKind::UrgencyFirst => self.urgency_first = value,
        }
    }

    pub fn sum(&self) -> f64 {
        StrategyKind::ALL.iter().map(|k| self.get(*k)).sum()
    }

    /// 归一化至和为 1.0 (和为 0 时跳过)
    pub fn normalize(&mut self) {
        let total = self.sum();
        if total == 0.0 {
            return;
        }
        for kind in StrategyKind::ALL {
            self.set(kind, self.get(kind) / total);
        }
    }

    /// 按固定顺序导出 (策略, 权重) 对
    pub fn to_pairs(&self) -> Vec<(StrategyKind, f64)> {
        StrategyKind::ALL.iter().map(|k| (*k, self.get(*k))).collect()
    }
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self::default_split()
    }
}

// ==========================================
// StrategyConfig - 工厂级策略配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub factory_id: String,                      // 工厂ID
    pub weights: StrategyWeights,                // 当前权重
    pub last_adapted_at: Option<NaiveDateTime>,  // 最近一次自适应时间
    pub adaptation_count: i32,                   // 自适应次数
}

impl StrategyConfig {
    /// 默认配置 (首次访问时惰性创建)
    pub fn new_default(factory_id: &str) -> Self {
        Self {
            factory_id: factory_id.to_string(),
            weights: StrategyWeights::default_split(),
            last_adapted_at: None,
            adaptation_count: 0,
        }
    }
}

// ==========================================
// EffectivenessScores - 策略有效性评分 [0,1]
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessScores {
    pub earliest_deadline: f64,
    pub min_changeover: f64,
    pub capacity_match: f64,
    pub shortest_process: f64,
    pub material_ready: f64,
    pub urgency_first: f64,
}

impl EffectivenessScores {
    pub fn get(&self, kind: StrategyKind) -> f64 {
        match kind {
            StrategyKind::EarliestDeadline => self.earliest_deadline,
            StrategyKind::MinChangeover => self.min_changeover,
            StrategyKind::CapacityMatch => self.capacity_match,
            StrategyKind::ShortestProcess => self.shortest_process,
            StrategyKind::MaterialReady => self.material_ready,
            StrategyKind::UrgencyFirst => self.urgency_first,
        }
    }
}

// ==========================================
// WeightAdjustmentRecord - 权重调整审计记录
// ==========================================
// 约束: 只追加,从不修改; 序列化失败只记日志不阻断权重写入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightAdjustmentRecord {
    pub record_id: String,                  // 记录ID
    pub factory_id: String,                 // 工厂ID
    pub adjusted_at: NaiveDateTime,         // 调整时间
    pub weights_before: StrategyWeights,    // 调整前权重
    pub weights_after: StrategyWeights,     // 调整后权重
    pub scores: Option<EffectivenessScores>, // 有效性评分 (人工覆写时为 None)
    pub reason: String,                     // 调整原因
}
