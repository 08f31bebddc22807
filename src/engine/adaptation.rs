// ==========================================
// 工厂自适应排产系统 - 策略权重自适应引擎
// ==========================================
// 状态机: Idle -> Evaluating -> Adjusting -> Persisted
// 步骤:
//   1. 按 KPI 评估各策略有效性评分 (effectiveness)
//   2. newWeight = clamp(old + lr·(score-0.5), min, max)
//   3. 归一化至和为 1.0 (和为 0 时跳过)
//   4. 写审计记录 —— 序列化失败只记日志,不阻断权重写入
//   5. 持久化配置,自适应计数 +1,打时间戳
// simulate 只执行 1-3; set_weights/reset_to_default 跳过评分直接覆写
// 并发: 同工厂至多一次自适应 (按工厂加锁)
// ==========================================

use crate::config::ApsConfig;
use crate::domain::strategy::{
    EffectivenessScores, StrategyConfig, StrategyKind, StrategyWeights, WeightAdjustmentRecord,
};
use crate::engine::effectiveness::{EffectivenessEvaluator, KpiSnapshot};
use crate::engine::lock_map::{lock_ignore_poison, LockMap};
use crate::repository::{
    RepositoryResult, StrategyConfigRepository, WeightAdjustmentRepository,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// AdaptationResult - 一次自适应的结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptationResult {
    pub factory_id: String,
    pub kpis: KpiSnapshot,
    pub scores: EffectivenessScores,
    pub weights_before: StrategyWeights,
    pub weights_after: StrategyWeights,
    pub persisted: bool, // simulate 时为 false
}

// ==========================================
// StrategyAdaptationEngine - 权重自适应引擎
// ==========================================
pub struct StrategyAdaptationEngine {
    strategy_repo: Arc<StrategyConfigRepository>,
    adjustment_repo: Arc<WeightAdjustmentRepository>,
    evaluator: Arc<EffectivenessEvaluator>,
    config: ApsConfig,
    // 同工厂的权重读-改-写串行化
    factory_locks: LockMap,
}

impl StrategyAdaptationEngine {
    pub fn new(
        strategy_repo: Arc<StrategyConfigRepository>,
        adjustment_repo: Arc<WeightAdjustmentRepository>,
        evaluator: Arc<EffectivenessEvaluator>,
        config: ApsConfig,
    ) -> Self {
        Self {
            strategy_repo,
            adjustment_repo,
            evaluator,
            config,
            factory_locks: LockMap::new(),
        }
    }

    /// 单步权重更新: clamp(old + lr·(score-0.5), min, max), 然后归一化
    ///
    /// 纯函数,供 adjust/simulate 共用
    pub fn step_weights(&self, weights: &StrategyWeights, scores: &EffectivenessScores) -> StrategyWeights {
        let mut next = *weights;
        for kind in StrategyKind::ALL {
            let old = next.get(kind);
            let nudged = old + self.config.learning_rate * (scores.get(kind) - 0.5);
            next.set(kind, nudged.clamp(self.config.min_weight, self.config.max_weight));
        }
        next.normalize();
        next
    }

    /// 执行一次权重自适应 (评估 -> 调整 -> 审计 -> 持久化)
    pub fn adjust_weights(
        &self,
        factory_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        reason: &str,
    ) -> RepositoryResult<AdaptationResult> {
        let entry = self.factory_locks.entry(factory_id);
        let _guard = lock_ignore_poison(&entry);

        // Evaluating
        let (kpis, scores) = self.evaluator.evaluate(factory_id, from, to)?;

        // Adjusting
        let mut config = self.strategy_repo.get_or_create_default(factory_id)?;
        let weights_before = config.weights;
        let weights_after = self.step_weights(&weights_before, &scores);

        let now = Utc::now().naive_utc();

        // 审计与权重写入彼此独立: 审计失败不阻断
        self.append_audit(factory_id, now, weights_before, weights_after, Some(scores), reason);

        // Persisted
        config.weights = weights_after;
        config.last_adapted_at = Some(now);
        config.adaptation_count += 1;
        self.strategy_repo.save(&config)?;

        tracing::info!(
            factory_id,
            adaptation_count = config.adaptation_count,
            reason,
            "策略权重自适应完成"
        );

        Ok(AdaptationResult {
            factory_id: factory_id.to_string(),
            kpis,
            scores,
            weights_before,
            weights_after,
            persisted: true,
        })
    }

    /// 模拟一次权重自适应: 只评估+调整,不写审计,不持久化
    pub fn simulate_adjustment(
        &self,
        factory_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<AdaptationResult> {
        let (kpis, scores) = self.evaluator.evaluate(factory_id, from, to)?;
        let config = self.strategy_repo.get_or_create_default(factory_id)?;
        let weights_before = config.weights;
        let weights_after = self.step_weights(&weights_before, &scores);

        Ok(AdaptationResult {
            factory_id: factory_id.to_string(),
            kpis,
            scores,
            weights_before,
            weights_after,
            persisted: false,
        })
    }

    /// 人工覆写权重: 归一化调用方权重并持久化,跳过评分
    pub fn set_weights(
        &self,
        factory_id: &str,
        weights: StrategyWeights,
        reason: &str,
    ) -> RepositoryResult<StrategyConfig> {
        let entry = self.factory_locks.entry(factory_id);
        let _guard = lock_ignore_poison(&entry);

        let mut config = self.strategy_repo.get_or_create_default(factory_id)?;
        let weights_before = config.weights;
        let mut weights_after = weights;
        weights_after.normalize();

        let now = Utc::now().naive_utc();
        self.append_audit(factory_id, now, weights_before, weights_after, None, reason);

        config.weights = weights_after;
        config.last_adapted_at = Some(now);
        config.adaptation_count += 1;
        self.strategy_repo.save(&config)?;
        tracing::info!(factory_id, reason, "策略权重已人工覆写");
        Ok(config)
    }

    /// 重置为默认权重分配
    pub fn reset_to_default(&self, factory_id: &str) -> RepositoryResult<StrategyConfig> {
        self.set_weights(factory_id, StrategyWeights::default_split(), "重置为默认权重")
    }

    /// 写审计记录; 失败只记日志 (与权重写入互相独立)
    fn append_audit(
        &self,
        factory_id: &str,
        adjusted_at: NaiveDateTime,
        weights_before: StrategyWeights,
        weights_after: StrategyWeights,
        scores: Option<EffectivenessScores>,
        reason: &str,
    ) {
        let record = WeightAdjustmentRecord {
            record_id: Uuid::new_v4().to_string(),
            factory_id: factory_id.to_string(),
            adjusted_at,
            weights_before,
            weights_after,
            scores,
            reason: reason.to_string(),
        };
        if let Err(e) = self.adjustment_repo.append(&record) {
            tracing::error!(factory_id, error = %e, "权重调整审计写入失败,权重写入继续");
        }
    }
}
