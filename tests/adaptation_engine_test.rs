// ==========================================
// 策略权重自适应引擎集成测试
// ==========================================
// 职责: 验证 评估 -> 调整 -> 审计 -> 持久化 状态机
// 关键性质:
//   - 无任务数据时 KPI 回落目标值, 评分全 0.5, 权重不动
//   - simulate 不落库不写审计
//   - 审计记录与配置计数同步推进
// ==========================================

#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use std::sync::Arc;

use factory_aps::config::ApsConfig;
use factory_aps::domain::strategy::{StrategyKind, StrategyWeights};
use factory_aps::engine::{EffectivenessEvaluator, StrategyAdaptationEngine};
use test_data_builder::{base_time, TEST_FACTORY};
use test_helpers::setup_env;

fn engine(env: &test_helpers::TestEnv) -> StrategyAdaptationEngine {
    let evaluator = Arc::new(EffectivenessEvaluator::new(env.repos.task_repo.clone()));
    StrategyAdaptationEngine::new(
        env.repos.strategy_repo.clone(),
        env.repos.adjustment_repo.clone(),
        evaluator,
        ApsConfig::default(),
    )
}

#[test]
fn test_adjust_weights_persists_config_and_audit() {
    let env = setup_env();
    let result = engine(&env)
        .adjust_weights(TEST_FACTORY, base_time(0), base_time(23), "周期性自适应")
        .unwrap();

    assert!(result.persisted);
    assert!((result.weights_after.sum() - 1.0).abs() < 1e-9);

    let config = env
        .repos
        .strategy_repo
        .find(TEST_FACTORY)
        .unwrap()
        .expect("配置应已持久化");
    assert_eq!(config.adaptation_count, 1);
    assert!(config.last_adapted_at.is_some());

    let audit_count = env
        .repos
        .adjustment_repo
        .count_by_factory(TEST_FACTORY)
        .unwrap();
    assert_eq!(audit_count, 1);
}

#[test]
fn test_no_data_keeps_weights_unchanged() {
    let env = setup_env();
    // 窗口内无任务 -> KPI 回落目标值 -> 评分全 0.5 -> 权重不动
    let result = engine(&env)
        .adjust_weights(TEST_FACTORY, base_time(0), base_time(23), "空窗口自适应")
        .unwrap();

    let default = StrategyWeights::default_split();
    for kind in StrategyKind::ALL {
        assert!((result.weights_after.get(kind) - default.get(kind)).abs() < 1e-9);
    }
}

#[test]
fn test_simulate_does_not_persist_or_audit() {
    let env = setup_env();
    let result = engine(&env)
        .simulate_adjustment(TEST_FACTORY, base_time(0), base_time(23))
        .unwrap();
    assert!(!result.persisted);

    // get_or_create_default 会懒创建配置,但计数不推进
    let config = env
        .repos
        .strategy_repo
        .find(TEST_FACTORY)
        .unwrap()
        .expect("懒创建的默认配置");
    assert_eq!(config.adaptation_count, 0);
    assert!(config.last_adapted_at.is_none());

    let audit_count = env
        .repos
        .adjustment_repo
        .count_by_factory(TEST_FACTORY)
        .unwrap();
    assert_eq!(audit_count, 0);
}

#[test]
fn test_set_weights_normalizes_and_audits_without_scores() {
    let env = setup_env();
    let mut weights = StrategyWeights::default_split();
    // 人工给出未归一化的权重
    weights.earliest_deadline = 0.6;
    weights.min_changeover = 0.6;

    let config = engine(&env)
        .set_weights(TEST_FACTORY, weights, "人工调权")
        .unwrap();
    assert!((config.weights.sum() - 1.0).abs() < 1e-9);

    let records = env
        .repos
        .adjustment_repo
        .list_since(TEST_FACTORY, base_time(0))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].scores.is_none());
    assert_eq!(records[0].reason, "人工调权");
}

#[test]
fn test_reset_to_default_restores_split() {
    let env = setup_env();
    let aps = engine(&env);
    let mut weights = StrategyWeights::default_split();
    weights.urgency_first = 0.9;
    aps.set_weights(TEST_FACTORY, weights, "人工调权").unwrap();

    let config = aps.reset_to_default(TEST_FACTORY).unwrap();
    let default = StrategyWeights::default_split();
    for kind in StrategyKind::ALL {
        assert!((config.weights.get(kind) - default.get(kind)).abs() < 1e-9);
    }
    // 两次覆写 = 两条审计
    let audit_count = env
        .repos
        .adjustment_repo
        .count_by_factory(TEST_FACTORY)
        .unwrap();
    assert_eq!(audit_count, 2);
}

#[test]
fn test_consecutive_adjustments_increment_count() {
    let env = setup_env();
    let aps = engine(&env);
    aps.adjust_weights(TEST_FACTORY, base_time(0), base_time(12), "第一轮")
        .unwrap();
    aps.adjust_weights(TEST_FACTORY, base_time(12), base_time(23), "第二轮")
        .unwrap();

    let config = env
        .repos
        .strategy_repo
        .find(TEST_FACTORY)
        .unwrap()
        .unwrap();
    assert_eq!(config.adaptation_count, 2);
}
