// ==========================================
// 工厂自适应排产系统 - 日志初始化
// ==========================================
// 约定: RUST_LOG 永远优先; 未设置时回落到调用方给定的默认指令
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 进程默认过滤指令 (RUST_LOG 未设置时生效)
const DEFAULT_DIRECTIVES: &str = "info,factory_aps=debug";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// 按进程默认指令初始化日志
///
/// ```no_run
/// use factory_aps::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_directives(DEFAULT_DIRECTIVES);
}

/// 以指定默认过滤指令初始化日志 (RUST_LOG 仍然优先)
///
/// 嵌入方可借此收紧或放宽本 crate 的默认日志量
pub fn init_with_directives(directives: &str) {
    fmt()
        .with_env_filter(env_filter(directives))
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 测试日志: debug 级 + 测试写入器,可重复调用
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(env_filter("debug"))
        .with_test_writer()
        .try_init();
}
