// ==========================================
// 日志系统初始化
// ==========================================
// 职责: tracing 订阅器的统一装配
// 说明: 校验链每一步以 debug 级输出, 裁决以 info/warn 级输出,
//       过滤器通过 RUST_LOG 调整
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的默认过滤器
const DEFAULT_FILTER: &str = "info,mes_exec_validation=debug";

/// 初始化生产环境日志
///
/// # 环境变量
/// - RUST_LOG: 覆盖默认过滤器
///   例如: RUST_LOG=mes_exec_validation::engine=trace
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化测试日志
///
/// 输出走测试捕获器, 多次调用安全 (后续调用为空操作)
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new(DEFAULT_FILTER))
        .with_test_writer()
        .try_init();
}
