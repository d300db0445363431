//! 日志初始化
//!
//! 安装 `tracing-subscriber` 的 fmt 订阅者，并把 `log` 宏的记录桥接到 `tracing`。
//! 过滤规则优先读取 `RUST_LOG`，未设置时使用 [`DEFAULT_DIRECTIVE`]。

use tracing_subscriber::EnvFilter;

/// 默认过滤规则（匹配所有 `stubby_*` crate）
pub const DEFAULT_DIRECTIVE: &str = "stubby=info";

/// 使用默认过滤规则初始化日志
///
/// 返回 `false` 表示进程内已经安装过全局订阅者（不会 panic）。
///
/// ```
/// stubby_sdk::init_logging();
/// // 重复调用是安全的
/// assert!(!stubby_sdk::init_logging());
/// ```
pub fn init_logging() -> bool {
    init_logging_with(DEFAULT_DIRECTIVE)
}

/// 使用指定的默认过滤规则初始化日志（`RUST_LOG` 仍然优先）
pub fn init_logging_with(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return false;
    }

    // `log` 记录桥接到 tracing；已经有其他 logger 时保持原样
    let _ = tracing_log::LogTracer::builder()
        .with_max_level(log::LevelFilter::Trace)
        .init();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        assert!(!init_logging());
        assert!(!init_logging_with("stubby=debug"));

        tracing::info!("tracing after init");
        log::info!("log record after init");
    }
}
