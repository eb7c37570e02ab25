//! # Bluebell 共有ユーティリティ
//!
//! サーバー全体で使用されるログ基盤と HTTP ミドルウェアを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（infra, server）から依存される
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置

pub mod access_log;
pub mod observability;

pub use access_log::AccessLogLayer;
pub use observability::{LogFormat, TracingConfig, TracingGuard, TracingInitError, init_tracing};
