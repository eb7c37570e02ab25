//! # Observability 基盤
//!
//! トレーシング初期化とログ出力形式の設定を提供する。
//! `log.format` 設定による JSON / Pretty 出力の切り替えと、
//! `log.level`（`RUST_LOG` が優先）によるフィルタ指定に対応する。

use std::io::Write as _;

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::ParseError, util::TryInitError};

/// ログ出力形式
///
/// 値が不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすい形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// 不正な値の場合は [`Pretty`](LogFormat::Pretty) にフォールバックし、
    /// stderr に警告を出力する（この時点ではロガーが未初期化のため）。
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown log format {other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// サービス名
    pub service_name: String,
    /// フィルタ指定（例: `"info"`, `"info,bluebell=debug"`）
    pub level:        String,
    /// ログ出力形式
    pub log_format:   LogFormat,
}

impl TracingConfig {
    /// 新しい設定を作成する
    pub fn new(
        service_name: impl Into<String>,
        level: impl Into<String>,
        log_format: LogFormat,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            level: level.into(),
            log_format,
        }
    }
}

/// トレーシング初期化エラー
#[derive(Debug, Error)]
pub enum TracingInitError {
    /// フィルタ指定のパースに失敗した
    #[error("ログレベルの指定が不正です: {0}")]
    Filter(#[from] ParseError),

    /// グローバル subscriber の登録に失敗した（二重初期化など）
    #[error("グローバル subscriber の登録に失敗しました: {0}")]
    Init(#[from] TryInitError),
}

/// ロガーの終了処理を担うガード
///
/// ドロップ時に stdout / stderr をフラッシュし、バッファに残ったログを書き出す。
/// `main` の最後まで保持すること。
#[must_use = "ドロップ時にログをフラッシュするため、main の終了まで保持すること"]
#[derive(Debug)]
pub struct TracingGuard {
    _private: (),
}

impl Drop for TracingGuard {
    fn drop(&mut self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}

/// フィルタを構築する
///
/// `env_directives`（`RUST_LOG` の値）が有効ならそれを優先し、
/// 未設定または不正な場合は `level` を使う。
pub fn build_filter(env_directives: Option<&str>, level: &str) -> Result<EnvFilter, ParseError> {
    match env_directives.map(EnvFilter::try_new) {
        Some(Ok(filter)) => Ok(filter),
        _ => EnvFilter::try_new(level),
    }
}

/// トレーシングを初期化する
///
/// プロセス内で一度だけ呼び出す。二度目以降の呼び出しは
/// [`TracingInitError::Init`] を返す。
///
/// JSON モードでは `timestamp`, `level`, `target`, `message` がトップレベルに出力される。
/// サービス名は呼び出し元で `tracing::info_span!("app", service = ...)` を設定することで
/// `span.service` として含まれる。
pub fn init_tracing(config: &TracingConfig) -> Result<TracingGuard, TracingInitError> {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let env_filter = build_filter(env_directives.as_deref(), &config.level)?;

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;

    tracing::debug!(
        service = %config.service_name,
        format = ?config.log_format,
        "トレーシングを初期化しました"
    );
    Ok(TracingGuard { _private: () })
}
