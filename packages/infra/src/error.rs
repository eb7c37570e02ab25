//! # 接続エラー
//!
//! PostgreSQL と Redis への接続確立で発生するエラー。
//! 起動シーケンスはこのエラーを受け取った時点で起動を中止する。
//!
//! エラー値には、生成した時点のスパン（`connect_database` / `connect_cache`）が
//! [`SpanTrace`] として残る。どの接続処理の中で失敗したかはこれで追える。

use std::{error::Error as StdError, fmt};

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// 接続処理で発生したエラー
///
/// 種別は [`kind()`](InfraError::kind)、失敗したリソースは
/// [`resource()`](InfraError::resource) で取得する。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// 接続エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// PostgreSQL への接続に失敗した（URL 不正、到達不能、認証失敗など）
    #[error("データベースエラー: {0}")]
    Database(#[source] sqlx::Error),

    /// Redis への接続またはコマンドに失敗した
    #[error("Redis エラー: {0}")]
    Redis(#[source] redis::RedisError),

    /// 接続はできたが応答が想定と異なる（PING に PONG が返らないなど）
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    fn new(kind: InfraErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }

    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// エラー生成時のスパン
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 失敗したリソースのログ用の名前
    ///
    /// 応答不正（[`InfraErrorKind::Unexpected`]）はどちらのリソースか区別できないため `"unknown"`。
    pub fn resource(&self) -> &'static str {
        match self.kind {
            InfraErrorKind::Database(_) => "database",
            InfraErrorKind::Redis(_) => "cache",
            InfraErrorKind::Unexpected(_) => "unknown",
        }
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::new(InfraErrorKind::Unexpected(msg.into()))
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SpanTrace は Display で読める形になる
        write!(f, "{} [{}]", self.kind, self.resource())?;
        if f.alternate() {
            write!(f, "\n{}", self.span_trace)?;
        }
        Ok(())
    }
}

impl StdError for InfraError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            InfraErrorKind::Database(e) => Some(e),
            InfraErrorKind::Redis(e) => Some(e),
            InfraErrorKind::Unexpected(_) => None,
        }
    }
}

impl From<sqlx::Error> for InfraError {
    fn from(source: sqlx::Error) -> Self {
        Self::new(InfraErrorKind::Database(source))
    }
}

impl From<redis::RedisError> for InfraError {
    fn from(source: redis::RedisError) -> Self {
        Self::new(InfraErrorKind::Redis(source))
    }
}
