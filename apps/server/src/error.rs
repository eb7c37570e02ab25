//! # 起動エラー
//!
//! サーバー起動シーケンスの各段階で発生する致命的エラー。
//! いずれも発生した時点で起動を中止し、プロセスは非ゼロで終了する。

use bluebell_infra::InfraError;
use bluebell_shared::TracingInitError;
use thiserror::Error;

/// 起動シーケンスのエラー
///
/// バリアントは初期化の順序（設定 → ロガー → シグナル → DB → キャッシュ）に対応する。
/// [`Interrupted`](Self::Interrupted) は DB・キャッシュの初期化中にだけ発生する。
#[derive(Debug, Error)]
pub enum StartupError {
    /// 設定の読み込みに失敗した
    #[error("設定の読み込みに失敗しました: {0}")]
    Settings(#[from] config::ConfigError),

    /// ロガーの初期化に失敗した
    #[error("ロガーの初期化に失敗しました: {0}")]
    Logger(#[from] TracingInitError),

    /// シグナルハンドラの登録に失敗した
    #[error("シグナルハンドラの登録に失敗しました: {0}")]
    Signals(#[source] std::io::Error),

    /// データベースの初期化に失敗した
    #[error("データベースの初期化に失敗しました: {0}")]
    Database(#[source] InfraError),

    /// キャッシュの初期化に失敗した
    #[error("キャッシュの初期化に失敗しました: {0}")]
    Cache(#[source] InfraError),

    /// 初期化の完了を待たずに強制終了が要求された
    #[error("起動中に強制終了が要求されました")]
    Interrupted,
}

impl StartupError {
    /// 初期化に失敗したリソースの名前
    ///
    /// リソースの初期化以外で発生したエラーでは `None`。
    pub fn failed_resource(&self) -> Option<&'static str> {
        match self {
            Self::Database(e) | Self::Cache(e) => Some(e.resource()),
            _ => None,
        }
    }
}
