//! # 解放可能なリソース
//!
//! 起動時に確保し、終了時に一度だけ解放する接続ハンドルの抽象。
//! データベース接続プールと Redis 接続がこれを実装する。

use async_trait::async_trait;

/// 終了時に解放が必要なリソース
///
/// `close` は `self` を消費するため、同じハンドルを二度解放することはできない。
#[async_trait]
pub trait Resource: Send + Sync {
    /// ログ出力用のリソース名
    fn name(&self) -> &'static str;

    /// リソースを解放する
    ///
    /// 失敗してもエラーは返さず、実装側でログに記録する。
    async fn close(self: Box<Self>);
}
