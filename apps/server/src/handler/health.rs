//! # ヘルスチェックハンドラ
//!
//! サーバーの稼働確認用エンドポイント。
//!
//! ```text
//! GET /  →  200 OK, "ok"
//! ```

/// ルートのヘルスチェック
///
/// 固定の `ok` を `text/plain; charset=utf-8` で返す。
pub async fn index() -> &'static str {
    "ok"
}
