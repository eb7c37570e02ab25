//! # アプリケーション状態
//!
//! 起動シーケンスで確保した接続ハンドルを、ルーター経由でハンドラに注入する。

use bluebell_infra::{Cache, Database};

/// ハンドラから参照する共有状態
///
/// 各ハンドルは内部で接続を共有しているため、`Clone` は安価。
#[derive(Debug, Clone)]
pub struct AppState {
    pub db:    Database,
    pub cache: Cache,
}

impl AppState {
    pub fn new(db: Database, cache: Cache) -> Self {
        Self { db, cache }
    }
}
