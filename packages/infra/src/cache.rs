//! # Redis キャッシュ接続管理
//!
//! Redis への接続確立と解放を行う。
//!
//! ## ConnectionManager を使う理由
//!
//! `ConnectionManager` は接続が切断された場合に自動で再接続し、
//! `Clone` で複数のタスクから共有できる。長期稼働するサーバーではこちらを使う。
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use bluebell_infra::{Cache, CacheSettings};
//! use redis::AsyncCommands;
//!
//! let cache = Cache::connect(&settings).await?;
//! let mut conn = cache.connection();
//! conn.set_ex::<_, _, ()>("key", "value", 60).await?;
//! ```

use async_trait::async_trait;
use redis::{Client, aio::ConnectionManager};
use serde::Deserialize;

use crate::{error::InfraError, resource::Resource};

/// Redis 接続設定
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Redis 接続 URL
    ///
    /// 形式: `redis://[[username:]password@]host[:port][/database]`
    /// TLS の場合は `rediss://` スキームを使う。
    pub url: String,
}

/// Redis 接続のハンドル
///
/// `Clone` は同じ接続マネージャを共有する。
#[derive(Clone)]
pub struct Cache {
    manager: ConnectionManager,
}

impl Cache {
    /// Redis に接続し、PING で疎通を確認する
    #[tracing::instrument(skip_all, name = "connect_cache")]
    pub async fn connect(settings: &CacheSettings) -> Result<Self, InfraError> {
        let client = Client::open(settings.url.as_str())?;
        let mut manager = ConnectionManager::new(client).await?;

        let pong: String = redis::cmd("PING").query_async(&mut manager).await?;
        if pong != "PONG" {
            return Err(InfraError::unexpected(format!(
                "PING に対する応答が不正です: {pong}"
            )));
        }

        tracing::info!("Redis に接続しました");
        Ok(Self { manager })
    }

    /// 接続マネージャのクローンを取得する
    pub fn connection(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

#[async_trait]
impl Resource for Cache {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn close(self: Box<Self>) {
        // ConnectionManager に明示的な close はない。
        // 最後のクローンがドロップされた時点で接続が閉じられる。
        drop(self.manager);
        tracing::info!("Redis 接続を解放しました");
    }
}
