//! シャットダウン要求の伝播。
//!
//! OS シグナルとは切り離した取り消しトークンとして表現する。
//! シグナル受信側は [`ShutdownController::request_shutdown`] を呼ぶだけで、
//! HTTP リスナーとメインタスクは同じトークンを監視する。テストからは直接呼び出せる。

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use tokio_util::sync::CancellationToken;

/// シャットダウンの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// 処理中のリクエストがすべて完了した
    Completed,
    /// 期限内に完了せず、処理中のリクエストを破棄した
    TimedOut,
    /// ドレイン中に再度シャットダウンが要求され、待たずに終了した
    Forced,
}

/// シャットダウン要求を共有するコントローラ
///
/// 1 回目の要求でグレースフルシャットダウンを開始し、
/// 2 回目以降の要求で強制終了に切り替える。
#[derive(Debug, Clone, Default)]
pub struct ShutdownController {
    graceful: CancellationToken,
    force:    CancellationToken,
    requests: Arc<AtomicUsize>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// シャットダウンを要求する
    pub fn request_shutdown(&self) {
        if self.requests.fetch_add(1, Ordering::SeqCst) == 0 {
            self.graceful.cancel();
        } else {
            self.force.cancel();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.graceful.is_cancelled()
    }

    pub fn is_forced(&self) -> bool {
        self.force.is_cancelled()
    }

    /// シャットダウンが要求されるまで待つ
    pub async fn cancelled(&self) {
        self.graceful.cancelled().await;
    }

    /// 強制終了が要求されるまで待つ
    pub async fn forced(&self) {
        self.force.cancelled().await;
    }

    /// リスナーに渡すグレースフルシャットダウン用トークン
    pub fn graceful_token(&self) -> CancellationToken {
        self.graceful.clone()
    }
}
