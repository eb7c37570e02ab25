//! OS シグナルの受信。
//!
//! SIGINT / SIGTERM を受け取るたびに [`ShutdownController::request_shutdown`] を呼ぶ。
//! 1 回目でグレースフルシャットダウン、ドレイン中の 2 回目で強制終了になる。
//! Unix 以外では Ctrl-C のみを扱う。

use tokio::task::JoinHandle;

use super::shutdown::ShutdownController;

/// 登録済みのシグナルハンドラ
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// シグナルハンドラを登録する
    ///
    /// 登録した時点で、SIGINT / SIGTERM によるプロセスの即時終了は行われなくなる。
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// 次のシグナルを待ち、その名前を返す
    ///
    /// シグナルストリームが閉じた場合は `None`。
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some("SIGINT"),
            Some(()) = self.terminate.recv() => Some("SIGTERM"),
            else => None,
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<&'static str> {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some("Ctrl-C"),
            Err(e) => {
                tracing::error!(error = %e, "Ctrl-C の待ち受けに失敗しました");
                None
            }
        }
    }

    /// シグナルを待ち受けるタスクを起動する
    ///
    /// 強制終了まで要求した時点、またはシグナルストリームが閉じた時点でタスクは終了する。
    pub fn spawn(mut self, controller: ShutdownController) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(signal) = self.recv().await {
                if controller.is_shutting_down() {
                    tracing::warn!(signal, "シャットダウン中に再度シグナルを受信しました。強制終了します");
                } else {
                    tracing::info!(signal, "シグナルを受信しました。シャットダウンを開始します");
                }

                controller.request_shutdown();
                if controller.is_forced() {
                    break;
                }
            }
        })
    }
}

impl std::fmt::Debug for OsSignals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsSignals").finish_non_exhaustive()
    }
}
