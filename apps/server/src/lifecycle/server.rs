//! HTTP リスナー。
//!
//! accept ループを独立したタスクで実行し、メインタスクはシャットダウン要求を待つ。
//! リスナーの失敗（ポート使用中など）はログに記録するだけで、プロセスは終了しない。
//! メインタスクはそのままシグナルを待ち続ける。
//!
//! 各接続はリスナータスクが所有する [`JoinSet`] 上で処理する。ドレインを打ち切るときは
//! 接続タスクをすべて中断し、ハンドラが破棄されるまで待ってから戻る。

use std::{net::SocketAddr, time::Duration};

use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::{conn::auto, graceful::GracefulShutdown},
    service::TowerToHyperService,
};
use tokio::{
    net::TcpListener,
    sync::oneshot,
    task::{JoinHandle, JoinSet},
};
use tokio_util::sync::CancellationToken;

use super::shutdown::{ShutdownController, ShutdownOutcome};

/// 起動前の HTTP サーバー
#[derive(Debug)]
pub struct HttpServer {
    addr:   String,
    router: Router,
}

impl HttpServer {
    /// `addr` は `host:port` 形式
    pub fn new(addr: impl Into<String>, router: Router) -> Self {
        Self {
            addr: addr.into(),
            router,
        }
    }

    /// バックグラウンドタスクでリスナーを起動する
    ///
    /// バインドの成否を待たずに戻る。
    pub fn start(self, controller: &ShutdownController) -> RunningServer {
        let (addr_tx, addr_rx) = oneshot::channel();
        let abandon = CancellationToken::new();
        let task = tokio::spawn(serve(
            self.addr,
            self.router,
            controller.graceful_token(),
            abandon.clone(),
            addr_tx,
        ));

        RunningServer {
            controller: controller.clone(),
            abandon,
            task,
            addr_rx: Some(addr_rx),
            bound: None,
        }
    }
}

/// リスナータスクの本体
///
/// `shutdown` が取り消されるまで接続を受け付け、その後は処理中の接続の完了を待って戻る。
/// 待っている間に `abandon` が取り消されると、処理中の接続をすべて中断する。
async fn serve(
    addr: String,
    router: Router,
    shutdown: CancellationToken,
    abandon: CancellationToken,
    addr_tx: oneshot::Sender<SocketAddr>,
) {
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "リスナーの起動に失敗しました");
            return;
        }
    };

    match listener.local_addr() {
        Ok(local) => {
            tracing::info!(addr = %local, "HTTP サーバーが起動しました");
            let _ = addr_tx.send(local);
        }
        Err(e) => tracing::warn!(error = %e, "待ち受けアドレスを取得できませんでした"),
    }

    let builder = auto::Builder::new(TokioExecutor::new());
    let graceful = GracefulShutdown::new();
    let mut connections = JoinSet::new();

    loop {
        let (stream, peer) = tokio::select! {
            () = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "接続の受け付けに失敗しました");
                    continue;
                }
            },
        };

        let service = TowerToHyperService::new(router.clone());
        let conn = builder
            .serve_connection_with_upgrades(TokioIo::new(stream), service)
            .into_owned();
        let conn = graceful.watch(conn);
        connections.spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, %peer, "接続がエラーで終了しました");
            }
        });

        // 終了済みの接続を回収する
        while connections.try_join_next().is_some() {}
    }

    // 新規接続の受付を止め、処理中の接続にはレスポンス後に閉じるよう通知する
    drop(listener);
    tracing::debug!(connections = connections.len(), "処理中の接続の完了を待ちます");
    tokio::select! {
        () = graceful.shutdown() => {}
        () = abandon.cancelled() => {
            tracing::debug!(connections = connections.len(), "処理中の接続を中断します");
        }
    }
    // 完了済みの接続は回収のみ、残っている接続は中断してドロップされるまで待つ
    connections.shutdown().await;
}

/// 起動済みの HTTP サーバー
#[derive(Debug)]
pub struct RunningServer {
    controller: ShutdownController,
    abandon:    CancellationToken,
    task:       JoinHandle<()>,
    addr_rx:    Option<oneshot::Receiver<SocketAddr>>,
    bound:      Option<SocketAddr>,
}

impl RunningServer {
    /// バインドしたアドレス
    ///
    /// バインドが完了するまで待つ。失敗した場合は `None`。
    pub async fn local_addr(&mut self) -> Option<SocketAddr> {
        if let Some(rx) = self.addr_rx.take() {
            self.bound = rx.await.ok();
        }
        self.bound
    }

    /// シャットダウン要求を待ち、`deadline` を上限にドレインする
    ///
    /// 期限を過ぎた場合や強制終了が要求された場合は、処理中の接続をすべて切断してから戻る。
    /// 戻った時点で、ハンドラが保持していた状態はすべて破棄されている。
    pub async fn wait_for_shutdown(self, deadline: Duration) -> ShutdownOutcome {
        let Self {
            controller,
            abandon,
            mut task,
            ..
        } = self;

        controller.cancelled().await;
        tracing::info!(
            deadline_ms = deadline.as_millis() as u64,
            "サーバーをシャットダウンします"
        );

        tokio::select! {
            result = &mut task => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "リスナータスクが異常終了しました");
                }
                tracing::info!("処理中のリクエストがすべて完了しました");
                ShutdownOutcome::Completed
            }
            () = tokio::time::sleep(deadline) => {
                abandon_connections(&abandon, task).await;
                tracing::error!(
                    deadline_ms = deadline.as_millis() as u64,
                    "シャットダウンがタイムアウトしました。処理中のリクエストを破棄します"
                );
                ShutdownOutcome::TimedOut
            }
            () = controller.forced() => {
                abandon_connections(&abandon, task).await;
                tracing::warn!("強制終了が要求されました。処理中のリクエストを破棄します");
                ShutdownOutcome::Forced
            }
        }
    }
}

/// 処理中の接続をすべて中断し、リスナータスクの終了を待つ
///
/// 戻った時点で、接続タスクとハンドラはすべてドロップされている。
async fn abandon_connections(abandon: &CancellationToken, task: JoinHandle<()>) {
    abandon.cancel();
    if let Err(e) = task.await {
        tracing::error!(error = %e, "リスナータスクが異常終了しました");
    }
}
