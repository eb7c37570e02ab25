//! # ライフサイクル管理
//!
//! ```text
//! 起動:       設定 → ロガー → シグナル → DB → キャッシュ → ルーター → リスナー起動
//! 待機:       シャットダウン要求（SIGINT / SIGTERM）まで待つ
//! 停止:       新規接続の受付停止 → 処理中リクエストのドレイン（最大 5 秒）
//! 後始末:     キャッシュ → DB の順に解放
//! ```
//!
//! 設定・ロガー・シグナルは `main` が初期化し、DB 以降を [`run`] が担当する。
//!
//! - 初期化の失敗は致命的。確保済みのリソースを解放してエラーを返し、リスナーは起動しない
//! - リスナーの失敗はログのみ
//! - ドレインのタイムアウトはログのみ
//! - どの操作もリトライしない

pub mod resources;
pub mod server;
pub mod shutdown;
pub mod signals;
pub mod startup;

use std::time::Duration;

use bluebell_infra::{Cache, Database};
pub use resources::ResourceStack;
pub use server::{HttpServer, RunningServer};
pub use shutdown::{ShutdownController, ShutdownOutcome};
pub use signals::OsSignals;
pub use startup::StartupSequence;

use crate::{error::StartupError, router, settings::Settings, state::AppState};

/// グレースフルシャットダウンの期限
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// DB とキャッシュを初期化し、サーバーを起動してシャットダウンまで実行する
///
/// 戻った時点で、確保したリソースはすべて解放済み。
pub async fn run(
    settings: &Settings,
    controller: &ShutdownController,
) -> Result<ShutdownOutcome, StartupError> {
    let mut startup = StartupSequence::new(controller);
    let db = startup
        .acquire(async {
            Database::connect(&settings.database)
                .await
                .map_err(StartupError::Database)
        })
        .await?;
    let cache = startup
        .acquire(async {
            Cache::connect(&settings.redis)
                .await
                .map_err(StartupError::Cache)
        })
        .await?;
    let resources = startup.finish();

    let app = router::setup(AppState::new(db, cache));
    let server = HttpServer::new(settings.app.listen_addr(), app);

    Ok(serve(server, resources, controller, SHUTDOWN_TIMEOUT).await)
}

/// サーバーを起動し、シャットダウン完了後にリソースを解放する
pub async fn serve(
    server: HttpServer,
    resources: ResourceStack,
    controller: &ShutdownController,
    deadline: Duration,
) -> ShutdownOutcome {
    let outcome = server.start(controller).wait_for_shutdown(deadline).await;

    resources.release_all().await;
    tracing::info!(?outcome, "サーバーを停止しました");

    outcome
}
