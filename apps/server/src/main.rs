//! # Bluebell サーバー
//!
//! 起動して `GET /` に `ok` を返し、SIGINT / SIGTERM で期限付きのグレースフルシャットダウンを行う。
//!
//! ## 設定
//!
//! `config/settings.{toml,yaml,json}`（`BLUEBELL_CONFIG` で変更可）と環境変数から読み込む。
//! 環境変数は設定ファイルより優先される。
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `BLUEBELL_APP__HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `BLUEBELL_APP__PORT` | **Yes** | ポート番号 |
//! | `BLUEBELL_LOG__LEVEL` | No | ログレベル（デフォルト: `info`、`RUST_LOG` が優先） |
//! | `BLUEBELL_LOG__FORMAT` | No | `pretty` または `json` |
//! | `BLUEBELL_DATABASE__URL` | **Yes** | PostgreSQL 接続 URL |
//! | `BLUEBELL_REDIS__URL` | **Yes** | Redis 接続 URL |
//!
//! ## 終了コード
//!
//! 起動に失敗した場合は 1、シャットダウンした場合は結果によらず 0。
//!
//! ## 起動方法
//!
//! ```bash
//! BLUEBELL_APP__PORT=8080 \
//! BLUEBELL_DATABASE__URL=postgres://... \
//! BLUEBELL_REDIS__URL=redis://localhost:6379 \
//! cargo run -p bluebell-server
//! ```

use std::process::ExitCode;

use bluebell_server::{
    Settings,
    StartupError,
    lifecycle::{self, OsSignals, ShutdownController},
};
use bluebell_shared::observability::{TracingConfig, init_tracing};
use tracing::Instrument;

#[tokio::main]
async fn main() -> ExitCode {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // ロガーがまだないため、ここまでの失敗は stderr に出力する
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", StartupError::from(e));
            return ExitCode::FAILURE;
        }
    };

    let tracing_config = TracingConfig::new(
        settings.app.name.clone(),
        settings.log.level.clone(),
        settings.log.log_format(),
    );
    let _tracing_guard = match init_tracing(&tracing_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}", StartupError::from(e));
            return ExitCode::FAILURE;
        }
    };

    // 起動中に届いたシグナルも取りこぼさないよう、初期化より前に登録する
    let controller = ShutdownController::new();
    match OsSignals::install() {
        Ok(signals) => {
            signals.spawn(controller.clone());
        }
        Err(e) => {
            tracing::error!(error = %StartupError::Signals(e), "起動に失敗しました");
            return ExitCode::FAILURE;
        }
    }

    tracing::info!(addr = %settings.app.listen_addr(), "サーバーを起動します");

    let span = tracing::info_span!("app", service = %settings.app.name);
    match lifecycle::run(&settings, &controller).instrument(span).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "起動に失敗しました");
            ExitCode::FAILURE
        }
    }
}
