//! # ルーター構築
//!
//! ルート定義と、全ルート共通のミドルウェアを組み立てる。
//!
//! ## ミドルウェア構成
//!
//! 上に書いたものが外側:
//!
//! ```text
//! TraceLayer       リクエストごとのスパン
//! AccessLogLayer   リクエスト完了時の構造化ログ
//! CatchPanicLayer  ハンドラのパニックを 500 に変換
//! handler
//! ```

use std::any::Any;

use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use bluebell_shared::AccessLogLayer;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{handler::index, state::AppState};

/// アプリケーションのルーターを構築する
pub fn setup(state: AppState) -> Router {
    with_middleware(routes().with_state(state))
}

/// ルート定義
///
/// 状態型に依存しないため、テストでは任意の状態で組み立てられる。
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(index))
}

/// 全ルート共通のミドルウェアを適用する
pub fn with_middleware(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(AccessLogLayer)
            .layer(CatchPanicLayer::custom(handle_panic)),
    )
}

/// パニックをログに記録し、500 を返す
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic.message = %detail, "ハンドラでパニックが発生しました");

    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}
