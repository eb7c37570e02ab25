//! # アクセスログミドルウェア
//!
//! HTTP リクエスト完了時に、リクエストの概要を 1 行の構造化ログとして出力する
//! tower Layer。すべてのルートに適用する。
//!
//! ## 出力フィールド
//!
//! | フィールド | 内容 |
//! |------------|------|
//! | `log.type` | 固定値 `"access"` |
//! | `http.method` | リクエストメソッド |
//! | `http.path` | リクエストパス |
//! | `http.query` | クエリ文字列（なければ空文字列） |
//! | `http.user_agent` | `User-Agent` ヘッダー（なければ空文字列） |
//! | `http.status_code` | レスポンスステータス |
//! | `http.latency_ms` | 処理時間（ミリ秒） |
//!
//! ## レイヤー配置
//!
//! パニック回復レイヤーの外側に置くこと。内側に置くとパニック時の 500 が記録されない。
//!
//! ```text
//! TraceLayer → AccessLogLayer → CatchPanicLayer → handler
//! ```

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use http::{Request, Response, header::USER_AGENT};
use tower::{Layer, Service};

/// アクセスログを出力する Layer
#[derive(Clone, Debug, Default)]
pub struct AccessLogLayer;

impl<S> Layer<S> for AccessLogLayer {
    type Service = AccessLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AccessLogService { inner }
    }
}

/// [`AccessLogLayer`] が生成する Service
#[derive(Clone, Debug)]
pub struct AccessLogService<S> {
    inner: S,
}

/// ログ出力用にリクエストから取り出した値
struct RequestSummary {
    method:     String,
    path:       String,
    query:      String,
    user_agent: String,
}

impl RequestSummary {
    fn from_request<B>(req: &Request<B>) -> Self {
        Self {
            method:     req.method().to_string(),
            path:       req.uri().path().to_owned(),
            query:      req.uri().query().unwrap_or_default().to_owned(),
            user_agent: req
                .headers()
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned(),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for AccessLogService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Display + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    type Response = S::Response;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        // clone-swap パターン: poll_ready で readiness を得た inner を使う
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let summary = RequestSummary::from_request(&req);
        let start = Instant::now();

        Box::pin(async move {
            let result = inner.call(req).await;
            let latency_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(response) => {
                    tracing::info!(
                        log.r#type = "access",
                        http.method = %summary.method,
                        http.path = %summary.path,
                        http.query = %summary.query,
                        http.user_agent = %summary.user_agent,
                        http.status_code = response.status().as_u16(),
                        http.latency_ms = latency_ms,
                        "リクエスト完了"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        log.r#type = "access",
                        http.method = %summary.method,
                        http.path = %summary.path,
                        http.latency_ms = latency_ms,
                        error.message = %err,
                        "リクエスト処理エラー"
                    );
                }
            }

            result
        })
    }
}
