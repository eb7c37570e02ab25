//! # Bluebell サーバー
//!
//! 設定・ロガー・DB・キャッシュを順に初期化し、HTTP サーバーを起動して、
//! シグナル受信時に期限付きでグレースフルシャットダウンする。
//!
//! バイナリのエントリーポイントは `main.rs`。テストから起動シーケンスを
//! 組み立てられるよう、各部品はライブラリとして公開する。

pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod router;
pub mod settings;
pub mod state;

pub use error::StartupError;
pub use settings::Settings;
pub use state::AppState;
