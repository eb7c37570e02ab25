//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック（`GET /`）

pub mod health;

pub use health::index;
