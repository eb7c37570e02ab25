//! # Bluebell インフラストラクチャ層
//!
//! 外部システムへの接続ハンドルを提供する。
//!
//! - [`db`]: PostgreSQL 接続プール
//! - [`cache`]: Redis 接続
//! - [`resource`]: 終了時に解放するリソースの抽象
//! - [`error`]: インフラ層エラー

pub mod cache;
pub mod db;
pub mod error;
pub mod resource;

pub use cache::{Cache, CacheSettings};
pub use db::{Database, DatabaseSettings};
pub use error::{InfraError, InfraErrorKind};
pub use resource::Resource;
