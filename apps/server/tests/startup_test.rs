//! # 起動シーケンスのテスト
//!
//! - 途中で初期化に失敗すると、確保済みのリソースだけが逆順に解放される
//! - 失敗以降の初期化は実行されない
//! - 初期化が戻らなくても、強制終了の要求で起動を打ち切れる
//! - DB に接続できなければ [`lifecycle::run`] はリスナーを起動せずにエラーを返す

use std::{
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use bluebell_infra::{CacheSettings, DatabaseSettings, InfraError, Resource};
use bluebell_server::{
    Settings,
    StartupError,
    lifecycle::{self, ShutdownController, StartupSequence},
    settings::{AppSettings, LogSettings},
};
use pretty_assertions::assert_eq;

#[derive(Clone)]
struct Recorded {
    name:     &'static str,
    released: Arc<Mutex<Vec<&'static str>>>,
}

impl Recorded {
    fn new(name: &'static str, released: &Arc<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            name,
            released: Arc::clone(released),
        }
    }
}

#[async_trait]
impl Resource for Recorded {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn close(self: Box<Self>) {
        self.released.lock().unwrap().push(self.name);
    }
}

#[tokio::test]
async fn test_キャッシュの初期化に失敗するとdbだけが解放される() {
    let released = Arc::new(Mutex::new(Vec::new()));
    let reached_router = AtomicBool::new(false);
    let mut sut = StartupSequence::new(&ShutdownController::new());

    let result = async {
        sut.acquire(async { Ok(Recorded::new("database", &released)) })
            .await?;
        sut.acquire(async {
            Err::<Recorded, _>(StartupError::Cache(InfraError::unexpected(
                "connection refused",
            )))
        })
        .await?;
        reached_router.store(true, Ordering::SeqCst);
        Ok::<_, StartupError>(())
    }
    .await;

    assert!(matches!(result, Err(StartupError::Cache(_))));
    assert!(!reached_router.load(Ordering::SeqCst));
    assert_eq!(*released.lock().unwrap(), vec!["database"]);
}

#[tokio::test]
async fn test_最初の初期化に失敗すると何も解放しない() {
    let released = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let mut sut = StartupSequence::new(&ShutdownController::new());

    let result = sut
        .acquire(async {
            Err::<Recorded, _>(StartupError::Database(InfraError::unexpected(
                "authentication failed",
            )))
        })
        .await;

    assert!(matches!(result, Err(StartupError::Database(_))));
    assert!(released.lock().unwrap().is_empty());
    assert!(sut.finish().is_empty());
}

#[tokio::test]
async fn test_すべて成功すると確保と逆順に解放できる() {
    let released = Arc::new(Mutex::new(Vec::new()));
    let mut sut = StartupSequence::new(&ShutdownController::new());

    let db = sut
        .acquire(async { Ok::<_, StartupError>(Recorded::new("database", &released)) })
        .await
        .unwrap();
    let cache = sut
        .acquire(async { Ok::<_, StartupError>(Recorded::new("cache", &released)) })
        .await
        .unwrap();
    assert_eq!((db.name, cache.name), ("database", "cache"));

    let resources = sut.finish();
    assert_eq!(resources.names(), vec!["database", "cache"]);
    assert!(released.lock().unwrap().is_empty());

    resources.release_all().await;
    assert_eq!(*released.lock().unwrap(), vec!["cache", "database"]);
}

#[tokio::test]
async fn test_初期化中に強制終了が要求されると打ち切って確保済みを解放する() {
    let released = Arc::new(Mutex::new(Vec::new()));
    let controller = ShutdownController::new();
    let mut sut = StartupSequence::new(&controller);
    sut.acquire(async { Ok(Recorded::new("database", &released)) })
        .await
        .unwrap();

    let requester = {
        let controller = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            controller.request_shutdown();
            controller.request_shutdown();
        })
    };
    // 応答しない接続先を模した、完了しない初期化
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        sut.acquire(std::future::pending::<Result<Recorded, StartupError>>()),
    )
    .await
    .expect("強制終了の要求で初期化の待機を打ち切ること");

    requester.await.unwrap();
    assert!(matches!(result, Err(StartupError::Interrupted)));
    assert_eq!(*released.lock().unwrap(), vec!["database"]);
}

#[tokio::test]
async fn test_1回目の要求だけでは初期化を打ち切らない() {
    let released = Arc::new(Mutex::new(Vec::new()));
    let controller = ShutdownController::new();
    let mut sut = StartupSequence::new(&controller);
    controller.request_shutdown();

    let result = sut
        .acquire(async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Recorded::new("database", &released))
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(sut.finish().names(), vec!["database"]);
}

#[tokio::test]
async fn test_強制終了後の初期化は実行せずに中断する() {
    let released = Arc::new(Mutex::new(Vec::<&'static str>::new()));
    let started = AtomicBool::new(false);
    let controller = ShutdownController::new();
    controller.request_shutdown();
    controller.request_shutdown();
    let mut sut = StartupSequence::new(&controller);

    let result = sut
        .acquire(async {
            started.store(true, Ordering::SeqCst);
            Ok(Recorded::new("cache", &released))
        })
        .await;

    assert!(matches!(result, Err(StartupError::Interrupted)));
    assert!(!started.load(Ordering::SeqCst));
    assert!(released.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_dbに接続できなければリスナーを起動せずにエラーを返す() {
    // 空きポートを確認してから解放し、そのポートで起動させる
    let port = {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        reserved.local_addr().unwrap().port()
    };
    let settings = Settings {
        app:      AppSettings {
            name: "bluebell-test".to_owned(),
            host: "127.0.0.1".to_owned(),
            port,
        },
        log:      LogSettings::default(),
        database: DatabaseSettings {
            url:                  "not-a-database-url".to_owned(),
            max_connections:      1,
            min_connections:      0,
            acquire_timeout_secs: 1,
        },
        redis:    CacheSettings {
            url: "redis://127.0.0.1:1".to_owned(),
        },
    };
    let controller = ShutdownController::new();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        lifecycle::run(&settings, &controller),
    )
    .await
    .expect("接続失敗は待たずに返ること");

    assert!(matches!(result, Err(StartupError::Database(_))));
    assert!(
        std::net::TcpStream::connect(("127.0.0.1", port)).is_err(),
        "リスナーは起動しないこと"
    );
}
