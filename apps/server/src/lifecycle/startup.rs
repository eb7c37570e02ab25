//! 起動シーケンス。
//!
//! 初期化を一つずつ順に実行し、成功したリソースを [`ResourceStack`] に積む。
//! 途中で失敗した場合は、それまでに確保したリソースを逆順に解放してからエラーを返す。
//! 以降の初期化は実行されず、リスナーも起動しない。
//!
//! 初期化中に強制終了が要求された場合も同じ扱いになる。接続先が応答しないまま
//! 初期化が戻らなくても、2 回目のシグナルで起動を打ち切れる。

use std::future::Future;

use bluebell_infra::Resource;

use super::{resources::ResourceStack, shutdown::ShutdownController};
use crate::error::StartupError;

/// 段階的にリソースを確保する起動シーケンス
#[derive(Debug)]
pub struct StartupSequence {
    controller: ShutdownController,
    acquired:   ResourceStack,
}

impl StartupSequence {
    /// `controller` の強制終了要求で初期化を打ち切る起動シーケンスを作成する
    pub fn new(controller: &ShutdownController) -> Self {
        Self {
            controller: controller.clone(),
            acquired:   ResourceStack::new(),
        }
    }

    /// 初期化を実行し、成功したリソースを解放対象として登録する
    ///
    /// 呼び出し側にはリソースのクローンを返す。失敗時は確保済みのリソースを
    /// すべて解放してから `init` のエラーをそのまま返す。強制終了が要求された場合は
    /// `init` を破棄し、[`StartupError::Interrupted`] を返す。
    pub async fn acquire<R, F>(&mut self, init: F) -> Result<R, StartupError>
    where
        R: Resource + Clone + 'static,
        F: Future<Output = Result<R, StartupError>>,
    {
        let result = tokio::select! {
            biased;
            () = self.controller.forced() => Err(StartupError::Interrupted),
            result = init => result,
        };

        match result {
            Ok(resource) => {
                tracing::debug!(resource = resource.name(), "初期化に成功しました");
                self.acquired.push(resource.clone());
                Ok(resource)
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    failed = err.failed_resource(),
                    acquired = ?self.acquired.names(),
                    "初期化に失敗しました。確保済みのリソースを解放します"
                );
                std::mem::take(&mut self.acquired).release_all().await;
                Err(err)
            }
        }
    }

    /// 起動を完了し、確保したリソースの所有権を返す
    pub fn finish(self) -> ResourceStack {
        self.acquired
    }
}
