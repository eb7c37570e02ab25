//! 確保済みリソースの逆順解放。

use bluebell_infra::Resource;

/// 確保した順にリソースを積み、逆順に解放するスタック
///
/// [`release_all`](Self::release_all) は `self` を消費するため、
/// 各リソースの解放は高々一度しか行われない。
#[derive(Default)]
pub struct ResourceStack {
    resources: Vec<Box<dyn Resource>>,
}

impl ResourceStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// 確保したリソースを積む
    pub fn push<R: Resource + 'static>(&mut self, resource: R) {
        self.resources.push(Box::new(resource));
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// 確保した順のリソース名
    pub fn names(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.name()).collect()
    }

    /// 確保と逆の順序ですべてのリソースを解放する
    pub async fn release_all(mut self) {
        while let Some(resource) = self.resources.pop() {
            let name = resource.name();
            tracing::debug!(resource = name, "リソースを解放します");
            resource.close().await;
        }
    }
}

impl Drop for ResourceStack {
    fn drop(&mut self) {
        if !self.resources.is_empty() {
            tracing::warn!(
                resources = ?self.names(),
                "解放されないままリソースが破棄されました"
            );
        }
    }
}

impl std::fmt::Debug for ResourceStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStack")
            .field("resources", &self.names())
            .finish()
    }
}
