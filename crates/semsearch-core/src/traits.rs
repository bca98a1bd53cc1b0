/// Text-to-vector capability consumed by the engine and the index builder.
///
/// Implementations must return vectors of length `dim()` for every input and
/// must be safe to call from many threads at once.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// Batched form used when building an index. Output order matches `texts`.
    fn embed_many(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dim(&self) -> usize {
        (**self).dim()
    }
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text)
    }
    fn embed_many(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        (**self).embed_many(texts)
    }
}

impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    fn dim(&self) -> usize {
        (**self).dim()
    }
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        (**self).embed(text)
    }
    fn embed_many(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        (**self).embed_many(texts)
    }
}
