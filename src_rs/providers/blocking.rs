// 목적:
// - 동기(블로킹) 임베딩 구현을 비동기 Embedder로 감싼다.
//
// 설명:
// - 로컬 모델처럼 호출 스레드를 점유하는 임베딩 계산은 spawn_blocking 풀에서 실행해
//   다른 요청을 처리하는 스케줄러가 멈추지 않게 한다.
// - 로컬/블로킹 임베딩 모델을 쓰는 배포는 이 어댑터로 감싸 AppContext::connect_with_embedder에 넘긴다.
//
// 디자인 패턴:
// - 어댑터(Adapter).
//
// 참조:
// - src_rs/core/ports.rs
// - src_rs/core/context.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::{CoreError, CoreResult};
use crate::core::ports::{Embedder, EmbeddingMode};

pub trait BlockingEmbedder: Send + Sync + 'static {
    fn embed_blocking(&self, texts: &[String], mode: EmbeddingMode) -> CoreResult<Vec<Vec<f32>>>;
}

pub struct OffloadedEmbedder<E> {
    inner: Arc<E>,
}

impl<E: BlockingEmbedder> OffloadedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }
}

#[async_trait]
impl<E: BlockingEmbedder> Embedder for OffloadedEmbedder<E> {
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> CoreResult<Vec<Vec<f32>>> {
        let inner = self.inner.clone();
        let owned = texts.to_vec();
        tokio::task::spawn_blocking(move || inner.embed_blocking(&owned, mode))
            .await
            .map_err(|error| CoreError::Runtime(format!("임베딩 블로킹 작업 조인 실패: {}", error)))?
    }
}
