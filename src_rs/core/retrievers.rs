// 목적:
// - 코퍼스 저장소에 유사도/전문 검색을 한 번씩 요청하는 얇은 검색기를 제공한다.
//
// 설명:
// - VectorRetriever는 질의를 query 모드로 한 번 임베딩한 뒤 유사도 검색을 수행한다.
// - KeywordRetriever는 원문 질의로 전문 검색을 수행한다.
// - 두 검색기 모두 범위(scope)를 저장소 필터로 그대로 전달한다.
//
// 디자인 패턴:
// - 어댑터(Adapter).
//
// 참조:
// - src_rs/core/ports.rs
// - src_rs/core/search_pipeline.rs

use std::sync::Arc;

use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{CorpusScope, RankedList};
use crate::core::ports::{CorpusStore, Embedder, EmbeddingMode};

#[derive(Clone)]
pub struct VectorRetriever {
    store: Arc<dyn CorpusStore>,
    embedder: Arc<dyn Embedder>,
}

impl VectorRetriever {
    pub fn new(store: Arc<dyn CorpusStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList> {
        let embedding = self.embed_query(query).await?;
        self.retrieve_with_embedding(&embedding, scope, limit).await
    }

    pub async fn retrieve_with_embedding(
        &self,
        embedding: &[f32],
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList> {
        self.store.similarity_search(embedding, scope, limit).await
    }

    pub async fn embed_query(&self, query: &str) -> CoreResult<Vec<f32>> {
        let vectors = self
            .embedder
            .embed(&[query.to_string()], EmbeddingMode::Query)
            .await?;

        let embedding = vectors.into_iter().next().ok_or_else(|| {
            CoreError::Http("임베딩 제공자가 벡터를 반환하지 않았습니다".to_string())
        })?;
        if embedding.is_empty() {
            return Err(CoreError::Http(
                "임베딩 제공자가 빈 벡터를 반환했습니다".to_string(),
            ));
        }
        Ok(embedding)
    }
}

#[derive(Clone)]
pub struct KeywordRetriever {
    store: Arc<dyn CorpusStore>,
}

impl KeywordRetriever {
    pub fn new(store: Arc<dyn CorpusStore>) -> Self {
        Self { store }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList> {
        self.store.text_search(query, scope, limit).await
    }
}
