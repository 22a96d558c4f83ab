// 목적:
// - 검색 전략을 선택해 실행하고 하나의 정렬 목록을 반환한다.
//
// 설명:
// - vector/keyword는 단일 분기이며 실패가 그대로 전파된다.
// - hybrid와 질의 확장 전략은 분기를 동시에 실행(fork-join)하고, 실패한 분기는 빈 목록으로 흡수한다.
// - 모든 분기를 기다린 뒤 RRF로 융합하고, 재정렬기가 있으면 넉넉히 확보한 후보를 재정렬한다.
// - 범위(scope)는 모든 검색기 호출에 동등 필터로 전달된다.
//
// 디자인 패턴:
// - 전략(Strategy) + 포크-조인(Fork-Join).
//
// 참조:
// - src_rs/core/fusion.rs
// - src_rs/core/expansion.rs
// - src_rs/core/rerank.rs

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::core::config::SearchConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::expansion::{ExpansionMode, QueryExpander};
use crate::core::fusion::FusionEngine;
use crate::core::model::{CorpusScope, RankedList};
use crate::core::ports::{CorpusStore, Embedder, RerankProvider, TextGenerator};
use crate::core::rerank::Reranker;
use crate::core::retrievers::{KeywordRetriever, VectorRetriever};
use crate::core::strategy::{BranchKind, SearchStrategy};

/// 호출자(브릿지)가 보내는 검색 요청이다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub scope: CorpusScope,
    #[serde(default)]
    pub strategy: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Clone)]
pub struct SearchRouter {
    vector: VectorRetriever,
    keyword: KeywordRetriever,
    expander: QueryExpander,
    fusion: FusionEngine,
    reranker: Option<Reranker>,
    config: SearchConfig,
}

impl SearchRouter {
    pub fn new(
        store: Arc<dyn CorpusStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        config: SearchConfig,
    ) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            vector: VectorRetriever::new(store.clone(), embedder),
            keyword: KeywordRetriever::new(store),
            expander: QueryExpander::new(generator),
            fusion: FusionEngine::new(config.rrf_k)?,
            reranker: None,
            config,
        })
    }

    pub fn with_reranker(mut self, provider: Arc<dyn RerankProvider>) -> Self {
        self.reranker = Some(Reranker::new(provider));
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// 요청 페이로드를 해석해 검색을 실행한다. 전략 이름이 없으면 vector를 사용한다.
    pub async fn execute(&self, request: &SearchRequest) -> CoreResult<RankedList> {
        let strategy = request
            .strategy
            .as_deref()
            .map(SearchStrategy::resolve)
            .unwrap_or_default();
        let limit = request.limit.unwrap_or(self.config.default_limit);
        self.search(&request.query, &request.scope, strategy, limit)
            .await
    }

    pub async fn search(
        &self,
        query: &str,
        scope: &CorpusScope,
        strategy: SearchStrategy,
        limit: usize,
    ) -> CoreResult<RankedList> {
        validate_search(query, scope, limit)?;

        let started = Instant::now();
        // 재정렬은 상위 K 바깥의 항목을 끌어올릴 수 있으므로 후보를 더 확보한다.
        let window = match self.reranker {
            Some(_) => self.config.rerank_candidates.max(limit),
            None => limit,
        };
        let branch_limit = self.config.candidate_limit.max(window);

        let mut candidates = match (strategy, strategy.expansion()) {
            (_, Some((mode, kind))) => {
                self.expanded_branches(query, scope, mode, kind, branch_limit)
                    .await
            }
            (SearchStrategy::Keyword, None) => {
                self.keyword.retrieve(query, scope, branch_limit).await?
            }
            (SearchStrategy::Hybrid, None) => self.hybrid_branch(query, scope, branch_limit).await,
            (_, None) => self.vector.retrieve(query, scope, branch_limit).await?,
        };
        candidates.truncate(window);

        let results = match self.reranker.as_ref() {
            Some(reranker) => reranker.rerank(query, candidates, limit).await,
            None => {
                candidates.truncate(limit);
                candidates
            }
        };

        info!(
            strategy = strategy.as_str(),
            scope = ?scope,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "검색 완료"
        );
        Ok(results)
    }

    /// vector와 keyword를 동시에 실행해 융합한다. 한쪽 실패는 빈 목록으로 처리한다.
    async fn hybrid_branch(&self, query: &str, scope: &CorpusScope, limit: usize) -> RankedList {
        let (vector_result, keyword_result) = tokio::join!(
            self.vector.retrieve(query, scope, limit),
            self.keyword.retrieve(query, scope, limit),
        );

        let vector_hits = absorb_branch_failure("vector", vector_result);
        let keyword_hits = absorb_branch_failure("keyword", keyword_result);
        debug!(
            vector = vector_hits.len(),
            keyword = keyword_hits.len(),
            "hybrid 분기 결과"
        );

        self.fusion.fuse(vec![vector_hits, keyword_hits])
    }

    async fn expanded_branches(
        &self,
        query: &str,
        scope: &CorpusScope,
        mode: ExpansionMode,
        kind: BranchKind,
        limit: usize,
    ) -> RankedList {
        let variants = self.expander.expand(query, mode).await;
        debug!(?mode, ?kind, variants = ?variants, "질의 확장 결과");

        let mut join_set = JoinSet::new();
        for (index, variant) in variants.into_iter().enumerate() {
            let router = self.clone();
            let scope = scope.clone();
            join_set.spawn(async move {
                let hits = match kind {
                    BranchKind::Vector => absorb_branch_failure(
                        "vector",
                        router.vector.retrieve(&variant, &scope, limit).await,
                    ),
                    BranchKind::Hybrid => router.hybrid_branch(&variant, &scope, limit).await,
                };
                (index, hits)
            });
        }

        let mut branches = Vec::<(usize, RankedList)>::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(branch) => branches.push(branch),
                Err(error) => warn!(error = %error, "검색 분기 조인 실패, 빈 목록으로 처리합니다"),
            }
        }

        // 완료 순서와 무관하게 질의 순서대로 융합해야 동점 처리가 결정적이다.
        branches.sort_by_key(|(index, _)| *index);
        self.fusion
            .fuse(branches.into_iter().map(|(_, hits)| hits).collect())
    }
}

fn absorb_branch_failure(branch: &str, result: CoreResult<RankedList>) -> RankedList {
    match result {
        Ok(hits) => hits,
        Err(error) => {
            warn!(branch, error = %error, "검색 분기 실패, 빈 목록으로 처리합니다");
            Vec::new()
        }
    }
}

fn validate_search(query: &str, scope: &CorpusScope, limit: usize) -> CoreResult<()> {
    if query.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "query는 비어 있을 수 없습니다".to_string(),
        ));
    }

    if limit == 0 {
        return Err(CoreError::InvalidInput(
            "limit은 1 이상이어야 합니다".to_string(),
        ));
    }

    scope.validate()
}
