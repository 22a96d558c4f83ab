// 목적:
// - 융합된 후보 목록을 외부 재정렬 제공자로 다시 점수화한다.
//
// 설명:
// - 제공자 호출이 실패하거나 응답이 비정상이면 융합 순서를 limit까지 잘라 반환한다.
// - 범위를 벗어난 인덱스, 중복 인덱스는 무시한다.
//
// 디자인 패턴:
// - 데코레이터(Decorator) + 안전한 폴백(Graceful Fallback).
//
// 참조:
// - src_rs/core/search_pipeline.rs
// - src_rs/providers/rerank.rs

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::model::RankedList;
use crate::core::ports::RerankProvider;

#[derive(Clone)]
pub struct Reranker {
    provider: Arc<dyn RerankProvider>,
}

impl Reranker {
    pub fn new(provider: Arc<dyn RerankProvider>) -> Self {
        Self { provider }
    }

    /// 후보를 재정렬해 최대 `limit`개를 반환한다. 이 단계는 오류를 밖으로 내보내지 않는다.
    pub async fn rerank(&self, query: &str, candidates: RankedList, limit: usize) -> RankedList {
        if candidates.is_empty() || limit == 0 {
            return truncate(candidates, limit);
        }

        let documents = candidates
            .iter()
            .map(|item| item.content.clone())
            .collect::<Vec<_>>();

        let scored = match self.provider.rerank(query, &documents, limit).await {
            Ok(scored) => scored,
            Err(error) => {
                warn!(error = %error, candidates = candidates.len(), "재정렬 실패, 융합 순서를 유지합니다");
                return truncate(candidates, limit);
            }
        };

        let reordered = apply_rerank(candidates.clone(), &scored, limit);
        if reordered.is_empty() {
            warn!(
                candidates = candidates.len(),
                "재정렬 응답에 유효한 인덱스가 없어 융합 순서를 유지합니다"
            );
            return truncate(candidates, limit);
        }

        debug!(kept = reordered.len(), "재정렬 완료");
        reordered
    }
}

fn truncate(mut list: RankedList, limit: usize) -> RankedList {
    list.truncate(limit);
    list
}

/// (원본 인덱스, 관련도) 쌍 순서대로 후보를 재배치하고 관련도로 점수를 교체한다.
pub fn apply_rerank(candidates: RankedList, scored: &[(usize, f64)], limit: usize) -> RankedList {
    let mut slots = candidates.into_iter().map(Some).collect::<Vec<_>>();
    let mut reordered = RankedList::with_capacity(limit.min(scored.len()));

    for &(index, score) in scored {
        if reordered.len() >= limit {
            break;
        }
        let Some(slot) = slots.get_mut(index) else {
            continue;
        };
        if let Some(mut item) = slot.take() {
            item.relevance_score = score;
            reordered.push(item);
        }
    }

    reordered
}
