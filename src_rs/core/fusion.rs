// 목적:
// - 여러 정렬 목록을 Reciprocal Rank Fusion(RRF)으로 하나의 목록으로 병합한다.
//
// 설명:
// - 목록 i에서 순위 r(0부터)에 있는 항목은 1/(k + r)점을 얻고, 없는 목록에서는 0점이다.
// - 항목의 본문/속성은 처음 등장한 위치의 값을 사용하고 이후 등장은 점수만 누적한다.
// - 동점은 최초 등장 순서(목록 순서, 목록 내 순위 순)로 정렬한다.
//
// 디자인 패턴:
// - 순수 함수(Pure Function).
//
// 참조:
// - src_rs/core/search_pipeline.rs

use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{RankedList, RetrievalItem};

pub const DEFAULT_RRF_K: u32 = 60;

/// RRF 병합기. 호출 간 상태를 갖지 않으므로 동시에 여러 호출에서 공유해도 된다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FusionEngine {
    k: NonZeroU32,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self {
            k: NonZeroU32::MIN.saturating_add(DEFAULT_RRF_K - 1),
        }
    }
}

impl FusionEngine {
    pub fn new(k: u32) -> CoreResult<Self> {
        let k = NonZeroU32::new(k).ok_or_else(|| {
            CoreError::InvalidConfig("rrf_k는 1 이상이어야 합니다".to_string())
        })?;
        Ok(Self { k })
    }

    pub fn k(&self) -> u32 {
        self.k.get()
    }

    pub fn fuse(&self, lists: Vec<RankedList>) -> RankedList {
        fuse(lists, self.k)
    }
}

struct FusedEntry {
    item: RetrievalItem,
    score: f64,
}

/// 정렬 목록들을 RRF 점수 내림차순으로 병합한다.
pub fn fuse(lists: Vec<RankedList>, k: NonZeroU32) -> RankedList {
    let k = f64::from(k.get());
    // entries의 위치가 곧 최초 등장 순서다.
    let mut entries = Vec::<FusedEntry>::new();
    let mut positions = HashMap::<String, usize>::new();

    for list in lists {
        for (rank, item) in list.into_iter().enumerate() {
            let contribution = 1.0 / (k + rank as f64);
            match positions.get(&item.id) {
                Some(&position) => entries[position].score += contribution,
                None => {
                    positions.insert(item.id.clone(), entries.len());
                    entries.push(FusedEntry {
                        item,
                        score: contribution,
                    });
                }
            }
        }
    }

    // sort_by는 안정 정렬이므로 동점은 최초 등장 순서를 유지한다.
    entries.sort_by(|left, right| right.score.total_cmp(&left.score));

    entries
        .into_iter()
        .map(|entry| RetrievalItem {
            relevance_score: entry.score,
            ..entry.item
        })
        .collect()
}
