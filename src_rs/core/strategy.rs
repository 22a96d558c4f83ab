// 목적:
// - 검색 전략의 닫힌 집합을 정의한다.
//
// 설명:
// - 알 수 없는 전략 이름은 vector로 대체하되 경고 로그를 남겨 설정 오류를 드러낸다.
//
// 디자인 패턴:
// - 닫힌 열거형(Closed Enum).
//
// 참조:
// - src_rs/core/search_pipeline.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::CoreError;
use crate::core::expansion::ExpansionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    Vector,
    Keyword,
    Hybrid,
    MultiQueryVector,
    MultiQueryHybrid,
    QueryDecomposeVector,
    QueryDecomposeHybrid,
}

/// 확장 질의 하나마다 실행되는 단일 분기 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Vector,
    Hybrid,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 7] = [
        SearchStrategy::Vector,
        SearchStrategy::Keyword,
        SearchStrategy::Hybrid,
        SearchStrategy::MultiQueryVector,
        SearchStrategy::MultiQueryHybrid,
        SearchStrategy::QueryDecomposeVector,
        SearchStrategy::QueryDecomposeHybrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchStrategy::Vector => "vector",
            SearchStrategy::Keyword => "keyword",
            SearchStrategy::Hybrid => "hybrid",
            SearchStrategy::MultiQueryVector => "multi_query_vector",
            SearchStrategy::MultiQueryHybrid => "multi_query_hybrid",
            SearchStrategy::QueryDecomposeVector => "query_decompose_vector",
            SearchStrategy::QueryDecomposeHybrid => "query_decompose_hybrid",
        }
    }

    /// 전략 이름을 해석한다. 모르는 이름은 경고 후 `Vector`로 대체한다.
    pub fn resolve(name: &str) -> Self {
        match name.parse::<SearchStrategy>() {
            Ok(strategy) => strategy,
            Err(_) => {
                warn!(
                    requested = name,
                    fallback = SearchStrategy::Vector.as_str(),
                    "알 수 없는 검색 전략입니다. vector로 대체합니다"
                );
                SearchStrategy::Vector
            }
        }
    }

    /// 질의 확장이 필요한 전략이면 (확장 모드, 분기 종류)를 반환한다.
    pub fn expansion(self) -> Option<(ExpansionMode, BranchKind)> {
        match self {
            SearchStrategy::MultiQueryVector => Some((ExpansionMode::Paraphrase, BranchKind::Vector)),
            SearchStrategy::MultiQueryHybrid => Some((ExpansionMode::Paraphrase, BranchKind::Hybrid)),
            SearchStrategy::QueryDecomposeVector => {
                Some((ExpansionMode::Decompose, BranchKind::Vector))
            }
            SearchStrategy::QueryDecomposeHybrid => {
                Some((ExpansionMode::Decompose, BranchKind::Hybrid))
            }
            SearchStrategy::Vector | SearchStrategy::Keyword | SearchStrategy::Hybrid => None,
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        SearchStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidInput(format!("지원하지 않는 검색 전략입니다: {}", value)))
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
