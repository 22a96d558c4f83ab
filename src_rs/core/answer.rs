// 목적:
// - 검색 결과를 문맥으로 묶어 답변을 생성한다.
//
// 설명:
// - 결과가 비어 있으면 생성 호출 없이 "No info found." 안내문을 반환한다.
// - 상위 N개 항목만 "Source: ..." 형식으로 문맥에 넣는다.
//
// 디자인 패턴:
// - 파사드(Facade).
//
// 참조:
// - src_rs/core/search_pipeline.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::errors::CoreResult;
use crate::core::model::{CorpusScope, RetrievalItem};
use crate::core::ports::{ChatMessage, TextGenerator};
use crate::core::search_pipeline::{SearchRequest, SearchRouter};

pub const NO_INFORMATION_ANSWER: &str = "No info found.";

const ANSWER_INSTRUCTION: &str = "You are a helpful assistant. Use the context provided to answer \
the user's question. If the answer is not in the context, say so.";

const SOURCE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSource {
    pub content: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<AnswerSource>,
}

#[derive(Clone)]
pub struct AnswerService {
    router: SearchRouter,
    generator: Arc<dyn TextGenerator>,
}

impl AnswerService {
    pub fn new(router: SearchRouter, generator: Arc<dyn TextGenerator>) -> Self {
        Self { router, generator }
    }

    pub fn router(&self) -> &SearchRouter {
        &self.router
    }

    pub async fn answer(&self, request: &SearchRequest) -> CoreResult<ChatAnswer> {
        let results = self.router.execute(request).await?;
        if results.is_empty() {
            info!(scope = ?request.scope, "검색 결과가 없어 안내 답변을 반환합니다");
            return Ok(no_information());
        }

        let context_items = self.router.config().answer_context_items;
        let top = &results[..results.len().min(context_items)];
        let messages = build_answer_messages(&request.query, top);
        let answer = self.generator.complete(&messages).await?;

        Ok(ChatAnswer {
            answer,
            sources: top.iter().map(to_source).collect(),
        })
    }

    /// 범위와 질의만으로 답변을 만든다.
    pub async fn answer_query(
        &self,
        query: &str,
        scope: CorpusScope,
        strategy: Option<String>,
    ) -> CoreResult<ChatAnswer> {
        let request = SearchRequest {
            query: query.to_string(),
            scope,
            strategy,
            limit: None,
        };
        self.answer(&request).await
    }
}

fn no_information() -> ChatAnswer {
    ChatAnswer {
        answer: NO_INFORMATION_ANSWER.to_string(),
        sources: Vec::new(),
    }
}

pub fn build_answer_messages(query: &str, items: &[RetrievalItem]) -> Vec<ChatMessage> {
    let context = items
        .iter()
        .map(|item| format!("Source: {}", item.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    vec![
        ChatMessage::system(ANSWER_INSTRUCTION),
        ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, query)),
    ]
}

fn to_source(item: &RetrievalItem) -> AnswerSource {
    AnswerSource {
        content: item.content.chars().take(SOURCE_PREVIEW_CHARS).collect(),
        score: item.relevance_score,
    }
}
