// 목적:
// - 텍스트 생성 호출로 질의 변형(paraphrase) 또는 하위 질문 분해(decompose)를 만든다.
//
// 설명:
// - 모드별 고정 지시문을 보내고 응답을 줄 단위로 나눠 빈 줄을 버린다.
// - 사용할 줄이 없거나 생성 호출이 실패하면 원본 질의 하나만 반환한다.
// - paraphrase는 원본 + 최대 2개, decompose는 최대 3개 하위 질문을 반환한다.
//
// 디자인 패턴:
// - 어댑터(Adapter) + 안전한 폴백(Graceful Fallback).
//
// 참조:
// - src_rs/core/search_pipeline.rs
// - src_rs/core/ports.rs

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::ports::{ChatMessage, TextGenerator};

pub const MAX_PARAPHRASES: usize = 2;
pub const MAX_SUB_QUESTIONS: usize = 3;

const PARAPHRASE_INSTRUCTION: &str = "You rewrite search queries. Produce exactly 2 alternative \
phrasings of the user's question that keep its meaning but vary vocabulary. Output one \
rephrased question per line with no numbering and no extra text.";

const DECOMPOSE_INSTRUCTION: &str = "You split compound questions. If the user's question asks \
about several things, break it into at most 3 self-contained sub-questions. If it is already a \
single question, return it unchanged. Output one question per line with no numbering and no \
extra text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    Paraphrase,
    Decompose,
}

impl ExpansionMode {
    fn instruction(self) -> &'static str {
        match self {
            ExpansionMode::Paraphrase => PARAPHRASE_INSTRUCTION,
            ExpansionMode::Decompose => DECOMPOSE_INSTRUCTION,
        }
    }
}

#[derive(Clone)]
pub struct QueryExpander {
    generator: Arc<dyn TextGenerator>,
}

impl QueryExpander {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// 비어 있지 않은 질의 목록을 반환한다. 첫 원소 순서는 모드별 규칙을 따른다.
    pub async fn expand(&self, query: &str, mode: ExpansionMode) -> Vec<String> {
        let messages = [
            ChatMessage::system(mode.instruction()),
            ChatMessage::user(query),
        ];

        let raw = match self.generator.complete(&messages).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(error = %error, ?mode, "질의 확장 호출 실패, 원본 질의로 대체합니다");
                return vec![query.to_string()];
            }
        };

        let expanded = shape_expansion(query, &raw, mode);
        debug!(?mode, variants = expanded.len(), "질의 확장 완료");
        expanded
    }
}

/// 생성 응답을 모드별 상한에 맞춰 질의 목록으로 정리한다.
pub fn shape_expansion(query: &str, raw: &str, mode: ExpansionMode) -> Vec<String> {
    let lines = usable_lines(raw);

    let shaped = match mode {
        ExpansionMode::Paraphrase => {
            let mut variants = vec![query.to_string()];
            variants.extend(
                lines
                    .into_iter()
                    .filter(|line| line.as_str() != query.trim())
                    .take(MAX_PARAPHRASES),
            );
            variants
        }
        ExpansionMode::Decompose => lines.into_iter().take(MAX_SUB_QUESTIONS).collect(),
    };

    if shaped.is_empty() {
        return vec![query.to_string()];
    }
    shaped
}

fn usable_lines(raw: &str) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    for line in raw.lines() {
        let cleaned = strip_list_marker(line.trim()).trim();
        if cleaned.is_empty() || seen.iter().any(|existing| existing == cleaned) {
            continue;
        }
        seen.push(cleaned.to_string());
    }
    seen
}

// "- ", "* ", "1. ", "2) " 형태의 목록 표식만 제거한다.
fn strip_list_marker(line: &str) -> &str {
    if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
    {
        return rest;
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return stripped;
        }
    }
    line
}
