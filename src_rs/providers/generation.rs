// 목적:
// - OpenAI 호환 chat completion 엔드포인트 어댑터를 제공한다.
//
// 설명:
// - 답변 생성과 질의 확장이 같은 생성기를 서로 다른 지시문으로 사용한다.
//
// 디자인 패턴:
// - 어댑터(Adapter).
//
// 참조:
// - src_rs/providers/http.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::ProviderHttpConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::ports::{ChatMessage, TextGenerator};
use crate::providers::http::ProviderHttpClient;

#[derive(Clone)]
pub struct HttpTextGenerator {
    http: ProviderHttpClient,
}

impl HttpTextGenerator {
    pub fn new(config: ProviderHttpConfig) -> CoreResult<Self> {
        Ok(Self {
            http: ProviderHttpClient::new(config, "generation")?,
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn complete(&self, messages: &[ChatMessage]) -> CoreResult<String> {
        #[derive(Serialize)]
        struct CompletionRequest<'a> {
            model: Option<&'a str>,
            messages: &'a [ChatMessage],
        }

        let body = CompletionRequest {
            model: self.http.model(),
            messages,
        };
        let value = self.http.post_json(&body).await?;
        parse_completion_response(&value)
    }
}

fn parse_completion_response(value: &Value) -> CoreResult<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::Serialization(format!(
                "생성 응답에 choices[0].message.content가 없습니다: {}",
                value
            ))
        })
}
