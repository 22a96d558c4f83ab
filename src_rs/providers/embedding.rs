// 목적:
// - HTTP 임베딩 제공자 어댑터를 제공한다.
//
// 설명:
// - 요청: {input, model, input_type}. input_type은 document/query 중 하나다.
// - 응답: {data: [{embedding, index?}]}. index가 있으면 그 순서로 정렬한다.
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
use crate::core::ports::{Embedder, EmbeddingMode};
use crate::providers::http::ProviderHttpClient;

#[derive(Clone)]
pub struct HttpEmbedder {
    http: ProviderHttpClient,
}

impl HttpEmbedder {
    pub fn new(config: ProviderHttpConfig) -> CoreResult<Self> {
        Ok(Self {
            http: ProviderHttpClient::new(config, "embedding")?,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String], mode: EmbeddingMode) -> CoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        #[derive(Serialize)]
        struct EmbeddingRequest<'a> {
            input: &'a [String],
            model: Option<&'a str>,
            input_type: &'static str,
        }

        let body = EmbeddingRequest {
            input: texts,
            model: self.http.model(),
            input_type: mode.as_str(),
        };

        let value = self.http.post_json(&body).await?;
        let vectors = parse_embedding_response(&value)?;
        if vectors.len() != texts.len() {
            return Err(CoreError::Http(format!(
                "임베딩 개수가 입력 수와 다릅니다: inputs={}, vectors={}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

fn parse_embedding_response(value: &Value) -> CoreResult<Vec<Vec<f32>>> {
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| CoreError::Serialization("임베딩 응답에 data 배열이 없습니다".to_string()))?;

    let mut indexed = Vec::with_capacity(data.len());
    for (position, entry) in data.iter().enumerate() {
        let index = entry
            .get("index")
            .and_then(Value::as_u64)
            .map(|index| index as usize)
            .unwrap_or(position);
        let embedding = entry
            .get("embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                CoreError::Serialization(format!("임베딩 응답 {}번 항목에 embedding이 없습니다", position))
            })?
            .iter()
            .map(|component| {
                component.as_f64().map(|number| number as f32).ok_or_else(|| {
                    CoreError::Serialization("임베딩 값이 숫자가 아닙니다".to_string())
                })
            })
            .collect::<CoreResult<Vec<f32>>>()?;
        indexed.push((index, embedding));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, embedding)| embedding).collect())
}
