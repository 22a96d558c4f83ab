// 목적:
// - HTTP 재정렬 제공자 어댑터를 제공한다.
//
// 설명:
// - 요청: {query, documents, model, top_k}.
// - 응답: {data|results: [{index, relevance_score}]}. 관련도 내림차순으로 정렬해 반환한다.
//
// 디자인 패턴:
// - 어댑터(Adapter).
//
// 참조:
// - src_rs/providers/http.rs
// - src_rs/core/rerank.rs

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::ProviderHttpConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::ports::RerankProvider;
use crate::providers::http::ProviderHttpClient;

#[derive(Clone)]
pub struct HttpRerankProvider {
    http: ProviderHttpClient,
}

impl HttpRerankProvider {
    pub fn new(config: ProviderHttpConfig) -> CoreResult<Self> {
        Ok(Self {
            http: ProviderHttpClient::new(config, "rerank")?,
        })
    }
}

#[async_trait]
impl RerankProvider for HttpRerankProvider {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> CoreResult<Vec<(usize, f64)>> {
        #[derive(Serialize)]
        struct RerankRequest<'a> {
            query: &'a str,
            documents: &'a [String],
            model: Option<&'a str>,
            top_k: usize,
        }

        let body = RerankRequest {
            query,
            documents,
            model: self.http.model(),
            top_k,
        };
        let value = self.http.post_json(&body).await?;
        parse_rerank_response(&value)
    }
}

fn parse_rerank_response(value: &Value) -> CoreResult<Vec<(usize, f64)>> {
    let entries = value
        .get("data")
        .or_else(|| value.get("results"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            CoreError::Serialization("재정렬 응답에 data/results 배열이 없습니다".to_string())
        })?;

    let mut scored = entries
        .iter()
        .map(|entry| {
            let index = entry.get("index").and_then(Value::as_u64);
            let score = entry.get("relevance_score").and_then(Value::as_f64);
            match (index, score) {
                (Some(index), Some(score)) => Ok((index as usize, score)),
                _ => Err(CoreError::Serialization(format!(
                    "재정렬 응답 항목 형식이 올바르지 않습니다: {}",
                    entry
                ))),
            }
        })
        .collect::<CoreResult<Vec<_>>>()?;

    scored.sort_by(|left, right| right.1.total_cmp(&left.1));
    Ok(scored)
}
