// 목적:
// - 외부 제공자 HTTP 호출의 공통 부분(클라이언트 생성, 인증, 상태 검사, JSON 파싱)을 담당한다.
//
// 설명:
// - 제공자별 어댑터는 요청 본문과 응답 해석만 구현한다.
//
// 디자인 패턴:
// - 어댑터(Adapter)의 공통 기반.
//
// 참조:
// - src_rs/providers/embedding.rs
// - src_rs/providers/rerank.rs
// - src_rs/providers/generation.rs

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::core::config::ProviderHttpConfig;
use crate::core::errors::{CoreError, CoreResult};

#[derive(Clone)]
pub struct ProviderHttpClient {
    client: Client,
    config: ProviderHttpConfig,
    name: &'static str,
}

impl ProviderHttpClient {
    pub fn new(config: ProviderHttpConfig, name: &'static str) -> CoreResult<Self> {
        config.validate(name)?;

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|error| CoreError::Http(format!("HTTP 클라이언트 생성 실패: {}", error)))?;

        Ok(Self {
            client,
            config,
            name,
        })
    }

    pub fn model(&self) -> Option<&str> {
        self.config.model.as_deref()
    }

    pub async fn post_json<B>(&self, body: &B) -> CoreResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let mut request_builder = self.client.post(self.config.url.as_str()).json(body);
        if let Some(token) = self.config.auth_token.as_ref() {
            request_builder = request_builder.bearer_auth(token);
        }

        let response = request_builder.send().await.map_err(|error| {
            CoreError::Http(format!("{} HTTP 요청 실패: {}", self.name, error))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Http(format!("{} HTTP 본문 읽기 실패: {}", self.name, error))
        })?;

        if !status.is_success() {
            return Err(CoreError::Http(format!(
                "{} HTTP 상태 오류: status={}, body={}",
                self.name, status, body
            )));
        }

        serde_json::from_str(body.trim()).map_err(|error| {
            CoreError::Serialization(format!(
                "{} 응답 JSON 파싱 실패: {}, body={}",
                self.name, error, body
            ))
        })
    }
}
