// 목적:
// - Python에서 호출 가능한 검색/답변 브릿지 클래스를 제공한다.
//
// 설명:
// - JSON 검색 요청을 받아 라우터 또는 답변 서비스를 실행하고 결과를 JSON 문자열로 반환한다.
// - 대기 중에는 GIL을 해제한다.
//
// 디자인 패턴:
// - 파사드(Facade) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/core/search_pipeline.rs
// - src_rs/core/answer.rs

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use tokio::runtime::Runtime;

use crate::api::{bootstrap, to_json, to_py_error};
use crate::core::context::AppContext;
use crate::core::search_pipeline::SearchRequest;
use crate::core::strategy::SearchStrategy;

/// Python에 노출되는 검색 브릿지 클래스다.
#[pyclass(name = "SearchBridge")]
pub struct PySearchBridge {
    runtime: Runtime,
    context: AppContext,
}

fn parse_request(request_json: &str) -> PyResult<SearchRequest> {
    serde_json::from_str(request_json).map_err(|error| {
        PyValueError::new_err(format!("검색 요청 JSON 파싱에 실패했습니다: {}", error))
    })
}

#[pymethods]
impl PySearchBridge {
    #[new]
    pub fn new(config_json: &str) -> PyResult<Self> {
        let (runtime, context) = bootstrap(config_json)?;
        Ok(Self { runtime, context })
    }

    /// 지원하는 검색 전략 이름 목록.
    #[staticmethod]
    pub fn strategies() -> Vec<&'static str> {
        SearchStrategy::ALL.iter().map(|strategy| strategy.as_str()).collect()
    }

    /// 검색 요청(JSON)을 실행하고 순위 목록 JSON을 반환한다.
    pub fn search(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        let request = parse_request(request_json)?;
        let results = py
            .detach(|| self.runtime.block_on(self.context.router().execute(&request)))
            .map_err(to_py_error)?;
        to_json(&results, "검색 결과")
    }

    /// 검색 결과를 문맥으로 답변을 생성하고 `{answer, sources}` JSON을 반환한다.
    pub fn answer(&self, py: Python<'_>, request_json: &str) -> PyResult<String> {
        let request = parse_request(request_json)?;
        let answer = py
            .detach(|| self.runtime.block_on(self.context.answers().answer(&request)))
            .map_err(to_py_error)?;
        to_json(&answer, "답변")
    }
}
