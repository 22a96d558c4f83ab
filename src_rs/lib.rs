#![allow(non_local_definitions)]

// 목적:
// - 지식 수집(Knowledge Capture) 검색/적재 런타임 라이브러리의 진입점을 제공한다.
//
// 설명:
// - core는 검색 라우팅/융합/재정렬, 답변, 적재, 작업 큐와 워커를 담당한다.
// - index는 PostgreSQL 저장소와 프로세스 내부 작업 큐, providers는 HTTP 외부 제공자 어댑터다.
// - Python 바인딩은 `python` 기능을 켰을 때만 빌드한다.
//
// 디자인 패턴:
// - 계층형 모듈 구조(api/core/index/providers).
//
// 참조:
// - src_rs/core/mod.rs
// - src_rs/api/search_bridge.rs

#[cfg(feature = "python")]
pub mod api;
pub mod core;
pub mod index;
pub mod providers;
pub mod telemetry;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// 확장 모듈 이름. cdylib 파일명(`[lib] name`)과 같아야 `PyInit_<이름>`을 찾을 수 있다.
pub const PYTHON_MODULE_NAME: &str = "knowledge_capture";

#[cfg(feature = "python")]
#[pymodule]
#[pyo3(name = "knowledge_capture")]
fn python_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<api::search_bridge::PySearchBridge>()?;
    m.add_class::<api::queue_bridge::PyQueueBridge>()?;
    Ok(())
}
