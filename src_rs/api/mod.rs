// 목적:
// - Python FFI 경계 모듈을 선언한다.
//
// 설명:
// - 검색/답변 브릿지와 적재/작업 큐 브릿지를 분리해 Python 계층에서 두 클래스로 사용할 수 있게 한다.
// - 두 브릿지는 런타임과 애플리케이션 컨텍스트 생성 절차를 공유한다.
//
// 디자인 패턴:
// - 모듈 분리(Module Separation).
//
// 참조:
// - src_rs/api/search_bridge.rs
// - src_rs/api/queue_bridge.rs

pub mod queue_bridge;
pub mod search_bridge;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::PyErr;
use serde::Serialize;
use tokio::runtime::{Builder, Runtime};

use crate::core::config::AppConfig;
use crate::core::context::AppContext;
use crate::core::errors::CoreError;
use crate::telemetry::{init_tracing, DEFAULT_LOG_FILTER};

pub(crate) fn to_py_error(error: CoreError) -> PyErr {
    match error {
        CoreError::InvalidInput(_) | CoreError::InvalidConfig(_) => {
            PyValueError::new_err(error.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T, label: &str) -> Result<String, PyErr> {
    serde_json::to_string(value)
        .map_err(|error| PyRuntimeError::new_err(format!("{} 직렬화 실패: {}", label, error)))
}

/// 설정 JSON으로 전용 런타임과 컨텍스트를 만든다.
pub(crate) fn bootstrap(config_json: &str) -> Result<(Runtime, AppContext), PyErr> {
    init_tracing(DEFAULT_LOG_FILTER);

    let config = AppConfig::from_json_str(config_json).map_err(to_py_error)?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| PyRuntimeError::new_err(format!("Tokio 런타임 생성 실패: {}", error)))?;
    let context = runtime
        .block_on(AppContext::connect(config))
        .map_err(to_py_error)?;

    Ok((runtime, context))
}
