// 목적:
// - Python에서 호출 가능한 적재/작업 큐 브릿지 클래스를 제공한다.
//
// 설명:
// - 파일/Q&A 적재 접수, 문서 목록/삭제, 작업 push/claim/complete/get을 노출한다.
// - 작업 실행은 별도 워커 프로세스가 담당하며, 이 브릿지는 큐 조작만 한다.
//
// 디자인 패턴:
// - 파사드(Facade) + 실패 빠르게(Fail Fast).
//
// 참조:
// - src_rs/core/ingestion_pipeline.rs
// - src_rs/core/queue.rs

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde_json::Value;
use tokio::runtime::Runtime;
use uuid::Uuid;

use crate::api::{bootstrap, to_json, to_py_error};
use crate::core::context::AppContext;
use crate::core::ingestion_pipeline::QaPair;
use crate::core::model::TaskOutcome;

#[pyclass(name = "QueueBridge")]
pub struct PyQueueBridge {
    runtime: Runtime,
    context: AppContext,
}

fn parse_uuid(value: &str, field_name: &str) -> PyResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|error| PyValueError::new_err(format!("{} 형식 오류: {}", field_name, error)))
}

#[pymethods]
impl PyQueueBridge {
    #[new]
    pub fn new(config_json: &str) -> PyResult<Self> {
        let (runtime, context) = bootstrap(config_json)?;
        Ok(Self { runtime, context })
    }

    pub fn submit_file(
        &self,
        py: Python<'_>,
        owner: &str,
        filename: &str,
        content_type: &str,
        content: &[u8],
    ) -> PyResult<String> {
        let submitted = py
            .detach(|| {
                self.runtime.block_on(self.context.ingestion().submit_file(
                    owner,
                    filename,
                    content_type,
                    content,
                ))
            })
            .map_err(to_py_error)?;
        to_json(&submitted, "적재 접수 결과")
    }

    /// `pairs_json`은 `[{"question": ..., "answer": ...}]` 형식이다.
    pub fn submit_qa_pairs(
        &self,
        py: Python<'_>,
        owner: &str,
        heading: &str,
        pairs_json: &str,
    ) -> PyResult<String> {
        let pairs: Vec<QaPair> = serde_json::from_str(pairs_json).map_err(|error| {
            PyValueError::new_err(format!("Q&A JSON 파싱에 실패했습니다: {}", error))
        })?;
        let submitted = py
            .detach(|| {
                self.runtime
                    .block_on(self.context.ingestion().submit_qa_pairs(owner, heading, &pairs))
            })
            .map_err(to_py_error)?;
        to_json(&submitted, "적재 접수 결과")
    }

    pub fn list_documents(&self, py: Python<'_>, owner: &str) -> PyResult<String> {
        let documents = py
            .detach(|| {
                self.runtime
                    .block_on(self.context.ingestion().list_documents(owner))
            })
            .map_err(to_py_error)?;
        to_json(&documents, "문서 목록")
    }

    /// 삭제된 청크 수를 반환한다.
    pub fn delete_document(&self, py: Python<'_>, document_id: &str, owner: &str) -> PyResult<u64> {
        let document_id = parse_uuid(document_id, "document_id")?;
        py.detach(|| {
            self.runtime
                .block_on(self.context.ingestion().delete_document(document_id, owner))
        })
        .map_err(to_py_error)
    }

    pub fn push(&self, py: Python<'_>, task_type: &str, payload_json: &str) -> PyResult<String> {
        let payload: Value = serde_json::from_str(payload_json).map_err(|error| {
            PyValueError::new_err(format!("작업 페이로드 JSON 파싱에 실패했습니다: {}", error))
        })?;
        let task = py
            .detach(|| self.runtime.block_on(self.context.queue().push(task_type, payload)))
            .map_err(to_py_error)?;
        to_json(&task, "작업")
    }

    /// 대기 작업이 없으면 `None`.
    pub fn claim(&self, py: Python<'_>, worker_id: &str) -> PyResult<Option<String>> {
        let claimed = py
            .detach(|| self.runtime.block_on(self.context.queue().claim(worker_id)))
            .map_err(to_py_error)?;
        claimed.map(|task| to_json(&task, "작업")).transpose()
    }

    /// `error`가 주어지면 failed, 아니면 completed로 종료한다.
    #[pyo3(signature = (task_id, worker_id, error=None))]
    pub fn complete(
        &self,
        py: Python<'_>,
        task_id: &str,
        worker_id: &str,
        error: Option<String>,
    ) -> PyResult<()> {
        let task_id = parse_uuid(task_id, "task_id")?;
        let outcome = match error {
            Some(message) => TaskOutcome::Failed(message),
            None => TaskOutcome::Completed,
        };
        py.detach(|| {
            self.runtime
                .block_on(self.context.queue().complete(task_id, worker_id, outcome))
        })
        .map_err(to_py_error)
    }

    pub fn get(&self, py: Python<'_>, task_id: &str) -> PyResult<Option<String>> {
        let task_id = parse_uuid(task_id, "task_id")?;
        let task = py
            .detach(|| self.runtime.block_on(self.context.queue().get(task_id)))
            .map_err(to_py_error)?;
        task.map(|task| to_json(&task, "작업")).transpose()
    }
}
