// 목적:
// - Rust 코어 계층의 표준 오류 타입을 정의한다.
//
// 설명:
// - 입력/설정/DB/HTTP/직렬화 오류 외에 큐 정합성 오류와 작업 실행 오류를 구분한다.
// - 검색 분기 실패, 재정렬 실패처럼 흡수되는 오류도 같은 열거형으로 기록한다.
//
// 디자인 패턴:
// - 도메인 오류 열거형(Domain Error Enum).
//
// 참조:
// - src_rs/core/search_pipeline.rs
// - src_rs/core/queue.rs
// - src_rs/core/worker.rs

use thiserror::Error;

/// 코어 계층에서 공통으로 사용하는 오류 열거형이다.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("입력값이 유효하지 않습니다: {0}")]
    InvalidInput(String),
    #[error("설정값이 유효하지 않습니다: {0}")]
    InvalidConfig(String),
    #[error("데이터베이스 작업에 실패했습니다: {0}")]
    Db(String),
    #[error("외부 HTTP 호출에 실패했습니다: {0}")]
    Http(String),
    #[error("직렬화/역직렬화에 실패했습니다: {0}")]
    Serialization(String),
    #[error("작업 큐 상태가 일관되지 않습니다: {0}")]
    QueueConsistency(String),
    #[error("작업 실행에 실패했습니다: {0}")]
    TaskExecution(String),
    #[error("런타임 처리 중 오류가 발생했습니다: {0}")]
    Runtime(String),
}

impl CoreError {
    /// 외부 서비스(DB/HTTP/응답 파싱) 경계에서 발생한 오류인지 판별한다.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            CoreError::Db(_) | CoreError::Http(_) | CoreError::Serialization(_)
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
