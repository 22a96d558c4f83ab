// 목적:
// - 핵심 런타임 계층 모듈을 선언한다.
//
// 설명:
// - 검색(라우팅/확장/융합/재정렬), 답변, 적재, 작업 큐/워커를 분리한다.
// - 외부 시스템과의 경계는 ports의 트레이트로만 표현한다.
//
// 디자인 패턴:
// - 명시적 오류 모델(Explicit Error Model) + 포트/어댑터(Ports and Adapters).
//
// 참조:
// - src_rs/core/errors.rs
// - src_rs/core/ports.rs
// - src_rs/core/search_pipeline.rs
// - src_rs/core/ingestion_pipeline.rs

pub mod answer;
pub mod chunker;
pub mod config;
pub mod context;
pub mod errors;
pub mod expansion;
pub mod fusion;
pub mod ingestion_pipeline;
pub mod model;
pub mod ports;
pub mod queue;
pub mod rerank;
pub mod retrievers;
pub mod search_pipeline;
pub mod strategy;
pub mod worker;
