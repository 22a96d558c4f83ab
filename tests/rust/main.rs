// 목적:
// - Rust 통합 테스트 진입점을 제공한다.
//
// 설명:
// - 외부 서비스 없이 가짜 저장소/제공자로 검색 라우팅, 융합, 작업 큐, 워커, 적재 흐름을 검증한다.
//
// 참조:
// - tests/rust/support.rs

mod answer_test;
mod fusion_test;
mod ingestion_test;
mod queue_test;
mod search_test;
mod worker_test;
