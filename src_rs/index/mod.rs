// 목적:
// - 저장소 계층 모듈을 선언한다.
//
// 설명:
// - SQL 유틸, PostgreSQL 저장소(코퍼스/문서/작업/블롭), 프로세스 내부 작업 큐를 분리한다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern).
//
// 참조:
// - src_rs/index/sql.rs
// - src_rs/index/postgres_repo.rs
// - src_rs/index/task_repo.rs

pub mod blob_repo;
pub mod memory_queue;
pub mod postgres_repo;
pub mod sql;
pub mod task_repo;
