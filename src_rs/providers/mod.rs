// 목적:
// - 외부 제공자(임베딩/재정렬/생성) 어댑터 모듈을 선언한다.
//
// 설명:
// - HTTP 공통 처리와 제공자별 요청/응답 해석을 분리한다.
//
// 디자인 패턴:
// - 모듈 분리(Module Separation).
//
// 참조:
// - src_rs/providers/http.rs

pub mod blocking;
pub mod embedding;
pub mod generation;
pub mod http;
pub mod rerank;
