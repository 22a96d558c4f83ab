// 목적:
// - SQL 관련 공통 유틸리티를 제공한다.
//
// 설명:
// - 동적 테이블명 검증, pgvector 리터럴 변환, 스키마 DDL 생성을 담당한다.
//
// 디자인 패턴:
// - 가드 함수(Guard Function).
//
// 참조:
// - src_rs/index/postgres_repo.rs
// - src_rs/index/task_repo.rs

use crate::core::config::PostgresConfig;
use crate::core::errors::{CoreError, CoreResult};

/// 테이블 식별자의 허용 문자를 검증한다.
pub fn validate_identifier(value: &str, field_name: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidConfig(format!(
            "{}는 비어 있을 수 없습니다",
            field_name
        )));
    }

    let valid = value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');

    if !valid {
        return Err(CoreError::InvalidConfig(format!(
            "{}에는 영문/숫자/밑줄만 사용할 수 있습니다: {}",
            field_name, value
        )));
    }

    Ok(())
}

/// float 벡터를 pgvector 문자열 리터럴로 변환한다.
pub fn to_pgvector_literal(values: &[f32]) -> CoreResult<String> {
    if values.is_empty() {
        return Err(CoreError::InvalidInput(
            "벡터는 최소 1개 이상의 값을 가져야 합니다".to_string(),
        ));
    }

    if values.iter().any(|value| !value.is_finite()) {
        return Err(CoreError::InvalidInput(
            "벡터에 유한하지 않은 값이 있습니다".to_string(),
        ));
    }

    let parts = values
        .iter()
        .map(|value| format!("{:.8}", value))
        .collect::<Vec<_>>();

    Ok(format!("[{}]", parts.join(",")))
}

/// 코퍼스/문서/작업/블롭 테이블 생성 DDL. 모두 IF NOT EXISTS로 작성한다.
pub fn schema_statements(config: &PostgresConfig) -> Vec<String> {
    let chunks = &config.chunk_table;
    let documents = &config.document_table;
    let tasks = &config.task_table;
    let blobs = &config.blob_table;
    let ts_config = &config.text_search_config;

    vec![
        "CREATE EXTENSION IF NOT EXISTS vector".to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS {chunks} (\
             chunk_id UUID PRIMARY KEY, \
             document_id TEXT NOT NULL, \
             owner TEXT NOT NULL, \
             chunk_index INTEGER NOT NULL, \
             content TEXT NOT NULL, \
             embedding vector NOT NULL, \
             metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb, \
             created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        ),
        format!("CREATE INDEX IF NOT EXISTS {chunks}_owner_idx ON {chunks} (owner)"),
        format!("CREATE INDEX IF NOT EXISTS {chunks}_document_idx ON {chunks} (document_id)"),
        format!(
            "CREATE INDEX IF NOT EXISTS {chunks}_content_fts_idx ON {chunks} \
             USING GIN (to_tsvector('{ts_config}'::regconfig, content))"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {documents} (\
             id UUID PRIMARY KEY, \
             owner TEXT NOT NULL, \
             filename TEXT NOT NULL, \
             blob_handle TEXT NOT NULL, \
             file_size BIGINT NOT NULL, \
             content_type TEXT NOT NULL, \
             status TEXT NOT NULL, \
             error_message TEXT, \
             created_at TIMESTAMPTZ NOT NULL)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {documents}_owner_idx ON {documents} (owner, created_at DESC)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {tasks} (\
             id UUID PRIMARY KEY, \
             seq BIGSERIAL NOT NULL, \
             task_type TEXT NOT NULL, \
             payload JSONB NOT NULL, \
             status TEXT NOT NULL, \
             worker_id TEXT, \
             created_at TIMESTAMPTZ NOT NULL, \
             started_at TIMESTAMPTZ, \
             completed_at TIMESTAMPTZ, \
             error_message TEXT)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {tasks}_claim_idx ON {tasks} (status, created_at, seq)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {blobs} (\
             handle UUID PRIMARY KEY, \
             filename TEXT NOT NULL, \
             content BYTEA NOT NULL, \
             created_at TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        ),
    ]
}
