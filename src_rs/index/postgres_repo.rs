// 목적:
// - PostgreSQL(pgvector) 기반 코퍼스 저장소와 문서 카탈로그를 제공한다.
//
// 설명:
// - 유사도 검색(코사인 거리)과 전문 검색(tsvector)을 제공하며, 두 검색 모두 owner 동등 필터를 적용한다.
// - 청크 일괄 삽입은 트랜잭션 안에서 다중 VALUES로 수행하고, 삭제는 document_id 필터로 수행한다.
// - 테이블명은 설정 검증 단계에서 확인된 값만 사용한다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern).
//
// 참조:
// - src_rs/index/sql.rs
// - src_rs/core/ports.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::config::PostgresConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::model::{
    ChunkRecord, CorpusScope, DocumentRecord, DocumentStatus, RankedList, RetrievalItem,
};
use crate::core::ports::{CorpusStore, DocumentCatalog};
use crate::index::sql::{schema_statements, to_pgvector_literal};

// 바인드 파라미터 상한(65535)을 넘지 않도록 한 번에 삽입하는 청크 수를 제한한다.
const INSERT_BATCH_ROWS: usize = 1_000;

/// 프로세스 전체에서 공유할 커넥션 풀을 생성한다.
pub async fn connect_pool(config: &PostgresConfig) -> CoreResult<PgPool> {
    config.validate()?;

    let options = config
        .dsn
        .parse::<PgConnectOptions>()
        .map_err(|error| CoreError::InvalidConfig(format!("postgres.dsn 파싱 실패: {}", error)))?
        .options([(
            "statement_timeout",
            config.statement_timeout_ms.max(1).to_string(),
        )]);

    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min)
        .max_connections(config.pool_max.max(config.pool_min))
        .acquire_timeout(Duration::from_millis(config.connect_timeout_ms.max(1)))
        .connect_with(options)
        .await
        .map_err(|error| CoreError::Db(format!("Postgres 연결 실패: {}", error)))?;

    if config.ensure_schema {
        ensure_schema(&pool, config).await?;
    }

    info!(pool_max = config.pool_max, "Postgres 풀 생성 완료");
    Ok(pool)
}

pub async fn ensure_schema(pool: &PgPool, config: &PostgresConfig) -> CoreResult<()> {
    for statement in schema_statements(config) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|error| CoreError::Db(format!("스키마 생성 실패: {}, sql={}", error, statement)))?;
    }
    debug!("스키마 확인 완료");
    Ok(())
}

#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
    chunk_table: String,
    document_table: String,
    text_search_config: String,
}

impl PostgresRepository {
    pub fn from_pool(pool: PgPool, config: &PostgresConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            chunk_table: config.chunk_table.clone(),
            document_table: config.document_table.clone(),
            text_search_config: config.text_search_config.clone(),
        })
    }
}

#[async_trait]
impl CorpusStore for PostgresRepository {
    async fn similarity_search(
        &self,
        embedding: &[f32],
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList> {
        let vector_literal = to_pgvector_literal(embedding)?;
        let sql = format!(
            "SELECT chunk_id::text AS chunk_id, document_id, content, metadata, \
             (1 - (embedding <=> $1::vector))::float8 AS score \
             FROM {} WHERE ($2::text IS NULL OR owner = $2) \
             ORDER BY embedding <=> $1::vector LIMIT $3",
            self.chunk_table
        );

        let rows = sqlx::query(&sql)
            .bind(vector_literal)
            .bind(scope.owner())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("유사도 검색 실패: {}", error)))?;

        rows.into_iter()
            .map(map_chunk_row)
            .collect::<CoreResult<Vec<_>>>()
    }

    async fn text_search(
        &self,
        query: &str,
        scope: &CorpusScope,
        limit: usize,
    ) -> CoreResult<RankedList> {
        let sql = format!(
            "SELECT chunk_id::text AS chunk_id, document_id, content, metadata, \
             ts_rank_cd(to_tsvector('{cfg}'::regconfig, content), \
                        plainto_tsquery('{cfg}'::regconfig, $1))::float8 AS score \
             FROM {table} \
             WHERE to_tsvector('{cfg}'::regconfig, content) @@ plainto_tsquery('{cfg}'::regconfig, $1) \
               AND ($2::text IS NULL OR owner = $2) \
             ORDER BY score DESC, chunk_id LIMIT $3",
            cfg = self.text_search_config,
            table = self.chunk_table
        );

        let rows = sqlx::query(&sql)
            .bind(query)
            .bind(scope.owner())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("전문 검색 실패: {}", error)))?;

        rows.into_iter()
            .map(map_chunk_row)
            .collect::<CoreResult<Vec<_>>>()
    }

    async fn insert_chunks(&self, chunks: &[ChunkRecord]) -> CoreResult<u64> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut literals = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            literals.push(to_pgvector_literal(&chunk.embedding)?);
        }

        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| CoreError::Db(format!("트랜잭션 시작 실패: {}", error)))?;

        let mut affected = 0u64;
        for (batch, batch_literals) in chunks
            .chunks(INSERT_BATCH_ROWS)
            .zip(literals.chunks(INSERT_BATCH_ROWS))
        {
            let mut builder = QueryBuilder::<Postgres>::new(format!(
                "INSERT INTO {} (chunk_id, document_id, owner, chunk_index, content, embedding, metadata) ",
                self.chunk_table
            ));
            builder.push_values(batch.iter().zip(batch_literals), |mut row, (chunk, literal)| {
                row.push_bind(chunk.chunk_id)
                    .push_bind(chunk.document_id.clone())
                    .push_bind(chunk.owner.clone())
                    .push_bind(chunk.chunk_index)
                    .push_bind(chunk.content.clone())
                    .push_bind(literal.clone())
                    .push_unseparated("::vector")
                    .push_bind(chunk.metadata.clone());
            });

            let result = builder
                .build()
                .execute(&mut *transaction)
                .await
                .map_err(|error| CoreError::Db(format!("청크 일괄 삽입 실패: {}", error)))?;
            affected = affected.saturating_add(result.rows_affected());
        }

        transaction
            .commit()
            .await
            .map_err(|error| CoreError::Db(format!("트랜잭션 커밋 실패: {}", error)))?;

        Ok(affected)
    }

    async fn delete_chunks_by_document(&self, document_id: &str) -> CoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE document_id = $1", self.chunk_table);

        let result = sqlx::query(&sql)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("청크 삭제 실패: {}", error)))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl DocumentCatalog for PostgresRepository {
    async fn insert_document(&self, document: &DocumentRecord) -> CoreResult<()> {
        let sql = format!(
            "INSERT INTO {} \
             (id, owner, filename, blob_handle, file_size, content_type, status, error_message, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            self.document_table
        );

        sqlx::query(&sql)
            .bind(document.id)
            .bind(&document.owner)
            .bind(&document.filename)
            .bind(&document.blob_handle)
            .bind(document.file_size)
            .bind(&document.content_type)
            .bind(document.status.as_str())
            .bind(&document.error_message)
            .bind(document.created_at)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("문서 등록 실패: {}", error)))?;

        Ok(())
    }

    async fn get_document(&self, document_id: Uuid) -> CoreResult<Option<DocumentRecord>> {
        let sql = format!(
            "SELECT id, owner, filename, blob_handle, file_size, content_type, status, error_message, created_at \
             FROM {} WHERE id = $1",
            self.document_table
        );

        let row = sqlx::query(&sql)
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("문서 조회 실패: {}", error)))?;

        row.map(map_document_row).transpose()
    }

    async fn update_document_status(
        &self,
        document_id: Uuid,
        status: DocumentStatus,
        error_message: Option<&str>,
    ) -> CoreResult<()> {
        let sql = format!(
            "UPDATE {} SET status = $2, error_message = $3 WHERE id = $1",
            self.document_table
        );

        sqlx::query(&sql)
            .bind(document_id)
            .bind(status.as_str())
            .bind(error_message)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("문서 상태 갱신 실패: {}", error)))?;

        Ok(())
    }

    async fn list_documents(&self, owner: &str) -> CoreResult<Vec<DocumentRecord>> {
        let sql = format!(
            "SELECT id, owner, filename, blob_handle, file_size, content_type, status, error_message, created_at \
             FROM {} WHERE owner = $1 ORDER BY created_at DESC",
            self.document_table
        );

        let rows = sqlx::query(&sql)
            .bind(owner)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("문서 목록 조회 실패: {}", error)))?;

        rows.into_iter()
            .map(map_document_row)
            .collect::<CoreResult<Vec<_>>>()
    }

    async fn delete_document(&self, document_id: Uuid) -> CoreResult<u64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.document_table);

        let result = sqlx::query(&sql)
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("문서 삭제 실패: {}", error)))?;

        Ok(result.rows_affected())
    }
}

fn map_chunk_row(row: PgRow) -> CoreResult<RetrievalItem> {
    let id = row
        .try_get::<String, _>("chunk_id")
        .map_err(|error| CoreError::Db(format!("chunk.chunk_id 파싱 실패: {}", error)))?;
    let source_document_id = row
        .try_get::<String, _>("document_id")
        .map_err(|error| CoreError::Db(format!("chunk.document_id 파싱 실패: {}", error)))?;
    let content = row
        .try_get::<String, _>("content")
        .map_err(|error| CoreError::Db(format!("chunk.content 파싱 실패: {}", error)))?;
    let attributes = row
        .try_get::<Value, _>("metadata")
        .map_err(|error| CoreError::Db(format!("chunk.metadata 파싱 실패: {}", error)))?;
    let relevance_score = row
        .try_get::<f64, _>("score")
        .map_err(|error| CoreError::Db(format!("chunk.score 파싱 실패: {}", error)))?;

    Ok(RetrievalItem {
        id,
        source_document_id,
        content,
        relevance_score,
        attributes,
    })
}

fn map_document_row(row: PgRow) -> CoreResult<DocumentRecord> {
    let status = row
        .try_get::<String, _>("status")
        .map_err(|error| CoreError::Db(format!("document.status 파싱 실패: {}", error)))?;

    Ok(DocumentRecord {
        id: row
            .try_get::<Uuid, _>("id")
            .map_err(|error| CoreError::Db(format!("document.id 파싱 실패: {}", error)))?,
        owner: row
            .try_get::<String, _>("owner")
            .map_err(|error| CoreError::Db(format!("document.owner 파싱 실패: {}", error)))?,
        filename: row
            .try_get::<String, _>("filename")
            .map_err(|error| CoreError::Db(format!("document.filename 파싱 실패: {}", error)))?,
        blob_handle: row
            .try_get::<String, _>("blob_handle")
            .map_err(|error| CoreError::Db(format!("document.blob_handle 파싱 실패: {}", error)))?,
        file_size: row
            .try_get::<i64, _>("file_size")
            .map_err(|error| CoreError::Db(format!("document.file_size 파싱 실패: {}", error)))?,
        content_type: row
            .try_get::<String, _>("content_type")
            .map_err(|error| CoreError::Db(format!("document.content_type 파싱 실패: {}", error)))?,
        status: DocumentStatus::parse(&status)?,
        error_message: row
            .try_get::<Option<String>, _>("error_message")
            .map_err(|error| CoreError::Db(format!("document.error_message 파싱 실패: {}", error)))?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|error| CoreError::Db(format!("document.created_at 파싱 실패: {}", error)))?,
    })
}
