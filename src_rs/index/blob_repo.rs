// 목적:
// - 업로드 원본 파일을 PostgreSQL bytea 테이블에 보관한다.
//
// 설명:
// - 핸들은 UUID 문자열이며, 문서 카탈로그의 blob_handle에 그대로 저장된다.
//
// 디자인 패턴:
// - 저장소 패턴(Repository Pattern).
//
// 참조:
// - src_rs/core/ingestion_pipeline.rs

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::core::config::PostgresConfig;
use crate::core::errors::{CoreError, CoreResult};
use crate::core::ports::BlobStore;

#[derive(Clone)]
pub struct PostgresBlobStore {
    pool: PgPool,
    blob_table: String,
}

impl PostgresBlobStore {
    pub fn from_pool(pool: PgPool, config: &PostgresConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            blob_table: config.blob_table.clone(),
        })
    }
}

fn parse_handle(handle: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(handle.trim())
        .map_err(|error| CoreError::InvalidInput(format!("blob 핸들 형식 오류: {}", error)))
}

#[async_trait]
impl BlobStore for PostgresBlobStore {
    async fn upload(&self, filename: &str, content: &[u8]) -> CoreResult<String> {
        let handle = Uuid::new_v4();
        let sql = format!(
            "INSERT INTO {} (handle, filename, content) VALUES ($1, $2, $3)",
            self.blob_table
        );

        sqlx::query(&sql)
            .bind(handle)
            .bind(filename)
            .bind(content)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("blob 업로드 실패: {}", error)))?;

        Ok(handle.to_string())
    }

    async fn download(&self, handle: &str) -> CoreResult<Vec<u8>> {
        let handle = parse_handle(handle)?;
        let sql = format!("SELECT content FROM {} WHERE handle = $1", self.blob_table);

        let row = sqlx::query(&sql)
            .bind(handle)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("blob 다운로드 실패: {}", error)))?
            .ok_or_else(|| CoreError::InvalidInput(format!("blob을 찾을 수 없습니다: {}", handle)))?;

        row.try_get::<Vec<u8>, _>("content")
            .map_err(|error| CoreError::Db(format!("blob.content 파싱 실패: {}", error)))
    }

    async fn delete(&self, handle: &str) -> CoreResult<()> {
        let handle = parse_handle(handle)?;
        let sql = format!("DELETE FROM {} WHERE handle = $1", self.blob_table);

        sqlx::query(&sql)
            .bind(handle)
            .execute(&self.pool)
            .await
            .map_err(|error| CoreError::Db(format!("blob 삭제 실패: {}", error)))?;

        Ok(())
    }
}
