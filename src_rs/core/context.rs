// 목적:
// - 설정으로부터 저장소/제공자/서비스를 한 번에 구성하는 애플리케이션 컨텍스트를 제공한다.
//
// 설명:
// - 커넥션 풀과 HTTP 클라이언트는 여기서 한 번 생성되어 모든 서비스가 공유한다.
// - 전역 싱글턴을 두지 않으며, 호출자가 컨텍스트 값을 소유하고 종료 시 close를 호출한다.
//
// 디자인 패턴:
// - 컴포지션 루트(Composition Root).
//
// 참조:
// - src_rs/core/config.rs
// - src_rs/index/postgres_repo.rs
// - src_rs/bin/worker.rs

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::core::answer::AnswerService;
use crate::core::chunker::FixedWindowChunker;
use crate::core::config::AppConfig;
use crate::core::errors::CoreResult;
use crate::core::ingestion_pipeline::{IngestionService, IngestionTaskHandler, INGESTION_TASK_TYPE};
use crate::core::ports::Embedder;
use crate::core::queue::TaskQueue;
use crate::core::search_pipeline::SearchRouter;
use crate::core::worker::Worker;
use crate::index::blob_repo::PostgresBlobStore;
use crate::index::postgres_repo::{connect_pool, PostgresRepository};
use crate::index::task_repo::PostgresTaskStore;
use crate::providers::embedding::HttpEmbedder;
use crate::providers::generation::HttpTextGenerator;
use crate::providers::rerank::HttpRerankProvider;

pub struct AppContext {
    config: AppConfig,
    pool: PgPool,
    answers: AnswerService,
    queue: TaskQueue,
    ingestion: IngestionService,
    ingestion_handler: Arc<IngestionTaskHandler>,
}

impl AppContext {
    pub async fn connect(config: AppConfig) -> CoreResult<Self> {
        let embedder = Arc::new(HttpEmbedder::new(config.embedding.clone())?);
        Self::connect_with_embedder(config, embedder).await
    }

    /// HTTP 임베딩 대신 주어진 임베더를 사용한다.
    /// 로컬 모델처럼 블로킹 구현은 `OffloadedEmbedder`로 감싸서 넘긴다.
    pub async fn connect_with_embedder(
        config: AppConfig,
        embedder: Arc<dyn Embedder>,
    ) -> CoreResult<Self> {
        config.validate()?;

        let pool = connect_pool(&config.postgres).await?;
        let repository = Arc::new(PostgresRepository::from_pool(pool.clone(), &config.postgres)?);
        let tasks = Arc::new(PostgresTaskStore::from_pool(pool.clone(), &config.postgres)?);
        let blobs = Arc::new(PostgresBlobStore::from_pool(pool.clone(), &config.postgres)?);

        let generator = Arc::new(HttpTextGenerator::new(config.generation.clone())?);

        let mut router = SearchRouter::new(
            repository.clone(),
            embedder.clone(),
            generator.clone(),
            config.search.clone(),
        )?;
        if let Some(rerank) = config.rerank.clone() {
            router = router.with_reranker(Arc::new(HttpRerankProvider::new(rerank)?));
        }

        let answers = AnswerService::new(router, generator);
        let queue = TaskQueue::new(tasks).with_lease(config.queue.lease())?;
        let ingestion = IngestionService::new(
            blobs.clone(),
            repository.clone(),
            repository.clone(),
            queue.clone(),
        );
        let ingestion_handler = Arc::new(IngestionTaskHandler::new(
            blobs,
            repository.clone(),
            repository,
            embedder,
            Arc::new(FixedWindowChunker::from_config(&config.ingestion)),
        ));

        info!(
            reranker = config.rerank.is_some(),
            lease_ms = ?config.queue.lease_ms,
            "애플리케이션 컨텍스트 구성 완료"
        );

        Ok(Self {
            config,
            pool,
            answers,
            queue,
            ingestion,
            ingestion_handler,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> &SearchRouter {
        self.answers.router()
    }

    pub fn answers(&self) -> &AnswerService {
        &self.answers
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn ingestion(&self) -> &IngestionService {
        &self.ingestion
    }

    /// 적재 핸들러가 등록된 워커를 만든다.
    pub fn worker(&self) -> CoreResult<Worker> {
        Ok(Worker::new(self.queue.clone(), &self.config.worker)?
            .register(INGESTION_TASK_TYPE, self.ingestion_handler.clone()))
    }

    pub async fn close(self) {
        self.pool.close().await;
        info!("애플리케이션 컨텍스트 종료");
    }
}
