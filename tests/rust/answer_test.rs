use std::sync::Arc;

use knowledge_capture::core::answer::{AnswerService, NO_INFORMATION_ANSWER};
use knowledge_capture::core::model::CorpusScope;
use knowledge_capture::core::search_pipeline::SearchRequest;

use crate::support::{ranked, router, ScriptedCorpus, ScriptedGenerator};

fn request(query: &str) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        scope: CorpusScope::tenant("acme"),
        strategy: Some("vector".to_string()),
        limit: None,
    }
}

#[tokio::test]
async fn empty_results_yield_sentinel_without_generation() {
    let generator = Arc::new(ScriptedGenerator::replying("should not be used"));
    let service = AnswerService::new(
        router(Arc::new(ScriptedCorpus::new()), generator.clone()),
        generator.clone(),
    );

    let answer = service.answer(&request("anything")).await.expect("answer");

    assert_eq!(answer.answer, NO_INFORMATION_ANSWER);
    assert!(answer.sources.is_empty());
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn answer_uses_top_results_as_context() {
    let corpus = Arc::new(ScriptedCorpus::new().with_vector("vacation days", ranked(&["a", "b"])));
    let generator = Arc::new(ScriptedGenerator::replying("Twenty days."));
    let service = AnswerService::new(router(corpus, generator.clone()), generator.clone());

    let answer = service
        .answer_query("vacation days", CorpusScope::tenant("acme"), None)
        .await
        .expect("answer");

    assert_eq!(answer.answer, "Twenty days.");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.sources[0].content, "content a");

    let calls = generator.calls.lock().expect("calls lock");
    assert_eq!(calls.len(), 1);
    let prompt = &calls[0][1].content;
    assert!(prompt.contains("Source: content a"));
    assert!(prompt.ends_with("Question: vacation days"));
}

#[tokio::test]
async fn generation_failure_surfaces_as_error() {
    let corpus = Arc::new(ScriptedCorpus::new().with_vector("q", ranked(&["a"])));
    let generator = Arc::new(ScriptedGenerator::failing());
    let service = AnswerService::new(router(corpus, generator.clone()), generator);

    assert!(service.answer(&request("q")).await.is_err());
}
