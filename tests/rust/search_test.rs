use std::sync::atomic::Ordering;
use std::sync::Arc;

use knowledge_capture::core::errors::CoreError;
use knowledge_capture::core::expansion::{ExpansionMode, QueryExpander};
use knowledge_capture::core::model::CorpusScope;
use knowledge_capture::core::search_pipeline::{SearchRequest, SearchRouter};
use knowledge_capture::core::strategy::SearchStrategy;
use knowledge_capture::providers::blocking::OffloadedEmbedder;
use rstest::rstest;

use crate::support::{
    ids, ranked, router, search_config, BlockingEchoEmbedder, ScriptedCorpus, ScriptedGenerator,
    ScriptedReranker,
};

fn tenant() -> CorpusScope {
    CorpusScope::tenant("acme")
}

#[tokio::test]
async fn hybrid_returns_vector_only_and_keyword_only_matches() {
    let corpus = Arc::new(
        ScriptedCorpus::new()
            .with_vector("refund policy", ranked(&["semantic"]))
            .with_keyword("refund policy", ranked(&["lexical"])),
    );
    let router = router(corpus, Arc::new(ScriptedGenerator::replying("")));

    let results = router
        .search("refund policy", &tenant(), SearchStrategy::Hybrid, 5)
        .await
        .expect("search");

    assert_eq!(ids(&results), vec!["semantic", "lexical"]);
    assert_eq!(results[0].relevance_score, 1.0 / 60.0);
}

#[tokio::test]
async fn hybrid_absorbs_failed_branch() {
    let corpus = Arc::new(
        ScriptedCorpus::new()
            .with_vector("q", ranked(&["v"]))
            .with_keyword("q", ranked(&["k"])),
    );
    corpus.fail_keyword.store(true, Ordering::SeqCst);
    let router = router(corpus, Arc::new(ScriptedGenerator::replying("")));

    let results = router
        .search("q", &tenant(), SearchStrategy::Hybrid, 5)
        .await
        .expect("search");

    assert_eq!(ids(&results), vec!["v"]);
}

#[rstest]
#[case(SearchStrategy::Keyword)]
#[case(SearchStrategy::Vector)]
#[tokio::test]
async fn single_branch_failure_propagates(#[case] strategy: SearchStrategy) {
    let corpus = Arc::new(ScriptedCorpus::new());
    corpus.fail_keyword.store(true, Ordering::SeqCst);
    corpus.fail_vector.store(true, Ordering::SeqCst);
    let router = router(corpus, Arc::new(ScriptedGenerator::replying("")));

    let result = router.search("q", &tenant(), strategy, 5).await;
    assert!(matches!(result, Err(CoreError::Db(_))));
}

#[tokio::test]
async fn unknown_strategy_falls_back_to_vector() {
    let corpus = Arc::new(
        ScriptedCorpus::new()
            .with_vector("q", ranked(&["v"]))
            .with_keyword("q", ranked(&["k"])),
    );
    let router = router(corpus, Arc::new(ScriptedGenerator::replying("")));

    let request = SearchRequest {
        query: "q".to_string(),
        scope: tenant(),
        strategy: Some("semantic_magic".to_string()),
        limit: None,
    };
    let results = router.execute(&request).await.expect("search");

    assert_eq!(ids(&results), vec!["v"]);
}

#[rstest]
#[case(CorpusScope::tenant("acme"))]
#[case(CorpusScope::AllTenants)]
#[tokio::test]
async fn every_retriever_call_receives_the_scope(#[case] scope: CorpusScope) {
    let corpus = Arc::new(ScriptedCorpus::new());
    let generator = Arc::new(ScriptedGenerator::replying("first angle\nsecond angle"));
    let router = router(corpus.clone(), generator);

    router
        .search("q", &scope, SearchStrategy::MultiQueryHybrid, 5)
        .await
        .expect("search");

    let scopes = corpus.scopes.lock().expect("scopes lock").clone();
    // 원본 + 패러프레이즈 2개, 각 변형마다 vector와 keyword 호출.
    assert_eq!(scopes.len(), 6);
    assert!(scopes.iter().all(|seen| *seen == scope));
}

#[tokio::test]
async fn multi_query_vector_fuses_original_and_two_paraphrases() {
    let corpus = Arc::new(
        ScriptedCorpus::new()
            .with_vector("q", ranked(&["a", "b"]))
            .with_vector("paraphrase one", ranked(&["b", "c"]))
            .with_vector("paraphrase two", ranked(&["d"]))
            .with_vector("paraphrase three", ranked(&["z"])),
    );
    let generator = Arc::new(ScriptedGenerator::replying(
        "1. paraphrase one\n2. paraphrase two\n3. paraphrase three",
    ));
    let router = router(corpus, generator.clone());

    let results = router
        .search("q", &tenant(), SearchStrategy::MultiQueryVector, 10)
        .await
        .expect("search");

    assert_eq!(ids(&results), vec!["b", "a", "d", "c"]);
    assert_eq!(generator.call_count(), 1);
}

#[rstest]
#[case(ExpansionMode::Paraphrase, "")]
#[case(ExpansionMode::Paraphrase, "\n   \n")]
#[case(ExpansionMode::Decompose, "\n   \n")]
#[tokio::test]
async fn blank_expansion_reply_yields_only_the_original_query(
    #[case] mode: ExpansionMode,
    #[case] reply: &str,
) {
    let expander = QueryExpander::new(Arc::new(ScriptedGenerator::replying(reply)));

    let variants = expander.expand("what is x", mode).await;

    assert_eq!(variants, vec!["what is x".to_string()]);
}

#[tokio::test]
async fn paraphrase_echoing_the_query_adds_no_variant() {
    let expander = QueryExpander::new(Arc::new(ScriptedGenerator::replying("what is x\n")));

    let variants = expander
        .expand("what is x", ExpansionMode::Paraphrase)
        .await;

    assert_eq!(variants, vec!["what is x".to_string()]);
}

#[tokio::test]
async fn decompose_failure_degrades_to_original_query() {
    let corpus = Arc::new(
        ScriptedCorpus::new()
            .with_vector("compound question", ranked(&["v"]))
            .with_keyword("compound question", ranked(&["k"])),
    );
    let router = router(corpus, Arc::new(ScriptedGenerator::failing()));

    let results = router
        .search("compound question", &tenant(), SearchStrategy::QueryDecomposeHybrid, 5)
        .await
        .expect("search");

    assert_eq!(ids(&results), vec!["v", "k"]);
}

#[tokio::test]
async fn reranker_sees_overfetched_window_and_reorders() {
    let corpus = Arc::new(
        ScriptedCorpus::new().with_keyword("q", ranked(&["a", "b", "c", "d", "e", "f", "g", "h"])),
    );
    let provider = Arc::new(ScriptedReranker::replying(vec![(7, 0.99), (1, 0.42)]));
    let router = router(corpus, Arc::new(ScriptedGenerator::replying(""))).with_reranker(provider.clone());

    let results = router
        .search("q", &tenant(), SearchStrategy::Keyword, 2)
        .await
        .expect("search");

    assert_eq!(provider.seen_documents.load(Ordering::SeqCst), 8);
    assert_eq!(ids(&results), vec!["h", "b"]);
    assert_eq!(results[0].relevance_score, 0.99);
}

#[tokio::test]
async fn reranker_failure_keeps_pre_rerank_order() {
    let corpus = Arc::new(ScriptedCorpus::new().with_keyword("q", ranked(&["a", "b", "c"])));
    let router = router(corpus, Arc::new(ScriptedGenerator::replying("")))
        .with_reranker(Arc::new(ScriptedReranker::failing()));

    let results = router
        .search("q", &tenant(), SearchStrategy::Keyword, 2)
        .await
        .expect("search");

    assert_eq!(ids(&results), vec!["a", "b"]);
}

#[rstest]
#[case("   ", tenant(), 5)]
#[case("q", tenant(), 0)]
#[case("q", CorpusScope::tenant(" "), 5)]
#[tokio::test]
async fn invalid_requests_are_rejected(
    #[case] query: &str,
    #[case] scope: CorpusScope,
    #[case] limit: usize,
) {
    let corpus = Arc::new(ScriptedCorpus::new());
    let router = router(corpus.clone(), Arc::new(ScriptedGenerator::replying("")));

    let result = router.search(query, &scope, SearchStrategy::Hybrid, limit).await;

    assert!(matches!(result, Err(CoreError::InvalidInput(_))));
    assert!(corpus.scopes.lock().expect("scopes lock").is_empty());
}

#[tokio::test]
async fn offloaded_blocking_embedder_serves_vector_search() {
    let corpus = Arc::new(ScriptedCorpus::new().with_vector("local model", ranked(&["x", "y"])));
    let router = SearchRouter::new(
        corpus.clone(),
        Arc::new(OffloadedEmbedder::new(BlockingEchoEmbedder)),
        Arc::new(ScriptedGenerator::replying("")),
        search_config(),
    )
    .expect("router");

    let results = router
        .search("local model", &tenant(), SearchStrategy::Vector, 5)
        .await
        .expect("search");

    assert_eq!(ids(&results), vec!["x", "y"]);
    assert_eq!(corpus.limits.lock().expect("limits lock").len(), 1);
}
