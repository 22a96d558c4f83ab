use std::collections::BTreeSet;
use std::num::NonZeroU32;

use knowledge_capture::core::fusion::{fuse, FusionEngine};
use knowledge_capture::core::model::RankedList;
use rstest::rstest;

use crate::support::{ids, ranked};

#[test]
fn rank_zero_in_two_lists_scores_one_thirtieth() {
    let fused = FusionEngine::default().fuse(vec![ranked(&["a", "b"]), ranked(&["a", "c"])]);

    assert_eq!(fused[0].id, "a");
    assert_eq!(fused[0].relevance_score, 1.0 / 30.0);
}

#[rstest]
#[case(1)]
#[case(60)]
#[case(1_000)]
fn output_ids_are_exact_union(#[case] k: u32) {
    let lists = vec![
        ranked(&["a", "b", "c"]),
        ranked(&["c", "d"]),
        Vec::new(),
        ranked(&["e", "a"]),
    ];
    let expected = lists
        .iter()
        .flatten()
        .map(|item| item.id.clone())
        .collect::<BTreeSet<_>>();

    let fused = fuse(lists, NonZeroU32::new(k).expect("non-zero k"));

    assert_eq!(fused.len(), expected.len());
    assert_eq!(ids(&fused).into_iter().collect::<BTreeSet<_>>(), expected);
}

#[rstest]
#[case(Vec::new())]
#[case(vec![Vec::new(), Vec::new()])]
fn empty_inputs_fuse_to_empty(#[case] lists: Vec<RankedList>) {
    assert!(FusionEngine::default().fuse(lists).is_empty());
}

#[test]
fn higher_sums_lead_and_ties_keep_first_seen_order() {
    // a와 c는 1/60 + 1/62로 동점, b는 2/61로 근소하게 낮다.
    let fused = FusionEngine::default().fuse(vec![ranked(&["a", "b", "c"]), ranked(&["c", "b", "a"])]);
    assert_eq!(ids(&fused), vec!["a", "c", "b"]);

    let swapped = FusionEngine::default().fuse(vec![ranked(&["y"]), ranked(&["x"])]);
    assert_eq!(ids(&swapped), vec!["y", "x"]);
}

#[test]
fn configured_k_changes_contribution() {
    let engine = FusionEngine::new(1).expect("engine");
    let fused = engine.fuse(vec![ranked(&["a", "b"])]);

    assert_eq!(fused[0].relevance_score, 1.0);
    assert_eq!(fused[1].relevance_score, 0.5);
}
