use std::collections::HashSet;

use nova_core::{TextRange, TextSize};
use nova_ide::{rank, CompletionKind, Proposal};
use proptest::prelude::*;

fn kind() -> impl Strategy<Value = CompletionKind> {
    prop_oneof![
        Just(CompletionKind::Keyword),
        Just(CompletionKind::TypeRef),
        Just(CompletionKind::FieldRef),
        Just(CompletionKind::MethodRef),
    ]
}

prop_compose! {
    fn proposal()(
        kind in kind(),
        name in "[a-c]{1,2}",
        signature in proptest::option::of("[IJV]"),
        relevance in 0i32..80,
    ) -> Proposal {
        Proposal {
            kind,
            completion: name.clone(),
            name,
            declaration_signature: None,
            signature,
            parameter_names: None,
            relevance,
            replace_range: TextRange::empty(TextSize::from(0)),
        }
    }
}

fn key(p: &Proposal) -> (CompletionKind, String, Option<String>, Option<String>) {
    (
        p.kind,
        p.name.clone(),
        p.declaration_signature.clone(),
        p.signature.clone(),
    )
}

proptest! {
    #[test]
    fn ranked_output_is_sorted_and_unique(proposals in proptest::collection::vec(proposal(), 0..40)) {
        let ranked = rank(proposals.clone());

        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.relevance > b.relevance || (a.relevance == b.relevance && a.name <= b.name),
                "{a} before {b}"
            );
        }

        let mut keys = HashSet::new();
        for p in &ranked {
            prop_assert!(keys.insert(key(p)), "duplicate {p}");
        }

        // Every distinct input survives with its best relevance.
        let distinct: HashSet<_> = proposals.iter().map(key).collect();
        prop_assert_eq!(distinct.len(), ranked.len());
        for p in &ranked {
            let best = proposals
                .iter()
                .filter(|q| key(q) == key(p))
                .map(|q| q.relevance)
                .max();
            prop_assert_eq!(best, Some(p.relevance));
        }
    }

    #[test]
    fn ranking_is_idempotent(proposals in proptest::collection::vec(proposal(), 0..40)) {
        let once = rank(proposals);
        let twice = rank(once.clone());
        prop_assert_eq!(once, twice);
    }
}
