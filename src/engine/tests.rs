use super::*;
use crate::{Category, Segment};
use std::sync::RwLock;
use std::thread;

fn graph_of(categories: Vec<Category>) -> Graph {
    let mut graph = Graph::new("test");
    for category in categories {
        graph.insert(category);
    }
    graph
}

fn matched<'g>(graph: &'g Graph, input: &str, that: &str, topic: &str) -> Option<&'g str> {
    let split = |s: &str| s.split_whitespace().map(str::to_string).collect::<Vec<_>>();
    graph.match_tokens(&split(input), &split(that), &split(topic)).map(|m| m.template())
}

#[test]
fn insert_is_idempotent() {
    let mut graph = Graph::new("test");
    let first = graph.insert(category!(pattern: "HELLO *", template: "one"));
    let nodes = graph.node_count();
    let second = graph.insert(category!(pattern: "hello  *", template: "two"));

    assert_eq!(first, second);
    assert_eq!(graph.node_count(), nodes);
    assert_eq!(graph.len(), 1);
    assert_eq!(matched(&graph, "HELLO WORLD", "", ""), Some("two"));
}

#[test]
fn distinct_keys_get_distinct_leaves() {
    let mut graph = Graph::new("test");
    let a = graph.insert(category!(pattern: "HELLO", template: "a"));
    let b = graph.insert(category!(pattern: "HELLO", that: "HI", template: "b"));
    let c = graph.insert(category!(pattern: "HELLO", topic: "FOOD", template: "c"));
    let d = graph.insert(category!(pattern: "HELLO _", template: "d"));

    let leaves = [a, b, c, d];
    for (i, x) in leaves.iter().enumerate() {
        for y in &leaves[i + 1..] {
            assert_ne!(x, y);
        }
    }
    assert_eq!(graph.len(), 4);
}

#[test]
fn literal_beats_wildcard() {
    let graph = graph_of(vec![
        category!(pattern: "*", template: "catch-all"),
        category!(pattern: "HELLO", template: "greeting"),
    ]);

    assert_eq!(matched(&graph, "HELLO", "", ""), Some("greeting"));
    assert_eq!(matched(&graph, "GOODBYE", "", ""), Some("catch-all"));
    assert_eq!(matched(&graph, "HELLO THERE", "", ""), Some("catch-all"));
}

#[test]
fn literal_prefix_beats_leading_wildcard() {
    let graph = graph_of(vec![
        category!(pattern: "* FOO", template: "star"),
        category!(pattern: "A B FOO", template: "literal"),
    ]);

    assert_eq!(matched(&graph, "A B FOO", "", ""), Some("literal"));
    assert_eq!(matched(&graph, "X FOO", "", ""), Some("star"));
    assert_eq!(matched(&graph, "A C FOO", "", ""), Some("star"));
}

#[test]
fn underscore_beats_star() {
    let graph = graph_of(vec![
        category!(pattern: "HELLO *", template: "star"),
        category!(pattern: "HELLO _", template: "underscore"),
    ]);

    assert_eq!(matched(&graph, "HELLO YOU", "", ""), Some("underscore"));
    assert_eq!(matched(&graph, "HELLO YOU THERE", "", ""), Some("star"));
}

#[test]
fn wildcards_need_at_least_one_token() {
    let graph = graph_of(vec![category!(pattern: "HELLO *", template: "")]);
    assert!(matched(&graph, "HELLO", "", "").is_none());
}

#[test]
fn no_match_without_catch_all() {
    let graph = graph_of(vec![category!(pattern: "HELLO", template: "")]);
    assert!(matched(&graph, "GOODBYE", "", "").is_none());
    assert!(matched(&graph, "", "", "").is_none());
    assert!(Graph::new("empty").match_tokens::<&str>(&["HELLO"], &[], &[]).is_none());
}

#[test]
fn star_captures_shortest_first() {
    let graph = graph_of(vec![category!(pattern: "* AND *", template: "")]);
    let m = graph.match_tokens(&["A", "AND", "B", "AND", "C"], &[], &[]).unwrap();
    assert_eq!(m.stars(Segment::Input), vec!["A", "B AND C"]);
    assert_eq!(m.captures[1].start, 2);
    assert_eq!(m.captures[1].end, 5);
}

#[test]
fn specific_that_beats_shortcut() {
    let graph = graph_of(vec![
        category!(pattern: "YES", template: "plain yes"),
        category!(pattern: "YES", that: "DO YOU LIKE CATS", template: "cat lover"),
    ]);

    assert_eq!(matched(&graph, "YES", "DO YOU LIKE CATS", ""), Some("cat lover"));
    assert_eq!(matched(&graph, "YES", "ARE YOU SURE", ""), Some("plain yes"));
    assert_eq!(matched(&graph, "YES", "", ""), Some("plain yes"));
}

#[test]
fn shortcut_leaf_captures_whole_context() {
    let graph = graph_of(vec![category!(pattern: "YES", template: "")]);
    let m = graph.match_tokens(&["YES"], &["ARE", "YOU", "SURE"], &[]).unwrap();
    assert_eq!(m.star(Segment::That, 1), Some("ARE YOU SURE"));
    assert_eq!(m.star(Segment::Topic, 1), Some("UNKNOWN"));
}

#[test]
fn topic_filters_matches() {
    let graph = graph_of(vec![
        category!(pattern: "WHAT IS IT", topic: "FOOD", template: "food"),
        category!(pattern: "WHAT IS IT", template: "anything"),
    ]);

    assert_eq!(matched(&graph, "WHAT IS IT", "", "FOOD"), Some("food"));
    assert_eq!(matched(&graph, "WHAT IS IT", "", "CARS"), Some("anything"));
}

#[test]
fn literal_branch_backtracks_into_wildcard() {
    let graph = graph_of(vec![
        category!(pattern: "A B C", that: "NEVER", template: "dead end"),
        category!(pattern: "A *", template: "fallback"),
    ]);
    assert_eq!(matched(&graph, "A B C", "", ""), Some("fallback"));
}

#[test]
fn match_increments_activations() {
    let graph = graph_of(vec![category!(pattern: "HELLO", template: "")]);
    for _ in 0..3 {
        graph.match_tokens(&["HELLO"], &[], &[]);
    }
    graph.match_tokens(&["NOPE"], &[], &[]);
    let category = graph.categories().next().unwrap();
    assert_eq!(category.activations(), 3);
}

#[test]
fn step_budget_degrades_to_no_match() {
    let mut graph = Graph::with_config(
        "tight",
        crate::MatchingConfig { step_budget: 10, ..crate::MatchingConfig::default() },
    );
    graph.insert(category!(pattern: "* * * * Z", template: ""));

    let input: Vec<String> = (0..12).map(|i| format!("W{i}")).collect();
    let details = graph.match_with_metrics(&input, &[], &[]);
    assert!(details.result.is_none());
    assert!(details.metrics.budget_exhausted);
}

#[test]
fn memo_keeps_nested_stars_tractable() {
    let graph = graph_of(vec![category!(pattern: "* * * * * * Z", template: "")]);
    let input: Vec<String> = (0..40).map(|i| format!("W{i}")).collect();

    let details = graph.match_with_metrics(&input, &[], &[]);
    assert!(details.result.is_none());
    assert!(!details.metrics.budget_exhausted);
    assert!(details.metrics.memo_hits > 0);
}

#[test]
fn graph_is_shareable_across_threads() {
    let graph = RwLock::new(graph_of(vec![category!(pattern: "HELLO *", template: "hi")]));

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let guard = graph.read().unwrap();
                for _ in 0..25 {
                    assert!(guard.match_tokens(&["HELLO", "YOU"], &[], &[]).is_some());
                }
            });
        }
    });

    graph.write().unwrap().insert(category!(pattern: "BYE", template: "bye"));
    let guard = graph.read().unwrap();
    assert_eq!(guard.categories().next().unwrap().activations(), 100);
    assert_eq!(guard.len(), 2);
}

#[test]
fn tokenizer_feeds_matcher() {
    let vocabulary = crate::Vocabulary::with_builtins();
    let tokenizer = Tokenizer::new(&vocabulary, &crate::TokenizerConfig::default());
    let graph = graph_of(vec![category!(pattern: "MY NAME IS *", template: "")]);

    let input = tokenizer.tokenize("my name   is Ada");
    let m = graph.match_tokens(&input, &[], &[]).unwrap();
    assert_eq!(m.star(Segment::Input, 1), Some("ADA"));
}
