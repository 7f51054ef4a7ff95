//! Topic normalization: free-text platform tags → canonical kebab-case names.
//!
//! Lookup order for [`normalize`]:
//!
//! 1. exact match in the platform spelling table,
//! 2. case-insensitive match in the same table,
//! 3. algorithmic kebab-casing.
//!
//! Two further tables attach a one-level parent (forming a forest) and a
//! [`Category`] to canonical names. [`build_topic_document`] combines the
//! three with [`crate::identity::topic_id`] into a full [`Topic`].

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use crate::identity;
use crate::models::{Category, Topic};

/// Platform spelling → canonical name. LeetCode spells topics in Title
/// Case, Codeforces in lowercase.
const TOPIC_MAPPING: &[(&str, &str)] = &[
    // LeetCode
    ("Array", "array"),
    ("Hash Table", "hash-table"),
    ("Linked List", "linked-list"),
    ("Math", "math"),
    ("Two Pointers", "two-pointers"),
    ("String", "string"),
    ("Binary Search", "binary-search"),
    ("Divide and Conquer", "divide-and-conquer"),
    ("Dynamic Programming", "dynamic-programming"),
    ("Backtracking", "backtracking"),
    ("Stack", "stack"),
    ("Heap (Priority Queue)", "heap"),
    ("Heap", "heap"),
    ("Priority Queue", "heap"),
    ("Greedy", "greedy"),
    ("Sort", "sorting"),
    ("Sorting", "sorting"),
    ("Bit Manipulation", "bit-manipulation"),
    ("Tree", "tree"),
    ("Depth-First Search", "dfs"),
    ("DFS", "dfs"),
    ("dfs", "dfs"),
    ("Breadth-First Search", "bfs"),
    ("BFS", "bfs"),
    ("bfs", "bfs"),
    ("Union Find", "union-find"),
    ("Graph", "graph"),
    ("Design", "design"),
    ("Topological Sort", "topological-sort"),
    ("Trie", "trie"),
    ("Binary Indexed Tree", "binary-indexed-tree"),
    ("Segment Tree", "segment-tree"),
    ("Binary Search Tree", "binary-search-tree"),
    ("Recursion", "recursion"),
    ("Brainteaser", "brainteaser"),
    ("Memoization", "memoization"),
    ("Queue", "queue"),
    ("Minimax", "minimax"),
    ("Reservoir Sampling", "reservoir-sampling"),
    ("Ordered Set", "ordered-set"),
    ("Monotonic Stack", "monotonic-stack"),
    ("Monotonic Queue", "monotonic-queue"),
    ("Combinatorics", "combinatorics"),
    ("Enumeration", "enumeration"),
    ("Counting", "counting"),
    ("Sliding Window", "sliding-window"),
    ("Geometry", "geometry"),
    ("Simulation", "simulation"),
    ("Prefix Sum", "prefix-sum"),
    ("Hash Function", "hash-function"),
    ("Rolling Hash", "rolling-hash"),
    ("String Matching", "string-matching"),
    ("Matrix", "matrix"),
    ("Number Theory", "number-theory"),
    ("Shortest Path", "shortest-path"),
    ("Biconnected Component", "biconnected-component"),
    ("Strongly Connected Component", "strongly-connected-component"),
    ("Eulerian Circuit", "eulerian-circuit"),
    ("Game Theory", "game-theory"),
    ("Interactive", "interactive"),
    ("Database", "database"),
    ("Shell", "shell"),
    ("Concurrency", "concurrency"),
    ("Probability and Statistics", "probability-statistics"),
    ("Suffix Array", "suffix-array"),
    ("Line Sweep", "line-sweep"),
    ("Data Stream", "data-stream"),
    ("Doubly-Linked List", "doubly-linked-list"),
    ("Radix Sort", "radix-sort"),
    ("Merge Sort", "merge-sort"),
    ("Quickselect", "quickselect"),
    ("Bucket Sort", "bucket-sort"),
    ("Counting Sort", "counting-sort"),
    // Codeforces
    ("dp", "dynamic-programming"),
    ("graphs", "graph"),
    ("trees", "tree"),
    ("strings", "string"),
    ("implementation", "implementation"),
    ("constructive algorithms", "constructive-algorithms"),
    ("number theory", "number-theory"),
    ("data structures", "data-structures"),
    ("sortings", "sorting"),
    ("binary search", "binary-search"),
    ("greedy", "greedy"),
    ("brute force", "brute-force"),
    ("math", "math"),
    ("two pointers", "two-pointers"),
    ("combinatorics", "combinatorics"),
    ("geometry", "geometry"),
    ("bitmasks", "bitmask"),
    ("divide and conquer", "divide-and-conquer"),
    ("games", "game-theory"),
    ("probabilities", "probability-statistics"),
    ("interactive", "interactive"),
    ("hashing", "hash-function"),
    ("string suffix structures", "suffix-array"),
    ("dsu", "union-find"),
    ("shortest paths", "shortest-path"),
    ("fft", "fft"),
    ("flows", "network-flow"),
    ("meet-in-the-middle", "meet-in-the-middle"),
    ("ternary search", "ternary-search"),
    ("expression parsing", "expression-parsing"),
    ("matrices", "matrix"),
    ("2-sat", "two-sat"),
    ("chinese remainder theorem", "chinese-remainder-theorem"),
    ("schedules", "scheduling"),
];

/// Canonical child → parent. One level only.
const TOPIC_HIERARCHY: &[(&str, &str)] = &[
    ("binary-search-tree", "tree"),
    ("segment-tree", "tree"),
    ("binary-indexed-tree", "tree"),
    ("trie", "tree"),
    ("dfs", "graph"),
    ("bfs", "graph"),
    ("shortest-path", "graph"),
    ("topological-sort", "graph"),
    ("network-flow", "graph"),
    ("union-find", "graph"),
    ("strongly-connected-component", "graph"),
    ("biconnected-component", "graph"),
    ("eulerian-circuit", "graph"),
    ("doubly-linked-list", "linked-list"),
    ("monotonic-stack", "stack"),
    ("monotonic-queue", "queue"),
    ("heap", "tree"),
    ("merge-sort", "sorting"),
    ("quickselect", "sorting"),
    ("radix-sort", "sorting"),
    ("bucket-sort", "sorting"),
    ("counting-sort", "sorting"),
    ("rolling-hash", "hash-function"),
    ("memoization", "dynamic-programming"),
];

const TOPIC_CATEGORIES: &[(&str, Category)] = &[
    // data structures
    ("array", Category::Dsa),
    ("linked-list", Category::Dsa),
    ("stack", Category::Dsa),
    ("queue", Category::Dsa),
    ("hash-table", Category::Dsa),
    ("tree", Category::Dsa),
    ("graph", Category::Dsa),
    ("heap", Category::Dsa),
    ("trie", Category::Dsa),
    // algorithms
    ("sorting", Category::Dsa),
    ("binary-search", Category::Dsa),
    ("two-pointers", Category::Dsa),
    ("sliding-window", Category::Dsa),
    ("dynamic-programming", Category::Dsa),
    ("greedy", Category::Dsa),
    ("backtracking", Category::Dsa),
    ("recursion", Category::Dsa),
    ("divide-and-conquer", Category::Dsa),
    ("dfs", Category::Dsa),
    ("bfs", Category::Dsa),
    // competitive programming
    ("game-theory", Category::Cp),
    ("number-theory", Category::Cp),
    ("combinatorics", Category::Cp),
    ("geometry", Category::Cp),
    ("fft", Category::Cp),
    ("network-flow", Category::Cp),
    ("meet-in-the-middle", Category::Cp),
    ("two-sat", Category::Cp),
    ("chinese-remainder-theorem", Category::Cp),
    // system design
    ("design", Category::SystemDesign),
    ("database", Category::SystemDesign),
    ("concurrency", Category::SystemDesign),
    ("data-stream", Category::SystemDesign),
];

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("static regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s_]+").expect("static regex"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w-]").expect("static regex"));
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("static regex"));

/// Normalize one raw topic to its canonical name.
///
/// Returns an empty string for empty or whitespace-only input.
pub fn normalize(raw_topic: &str) -> String {
    let topic = raw_topic.trim();
    if topic.is_empty() {
        return String::new();
    }

    if let Some((_, canonical)) = TOPIC_MAPPING.iter().find(|(k, _)| *k == topic) {
        return canonical.to_string();
    }

    if let Some((_, canonical)) = TOPIC_MAPPING
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(topic))
    {
        return canonical.to_string();
    }

    kebab_case(topic)
}

fn kebab_case(topic: &str) -> String {
    let split = CAMEL_BOUNDARY.replace_all(topic, "${1}-${2}");
    let lower = split.to_lowercase();
    let hyphenated = SEPARATORS.replace_all(&lower, "-");
    let cleaned = NON_WORD.replace_all(&hyphenated, "");
    let collapsed = HYPHEN_RUNS.replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

/// Normalize a list of raw topics, dropping empties and duplicates while
/// keeping first-seen order.
pub fn normalize_topics<S: AsRef<str>>(raw_topics: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for raw in raw_topics {
        let name = normalize(raw.as_ref());
        if !name.is_empty() && seen.insert(name.clone()) {
            out.push(name);
        }
    }
    out
}

pub fn topic_parent(name: &str) -> Option<&'static str> {
    TOPIC_HIERARCHY
        .iter()
        .find(|(child, _)| *child == name)
        .map(|(_, parent)| *parent)
}

pub fn topic_category(name: &str) -> Category {
    TOPIC_CATEGORIES
        .iter()
        .find(|(topic, _)| *topic == name)
        .map(|(_, category)| *category)
        .unwrap_or(Category::Other)
}

/// Build the canonical [`Topic`] record for a normalized name.
pub fn build_topic_document(name: &str) -> Topic {
    Topic {
        topic_id: identity::topic_id(name).to_string(),
        name: name.to_string(),
        parent: topic_parent(name).map(str::to_string),
        category: topic_category(name),
    }
}

/// Build sorted, deduplicated topic records from any set of names.
pub fn build_topic_documents<'a, I>(names: I) -> Vec<Topic>
where
    I: IntoIterator<Item = &'a String>,
{
    let unique: BTreeSet<&String> = names.into_iter().collect();
    unique
        .into_iter()
        .map(|name| build_topic_document(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_spellings_converge() {
        assert_eq!(normalize("Heap (Priority Queue)"), "heap");
        assert_eq!(normalize("Priority Queue"), "heap");
        assert_eq!(normalize("Heap"), "heap");
    }

    #[test]
    fn test_codeforces_spellings() {
        assert_eq!(normalize("dp"), "dynamic-programming");
        assert_eq!(normalize("dsu"), "union-find");
        assert_eq!(normalize("2-sat"), "two-sat");
        assert_eq!(normalize("constructive algorithms"), "constructive-algorithms");
    }

    #[test]
    fn test_case_insensitive_retry() {
        assert_eq!(normalize("HASH TABLE"), "hash-table");
        assert_eq!(normalize("Graphs"), "graph");
    }

    #[test]
    fn test_fallback_kebab_case() {
        assert_eq!(normalize("segmentTree"), "segment-tree");
        assert_eq!(normalize("  Some_New   Topic! "), "some-new-topic");
        assert_eq!(normalize("--weird--name--"), "weird-name");
        assert_eq!(normalize("C++ Tricks"), "c-tricks");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn test_normalize_topics_dedups_in_order() {
        assert_eq!(normalize_topics(&["Array", "array", "ARRAY"]), vec!["array"]);
        assert_eq!(
            normalize_topics(&["Tree", "", "dp", "trees", "Dynamic Programming"]),
            vec!["tree", "dynamic-programming"]
        );
    }

    #[test]
    fn test_parent_and_category() {
        assert_eq!(topic_parent("segment-tree"), Some("tree"));
        assert_eq!(topic_parent("dfs"), Some("graph"));
        assert_eq!(topic_parent("array"), None);
        assert_eq!(topic_category("fft"), Category::Cp);
        assert_eq!(topic_category("design"), Category::SystemDesign);
        assert_eq!(topic_category("quantum-sort"), Category::Other);
    }

    #[test]
    fn test_every_parent_is_itself_canonical() {
        let canonical: HashSet<&str> = TOPIC_MAPPING.iter().map(|(_, c)| *c).collect();
        for (_, parent) in TOPIC_HIERARCHY {
            assert!(canonical.contains(parent), "parent {} not canonical", parent);
        }
    }

    #[test]
    fn test_build_topic_document() {
        let topic = build_topic_document("segment-tree");
        assert_eq!(topic.name, "segment-tree");
        assert_eq!(topic.parent.as_deref(), Some("tree"));
        assert_eq!(topic.category, Category::Other);
        assert_eq!(topic.topic_id, identity::topic_id("segment-tree").to_string());
    }

    #[test]
    fn test_build_topic_documents_sorted_unique() {
        let names = vec!["tree".to_string(), "array".to_string(), "tree".to_string()];
        let docs = build_topic_documents(&names);
        let names: Vec<&str> = docs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["array", "tree"]);
    }
}
