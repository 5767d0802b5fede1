//! Url deduplication keeps the closest occurrence.

use std::collections::HashSet;

use crate::common::{placed_retriever, QUERY};

const JAVA: &str = "https://example.com/view/java-8-new/";
const PYTHON: &str = "https://example.com/view/python-new/";
const SQL: &str = "https://example.com/view/sql-server-new/";

#[test]
fn test_duplicate_url_keeps_closest() {
    // Same url twice: the far copy first in the catalog, the near copy later
    let retriever = placed_retriever(
        &[
            (JAVA, "Java Far", [5.0, 0.0]),
            (PYTHON, "Python", [2.0, 0.0]),
            (JAVA, "Java Near", [1.0, 0.0]),
        ],
        [0.0, 0.0],
    );

    let result = retriever.search(QUERY, 10).unwrap();

    assert_eq!(result.urls(), vec![JAVA, PYTHON]);
    assert_eq!(result.hits[0].item.name, "Java Near");
    assert_eq!(result.hits[0].position, 2);
    assert_eq!(result.hits[0].distance, 1.0);
}

#[test]
fn test_duplicates_do_not_pad_results() {
    let retriever = placed_retriever(
        &[
            (JAVA, "Java One", [1.0, 0.0]),
            (JAVA, "Java Two", [1.5, 0.0]),
            (JAVA, "Java Three", [2.0, 0.0]),
            (SQL, "Sql", [3.0, 0.0]),
        ],
        [0.0, 0.0],
    );

    // k larger than the corpus: every unique url exactly once
    let result = retriever.search(QUERY, 50).unwrap();
    assert_eq!(result.urls(), vec![JAVA, SQL]);
}

#[test]
fn test_dedup_applies_within_top_k_window() {
    let retriever = placed_retriever(
        &[
            (JAVA, "Java One", [1.0, 0.0]),
            (JAVA, "Java Two", [1.5, 0.0]),
            (SQL, "Sql", [3.0, 0.0]),
        ],
        [0.0, 0.0],
    );

    // The two nearest rows share a url, so two neighbors collapse to one hit
    let result = retriever.search(QUERY, 2).unwrap();
    assert_eq!(result.urls(), vec![JAVA]);
}

#[test]
fn test_urls_unique_in_every_window() {
    let placed: Vec<(String, String, [f32; 2])> = (0..12)
        .map(|i| {
            (
                format!("https://example.com/view/item-{}/", i % 4),
                format!("Item{}x", (b'a' + i as u8) as char),
                [i as f32, 1.0],
            )
        })
        .collect();
    let refs: Vec<(&str, &str, [f32; 2])> = placed
        .iter()
        .map(|(u, n, p)| (u.as_str(), n.as_str(), *p))
        .collect();
    let retriever = placed_retriever(&refs, [0.0, 0.0]);

    for k in 1..=14 {
        let result = retriever.search(QUERY, k).unwrap();
        let unique: HashSet<&str> = result.urls().into_iter().collect();
        assert_eq!(unique.len(), result.len(), "k={k}: {:?}", result.urls());
        assert!(result.len() <= k.min(4));
    }
}
