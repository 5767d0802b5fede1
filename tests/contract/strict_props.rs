//! Property tests: the strict formatter is total over malformed records.

use proptest::prelude::*;
use serde_json::{json, Value};

use shortlist::contract::{DESCRIPTION_MAX_CHARS, STRICT_RESULT_LIMIT};
use shortlist::corpus::parse_items;
use shortlist::{format_strict, SearchHit, SearchResult};

fn messy_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1e6f64..1e6).prop_map(|f| json!(f)),
        "[0-9]{1,3}".prop_map(Value::String),
        "(yes|no|Yes|No|TRUE|maybe|)".prop_map(Value::String),
        prop::collection::vec("[A-Z ]{0,3}", 0..4).prop_map(|v| json!(v)),
        Just(json!({ "nested": [1, 2] })),
    ]
}

fn record_strategy() -> impl Strategy<Value = Value> {
    (
        "[a-z]{1,12}",
        "\\PC{0,40}",
        "\\PC{0,600}",
        messy_value(),
        messy_value(),
        messy_value(),
        messy_value(),
    )
        .prop_map(|(slug, name, description, test_type, duration, adaptive, remote)| {
            json!({
                "url": format!("https://example.com/view/{slug}/"),
                "name": name,
                "description": description,
                "test_type": test_type,
                "duration": duration,
                "adaptive_support": adaptive,
                "remote_support": remote,
            })
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Property: every record is kept, and every field lands in range.
    #[test]
    fn prop_strict_fields_always_valid(records in prop::collection::vec(record_strategy(), 0..25)) {
        let json = serde_json::to_string(&records).unwrap();
        let items = parse_items(&json).unwrap();
        prop_assert_eq!(items.len(), records.len());

        let result = SearchResult {
            hits: items
                .into_iter()
                .enumerate()
                .map(|(position, item)| SearchHit { item, position, distance: position as f32 })
                .collect(),
        };
        let strict = format_strict(&result);

        prop_assert_eq!(
            strict.recommended_assessments.len(),
            records.len().min(STRICT_RESULT_LIMIT)
        );
        for (assessment, hit) in strict.recommended_assessments.iter().zip(&result.hits) {
            prop_assert_eq!(&assessment.url, &hit.item.url);
            prop_assert!(assessment.description.chars().count() <= DESCRIPTION_MAX_CHARS);
            prop_assert!(hit.item.description.starts_with(&assessment.description));
            prop_assert!(!assessment.test_type.is_empty());
            prop_assert!(assessment.test_type.iter().all(|t| !t.trim().is_empty()));
            prop_assert!(assessment.adaptive_support == "Yes" || assessment.adaptive_support == "No");
            prop_assert!(assessment.remote_support == "Yes" || assessment.remote_support == "No");
        }
    }
}
