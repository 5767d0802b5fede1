// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Raw catalog snapshot parsing.
//!
//! The collector writes a JSON array of records. A record that fails to parse
//! as an [`Item`] (no `url`, or not an object) is skipped with a warning;
//! the rest of the catalog still loads.

use serde_json::Value;
use tracing::warn;

use crate::types::Item;

/// Parse a catalog JSON array into items, skipping records without a usable url.
pub fn parse_items(json: &str) -> Result<Vec<Item>, serde_json::Error> {
    let records: Vec<Value> = serde_json::from_str(json)?;
    Ok(items_from_records(records))
}

pub(crate) fn items_from_records(records: Vec<Value>) -> Vec<Item> {
    let total = records.len();
    let items: Vec<Item> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<Item>(record) {
            Ok(item) if !item.url.trim().is_empty() => Some(item),
            Ok(_) => {
                warn!(record = i, "skipping catalog record with blank url");
                None
            }
            Err(e) => {
                warn!(record = i, error = %e, "skipping malformed catalog record");
                None
            }
        })
        .collect();

    if items.len() < total {
        warn!(kept = items.len(), total, "some catalog records were skipped");
    }
    items
}
