// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Prompt construction. The detail level is the only knob.

use std::fmt::Write;

use crate::types::{DetailLevel, Item};

pub fn detail_instruction(level: DetailLevel) -> &'static str {
    match level {
        DetailLevel::ExecutiveSummary => "Provide a concise, high-level summary only.",
        DetailLevel::Standard => "Provide a standard professional summary.",
        DetailLevel::DeepDive => {
            "Provide an extensive, deep analysis with specific interview questions."
        }
    }
}

/// Consultant framing, numbered candidates, detail level, fixed structure.
pub fn build_prompt(query: &str, candidates: &[Item], level: DetailLevel) -> String {
    let mut context = String::new();
    for (i, item) in candidates.iter().enumerate() {
        // Writing into a String cannot fail
        let _ = write!(
            context,
            "{}. {} (Type: {})\n   Desc: {}\n   URL: {}\n\n",
            i + 1,
            item.name,
            item.test_type_codes().join(", "),
            item.description,
            item.url
        );
    }

    format!(
        "You are an expert SHL Consultant. Create a strategic assessment plan for: \"{query}\".\n\
         CONTEXT: The user needs a hiring strategy based ONLY on the SHL assessments listed below.\n\
         {context}\
         DETAIL LEVEL: {instruction}\n\
         INSTRUCTIONS:\n\
         1. Write a strategy with 3 distinct sections.\n\
         2. BE CONCISE.\n\
         3. For Section 2 (Recommendations), select exactly 3-4 top tests.\n\
         4. Explain the 'Why' for each test.\n",
        instruction = detail_instruction(level),
    )
}
