// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Output contracts: two views of one ranked result.
//!
//! - [`strict`]: bounded, field-normalized, for automated consumers
//! - [`rich`]: unmodified records plus narrative text, for people
//!
//! Neither re-ranks. Both take the order the retriever produced.

pub mod rich;
pub mod strict;

pub use rich::{format_rich, rich_candidates, RichResponse, RICH_RESULT_LIMIT};
pub use strict::{
    format_strict, normalize_item, StrictAssessment, StrictResponse, DESCRIPTION_MAX_CHARS,
    STRICT_RESULT_LIMIT, UNKNOWN_TEST_TYPE,
};
