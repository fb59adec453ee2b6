//! Search query parsing.
//!
//! A search box accepts `field:value` tokens mixed with free text:
//!
//! ```text
//! agent:john fresno name:abc
//! ```
//!
//! parses into `field_matches = {agent: "john", name: "abc"}` and
//! `general_terms = ["fresno"]`. The gaps between field tokens are kept whole
//! (not re-split on whitespace), so `big red farm` is one term.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static FIELD_TOKEN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\w+):(\S+)").ok());

/// Parsed form of a search box input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Field-qualified matches; the last occurrence of a field wins.
    pub field_matches: BTreeMap<String, String>,
    /// Unqualified terms, in input order.
    pub general_terms: Vec<String>,
}

impl SearchQuery {
    /// Parse raw search input. The input is trimmed and lower-cased first.
    pub fn parse(input: &str) -> Self {
        let query = input.trim().to_lowercase();
        if query.is_empty() {
            return Self::default();
        }

        let Some(pattern) = FIELD_TOKEN.as_ref() else {
            return Self {
                field_matches: BTreeMap::new(),
                general_terms: vec![query],
            };
        };

        let mut field_matches = BTreeMap::new();
        let mut general_terms = Vec::new();
        let mut last_index = 0;

        for caps in pattern.captures_iter(&query) {
            let (Some(whole), Some(field), Some(value)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            push_term(&mut general_terms, &query[last_index..whole.start()]);
            field_matches.insert(field.as_str().to_string(), value.as_str().to_string());
            last_index = whole.end();
        }

        push_term(&mut general_terms, &query[last_index..]);

        if field_matches.is_empty() && general_terms.is_empty() {
            general_terms.push(query);
        }

        Self {
            field_matches,
            general_terms,
        }
    }

    /// True when the query constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.field_matches.is_empty() && self.general_terms.is_empty()
    }
}

fn push_term(terms: &mut Vec<String>, gap: &str) {
    let term = gap.trim();
    if !term.is_empty() {
        terms.push(term.to_string());
    }
}
