//! Page-level field extraction.

use tracing::{debug, trace};

use super::rule::NOT_FOUND;
use super::rule_set::RuleSet;
use crate::models::{FieldRecord, Page};

/// Applies a [`RuleSet`] to page text, one record per page.
#[derive(Debug, Clone, Copy)]
pub struct RecordExtractor<'a> {
    rules: &'a RuleSet,
}

impl<'a> RecordExtractor<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Field names in output order.
    pub fn schema(&self) -> Vec<String> {
        self.rules.field_names()
    }

    /// Extract a record from a page's flattened text.
    pub fn extract_page(&self, page: &Page) -> Option<FieldRecord> {
        self.extract_text(page.number, &page.text)
    }

    /// Extract a record from text.
    ///
    /// Every rule contributes exactly one value, so the record's keys are
    /// always the rule names in order. Blank text yields `None`.
    pub fn extract_text(&self, page: u32, text: &str) -> Option<FieldRecord> {
        if text.trim().is_empty() {
            debug!("Page {} has no text, skipping", page);
            return None;
        }

        let mut record = FieldRecord::new(page);
        let mut misses = 0;
        for rule in self.rules.rules() {
            let value = rule.apply(text);
            if value.is_empty() || value == NOT_FOUND {
                misses += 1;
                trace!("Page {}: no match for {:?}", page, rule.name());
            }
            record.insert(rule.name(), value);
        }

        debug!(
            "Page {}: matched {}/{} fields",
            page,
            self.rules.len() - misses,
            self.rules.len()
        );
        Some(record)
    }
}
