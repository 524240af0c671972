//! Rule-based field extraction from page text.

mod extractor;
pub mod patterns;
mod rule;
mod rule_set;

pub use extractor::RecordExtractor;
pub use rule::{FieldRule, FieldRuleSpec, NOT_FOUND};
pub use rule_set::{RuleSet, BUILTIN_RULE_SETS};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}
