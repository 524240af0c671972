//! Named, ordered collections of field rules.

use std::collections::HashSet;

use tracing::debug;

use super::patterns::*;
use super::rule::{FieldRule, FieldRuleSpec};
use crate::error::RuleError;
use crate::models::FieldsConfig;

/// Built-in rule sets with a one-line description each.
pub const BUILTIN_RULE_SETS: &[(&str, &str)] = &[
    (
        "carton-label",
        "Carton labels: PO number, ASIN, SKU, item description, quantity, carton ID",
    ),
    (
        "purchase-order",
        "Purchase order summaries: PO number, vendor, ship date, shipment ID, total units",
    ),
];

/// An ordered list of uniquely named rules.
///
/// Rule order is the output column order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<FieldRule>,
}

impl RuleSet {
    /// Create a rule set, rejecting duplicate rule names.
    pub fn new(name: impl Into<String>, rules: Vec<FieldRule>) -> Result<Self, RuleError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.name()) {
                return Err(RuleError::DuplicateName(rule.name().to_string()));
            }
        }
        Ok(Self {
            name: name.into(),
            rules,
        })
    }

    /// Look up a built-in rule set by name.
    pub fn builtin(name: &str) -> Result<Self, RuleError> {
        let rules = match name {
            "carton-label" => vec![
                FieldRule::from_regex("PO #", PO_NUMBER.clone(), 1)?,
                FieldRule::from_regex("ASIN", ASIN.clone(), 1)?,
                FieldRule::from_regex("SKU", SKU.clone(), 1)?,
                FieldRule::between("Item Description", "ITEM DESC:", &["ASIN#", "QTY"])?,
                FieldRule::from_regex("Quantity", QUANTITY.clone(), 1)?,
                FieldRule::from_regex("Carton No", CARTON_COUNT.clone(), 1)?,
                FieldRule::identifier("Carton ID"),
            ],
            "purchase-order" => vec![
                FieldRule::from_regex("PO #", PO_NUMBER.clone(), 1)?,
                FieldRule::from_regex("Vendor", VENDOR.clone(), 1)?,
                FieldRule::from_regex("Ship Date", SHIP_DATE.clone(), 1)?,
                FieldRule::from_regex("Shipment ID", SHIPMENT_ID.clone(), 1)?,
                FieldRule::from_regex("Total Units", TOTAL_UNITS.clone(), 1)?,
            ],
            other => return Err(RuleError::UnknownRuleSet(other.to_string())),
        };
        Self::new(name, rules)
    }

    /// Compile a rule set from serialized rules.
    pub fn from_specs(name: impl Into<String>, specs: &[FieldRuleSpec]) -> Result<Self, RuleError> {
        let rules = specs
            .iter()
            .map(FieldRule::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, rules)
    }

    /// Resolve the rule set a configuration asks for.
    ///
    /// Custom rules, when present, replace the named built-in set.
    pub fn from_config(config: &FieldsConfig) -> Result<Self, RuleError> {
        if config.custom_rules.is_empty() {
            Self::builtin(&config.rule_set)
        } else {
            debug!("Using {} custom field rules", config.custom_rules.len());
            Self::from_specs("custom", &config.custom_rules)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Rule names in order; the record schema.
    pub fn field_names(&self) -> Vec<String> {
        self.rules.iter().map(|r| r.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
