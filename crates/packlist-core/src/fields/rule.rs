//! Field rules: a named pattern with a capture group and a fallback.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::patterns::IDENTIFIER_RUN;
use super::FieldExtractor;
use crate::error::RuleError;
use crate::normalize::normalize_text;

/// Value used by identifier rules when no digit run is present.
pub const NOT_FOUND: &str = "Not Found";

/// One named field extraction rule.
#[derive(Debug, Clone)]
pub struct FieldRule {
    name: String,
    pattern: Regex,
    capture_group: usize,
    multiline: bool,
    fallback: String,
}

impl FieldRule {
    /// Single-line rule taking capture group 1, empty fallback.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, RuleError> {
        Self::compile(name, pattern, 1, false, "")
    }

    /// Rule whose `.` also matches line breaks, so captures may span lines.
    pub fn multiline(name: impl Into<String>, pattern: &str) -> Result<Self, RuleError> {
        Self::compile(name, pattern, 1, true, "")
    }

    /// Compile a rule with every option spelled out.
    pub fn compile(
        name: impl Into<String>,
        pattern: &str,
        capture_group: usize,
        multiline: bool,
        fallback: impl Into<String>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        let regex = RegexBuilder::new(pattern)
            .dot_matches_new_line(multiline)
            .build()
            .map_err(|source| RuleError::InvalidPattern {
                name: name.clone(),
                source,
            })?;
        let mut rule = Self::from_regex(name, regex, capture_group)?;
        rule.multiline = multiline;
        rule.fallback = fallback.into();
        Ok(rule)
    }

    /// Wrap an already compiled regex.
    pub fn from_regex(
        name: impl Into<String>,
        pattern: Regex,
        capture_group: usize,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        // captures_len counts the implicit whole-match group
        let available = pattern.captures_len() - 1;
        if capture_group > available {
            return Err(RuleError::InvalidCaptureGroup {
                name,
                group: capture_group,
                available,
            });
        }
        Ok(Self {
            name,
            pattern,
            capture_group,
            multiline: false,
            fallback: String::new(),
        })
    }

    /// Rule locating the first run of 18 to 20 digits anywhere in the text.
    ///
    /// Labels are ignored. Falls back to [`NOT_FOUND`].
    pub fn identifier(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: IDENTIFIER_RUN.clone(),
            capture_group: 1,
            multiline: false,
            fallback: NOT_FOUND.to_string(),
        }
    }

    /// Rule capturing everything after `start_label` up to the earliest
    /// occurrence of any terminator, or to the end of the text.
    ///
    /// When several terminators follow the label, the one that occurs first
    /// in the text ends the capture, whatever its position in `terminators`.
    pub fn between(
        name: impl Into<String>,
        start_label: &str,
        terminators: &[&str],
    ) -> Result<Self, RuleError> {
        let mut stops: Vec<String> = terminators
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| regex::escape(t))
            .collect();
        stops.push(r"\z".to_string());
        let pattern = format!(
            r"{}\s*(.*?)\s*(?:{})",
            regex::escape(start_label),
            stops.join("|")
        );
        Self::compile(name, &pattern, 1, true, "")
    }

    /// Replace the fallback value.
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// Build a rule from its serialized form.
    pub fn from_spec(spec: &FieldRuleSpec) -> Result<Self, RuleError> {
        match spec {
            FieldRuleSpec::Pattern {
                name,
                pattern,
                capture_group,
                multiline,
                fallback,
            } => Self::compile(name.as_str(), pattern, *capture_group, *multiline, fallback.as_str()),
            FieldRuleSpec::Identifier { name, fallback } => {
                Ok(Self::identifier(name.as_str()).with_fallback(fallback.as_str()))
            }
            FieldRuleSpec::Between {
                name,
                start,
                terminators,
                fallback,
            } => {
                let stops: Vec<&str> = terminators.iter().map(String::as_str).collect();
                Ok(Self::between(name.as_str(), start, &stops)?.with_fallback(fallback.as_str()))
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source text of the compiled pattern.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn capture_group(&self) -> usize {
        self.capture_group
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Extract this field from text, substituting the fallback on a miss.
    pub fn apply(&self, text: &str) -> String {
        self.extract(text).unwrap_or_else(|| self.fallback.clone())
    }

    fn clean(&self, raw: &str) -> String {
        if self.multiline {
            normalize_text(raw)
        } else {
            raw.trim().to_string()
        }
    }
}

impl FieldExtractor for FieldRule {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = self.pattern.captures(text)?;
        caps.get(self.capture_group).map(|m| self.clean(m.as_str()))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(self.capture_group))
            .map(|m| self.clean(m.as_str()))
            .collect()
    }
}

fn default_capture_group() -> usize {
    1
}

fn default_not_found() -> String {
    NOT_FOUND.to_string()
}

/// Serialized form of a [`FieldRule`], as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldRuleSpec {
    /// A regular expression with a capture group.
    Pattern {
        name: String,
        pattern: String,
        #[serde(default = "default_capture_group")]
        capture_group: usize,
        #[serde(default)]
        multiline: bool,
        #[serde(default)]
        fallback: String,
    },
    /// First 18 to 20 digit run in the text.
    Identifier {
        name: String,
        #[serde(default = "default_not_found")]
        fallback: String,
    },
    /// Text between a label and the earliest terminator.
    Between {
        name: String,
        start: String,
        #[serde(default)]
        terminators: Vec<String>,
        #[serde(default)]
        fallback: String,
    },
}

impl FieldRuleSpec {
    pub fn name(&self) -> &str {
        match self {
            FieldRuleSpec::Pattern { name, .. }
            | FieldRuleSpec::Identifier { name, .. }
            | FieldRuleSpec::Between { name, .. } => name,
        }
    }
}
