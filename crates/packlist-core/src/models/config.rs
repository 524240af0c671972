//! Configuration structures for the conversion pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{PacklistError, Result};
use crate::fields::FieldRuleSpec;

/// Main configuration for packlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PacklistConfig {
    /// Which extraction engine to run.
    pub mode: ModeKind,

    /// Table reconstruction settings.
    pub table: TableSettings,

    /// Field extraction configuration.
    pub fields: FieldsConfig,

    /// Output shaping.
    pub output: OutputConfig,

    /// PDF reading configuration.
    pub pdf: PdfConfig,
}

/// Extraction engine selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeKind {
    /// Reconstruct a table from token positions.
    #[default]
    Table,
    /// Extract named fields from page text.
    Fields,
}

/// How band boundaries are found along one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Cluster token positions.
    #[default]
    ByTextPosition,
    /// Use ruling lines drawn on the page.
    ByRulingLines,
}

/// Token clustering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    /// Strategy for column boundaries.
    pub vertical_mode: Strategy,

    /// Strategy for row boundaries.
    pub horizontal_mode: Strategy,

    /// Maximum distance between positions merged into one band or line.
    pub snap_tolerance: f64,

    /// Maximum gap between adjacent tokens or collinear segments that are joined.
    pub join_tolerance: f64,

    /// Minimum length of a ruling line.
    pub edge_min_length: f64,

    /// Slack allowed when deciding whether a token lies inside a ruled cell.
    pub intersection_tolerance: f64,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_mode: Strategy::ByTextPosition,
            horizontal_mode: Strategy::ByTextPosition,
            snap_tolerance: 4.0,
            join_tolerance: 3.0,
            edge_min_length: 3.0,
            intersection_tolerance: 3.0,
        }
    }
}

impl TableSettings {
    /// Set both strategies.
    pub fn with_strategies(mut self, vertical: Strategy, horizontal: Strategy) -> Self {
        self.vertical_mode = vertical;
        self.horizontal_mode = horizontal;
        self
    }

    /// Set snap tolerance.
    pub fn with_snap_tolerance(mut self, tolerance: f64) -> Self {
        self.snap_tolerance = tolerance;
        self
    }

    /// Set join tolerance.
    pub fn with_join_tolerance(mut self, tolerance: f64) -> Self {
        self.join_tolerance = tolerance;
        self
    }

    /// Set minimum ruling length.
    pub fn with_edge_min_length(mut self, length: f64) -> Self {
        self.edge_min_length = length;
        self
    }

    /// Set intersection tolerance.
    pub fn with_intersection_tolerance(mut self, tolerance: f64) -> Self {
        self.intersection_tolerance = tolerance;
        self
    }

    /// Check that every tolerance is finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("snap_tolerance", self.snap_tolerance),
            ("join_tolerance", self.join_tolerance),
            ("edge_min_length", self.edge_min_length),
            ("intersection_tolerance", self.intersection_tolerance),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(PacklistError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// Name of a built-in rule set.
    pub rule_set: String,

    /// Custom rules. When non-empty they replace the built-in set.
    pub custom_rules: Vec<FieldRuleSpec>,

    /// Output column order by field name (empty = rule order).
    pub field_order: Vec<String>,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            rule_set: "carton-label".to_string(),
            custom_rules: Vec::new(),
            field_order: Vec::new(),
        }
    }
}

/// Output shaping configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit a `col_N` header row for table output.
    pub table_header: bool,

    /// Column index order for table output (empty = page order).
    pub column_order: Vec<usize>,
}

/// PDF reading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Rebuild page text from token positions when no text layer is found.
    pub text_from_tokens: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            text_from_tokens: true,
        }
    }
}

impl PacklistConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> std::result::Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
