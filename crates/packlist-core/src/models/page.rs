//! Page abstraction consumed by the extraction engine.
//!
//! Coordinates are page units with the origin at the top-left corner and
//! `y` growing downward, so `top < bottom` for every well-formed box.

use serde::{Deserialize, Serialize};

/// One run of text at a known position on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    /// Text content of the run.
    pub text: String,
    /// Left edge.
    pub x0: f64,
    /// Right edge.
    pub x1: f64,
    /// Upper edge.
    pub top: f64,
    /// Lower edge.
    pub bottom: f64,
}

impl PositionedToken {
    /// Create a token from its text and bounding box.
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64, bottom: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            bottom,
        }
    }

    /// Vertical center of the token.
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Vertical extent.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A ruling line segment drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    pub bottom: f64,
}

/// Extent below which a segment counts as a line rather than a box side.
const LINE_THICKNESS: f64 = 1.0;

impl Edge {
    /// Create an edge from two end points, normalizing the box.
    pub fn from_points(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x0: ax.min(bx),
            x1: ax.max(bx),
            top: ay.min(by),
            bottom: ay.max(by),
        }
    }

    /// Vertical ruling (a column separator).
    pub fn is_vertical(&self) -> bool {
        self.x1 - self.x0 <= LINE_THICKNESS && self.bottom - self.top > LINE_THICKNESS
    }

    /// Horizontal ruling (a row separator).
    pub fn is_horizontal(&self) -> bool {
        self.bottom - self.top <= LINE_THICKNESS && self.x1 - self.x0 > LINE_THICKNESS
    }

    /// Length along the edge's own direction.
    pub fn length(&self) -> f64 {
        (self.x1 - self.x0).max(self.bottom - self.top)
    }
}

/// Content of a single document page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed).
    pub number: u32,
    /// Positioned text runs.
    pub tokens: Vec<PositionedToken>,
    /// Ruling line segments.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Flattened page text.
    pub text: String,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    pub fn with_tokens(mut self, tokens: Vec<PositionedToken>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// True when the page carries neither tokens nor text.
    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|t| t.text.trim().is_empty()) && self.text.trim().is_empty()
    }
}
