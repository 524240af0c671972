//! Ruling segments from a page content stream.
//!
//! Only the current transformation matrix and path operators are tracked:
//! straight stroked or filled segments become [`Edge`]s. Text is read
//! separately through pdf-extract.

use lopdf::content::Operation;
use lopdf::Object;
use tracing::trace;

use crate::models::Edge;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn transform(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Read a numeric operand.
pub(crate) fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

/// Read the last `N` operands as numbers.
fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, object) in out.iter_mut().zip(&operands[operands.len() - N..]) {
        *slot = number(object)?;
    }
    Some(out)
}

/// Visible page area in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Default for MediaBox {
    /// US Letter.
    fn default() -> Self {
        Self {
            left: 0.0,
            bottom: 0.0,
            right: 612.0,
            top: 792.0,
        }
    }
}

impl MediaBox {
    /// Build from a `[llx lly urx ury]` array, in any corner order.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d] => Some(Self {
                left: a.min(*c),
                bottom: b.min(*d),
                right: a.max(*c),
                top: b.max(*d),
            }),
            _ => None,
        }
    }

    /// Map a user-space point to top-left page coordinates.
    fn to_page(self, x: f64, y: f64) -> (f64, f64) {
        (x - self.left, self.top - y)
    }
}

/// Walks content stream operations and collects ruling edges.
pub struct RulingInterpreter {
    media: MediaBox,
    ctm: Matrix,
    saved: Vec<Matrix>,
    current_point: Option<(f64, f64)>,
    subpath_start: Option<(f64, f64)>,
    path: Vec<Edge>,
    edges: Vec<Edge>,
}

impl RulingInterpreter {
    pub fn new(media: MediaBox) -> Self {
        Self {
            media,
            ctm: IDENTITY,
            saved: Vec::new(),
            current_point: None,
            subpath_start: None,
            path: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// Interpret every operation and return the painted segments.
    pub fn run(mut self, operations: &[Operation]) -> Vec<Edge> {
        for operation in operations {
            self.apply(operation);
        }
        self.edges
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = operation.operands.as_slice();
        match operation.operator.as_str() {
            "q" => self.saved.push(self.ctm),
            "Q" => {
                if let Some(ctm) = self.saved.pop() {
                    self.ctm = ctm;
                }
            }
            "cm" => {
                if let Some(m) = numbers::<6>(operands) {
                    self.ctm = multiply(&m, &self.ctm);
                }
            }

            // Path construction
            "m" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    let point = transform(&self.ctm, x, y);
                    self.current_point = Some(point);
                    self.subpath_start = Some(point);
                }
            }
            "l" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    let point = transform(&self.ctm, x, y);
                    if let Some(from) = self.current_point {
                        self.add_segment(from, point);
                    }
                    self.current_point = Some(point);
                }
            }
            "c" | "v" | "y" => {
                if let Some([x, y]) = numbers::<2>(operands) {
                    self.current_point = Some(transform(&self.ctm, x, y));
                }
            }
            "h" => self.close_subpath(),
            "re" => {
                if let Some([x, y, w, h]) = numbers::<4>(operands) {
                    let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
                    let points: Vec<(f64, f64)> = corners
                        .iter()
                        .map(|&(px, py)| transform(&self.ctm, px, py))
                        .collect();
                    for i in 0..4 {
                        self.add_segment(points[i], points[(i + 1) % 4]);
                    }
                    self.current_point = Some(points[0]);
                    self.subpath_start = Some(points[0]);
                }
            }

            // Path painting
            "s" | "b" | "b*" => {
                self.close_subpath();
                self.paint();
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => self.paint(),
            "n" => {
                self.path.clear();
                self.current_point = None;
                self.subpath_start = None;
            }

            other => trace!("Ignoring operator {}", other),
        }
    }

    fn add_segment(&mut self, from: (f64, f64), to: (f64, f64)) {
        let (ax, ay) = self.media.to_page(from.0, from.1);
        let (bx, by) = self.media.to_page(to.0, to.1);
        let edge = Edge::from_points(ax, ay, bx, by);
        if edge.length() > 0.0 {
            self.path.push(edge);
        }
    }

    fn close_subpath(&mut self) {
        if let (Some(from), Some(to)) = (self.current_point, self.subpath_start) {
            self.add_segment(from, to);
            self.current_point = Some(to);
        }
    }

    fn paint(&mut self) {
        self.edges.append(&mut self.path);
        self.current_point = None;
        self.subpath_start = None;
    }
}
