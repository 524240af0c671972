//! Positioned glyphs read through pdf-extract, grouped into text runs.
//!
//! pdf-extract resolves font encodings (simple encodings, `/Differences`,
//! `/ToUnicode`, two-byte CID codes) and reports each glyph with its text
//! rendering matrix. The collector here turns that stream into
//! [`PositionedToken`]s and a flattened page text.

use std::any::Any;
use std::collections::BTreeMap;
use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};

use pdf_extract::{OutputDev, OutputError, Transform};
use tracing::{debug, trace};

use crate::layout::cluster::{chain_clusters, reading_order};
use crate::models::PositionedToken;

/// Horizontal jump, in em, above which a glyph starts a new run.
const SPLIT_GAP_EM: f64 = 0.5;
/// Horizontal jump, in em, above which a space is inserted between glyphs.
const WORD_GAP_EM: f64 = 0.1;
/// Consecutive space glyphs that end a run.
const SPLIT_SPACES: usize = 2;

/// One decoded glyph in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Glyph {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub baseline: f64,
    pub size: f64,
}

impl Glyph {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, baseline: f64, size: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            baseline,
            size: size.abs().max(f64::EPSILON),
        }
    }

    fn is_space(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(char::is_whitespace)
    }
}

/// Tokens and text read from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageGlyphs {
    pub tokens: Vec<PositionedToken>,
    pub text: String,
}

#[derive(Debug)]
struct Run {
    text: String,
    x0: f64,
    x1: f64,
    top: f64,
    bottom: f64,
    baseline: f64,
    pen: f64,
    size: f64,
    spaces: usize,
}

/// Groups glyphs, in content order, into runs.
///
/// A run ends at two consecutive spaces, at a horizontal jump wider than
/// half an em, or when the baseline moves.
#[derive(Debug, Default)]
pub(crate) struct RunBuilder {
    run: Option<Run>,
    tokens: Vec<PositionedToken>,
}

impl RunBuilder {
    pub fn push(&mut self, glyph: &Glyph) {
        if glyph.is_space() {
            let mut split = false;
            if let Some(run) = self.run.as_mut() {
                run.spaces += 1;
                run.pen = glyph.x1;
                split = run.spaces >= SPLIT_SPACES;
            }
            if split {
                self.end_run();
            }
            return;
        }
        let text: String = glyph.text.chars().filter(|c| !c.is_control()).collect();
        if text.is_empty() {
            return;
        }

        let em = glyph.size;
        // (starts a new run, needs a separating space)
        let continuation = self.run.as_ref().map(|run| {
            let gap = glyph.x0 - run.pen;
            let same_line = (run.baseline - glyph.baseline).abs() <= run.size.max(em) * 0.5;
            let split = !same_line || gap.abs() > SPLIT_GAP_EM * em;
            (split, run.spaces > 0 || gap > WORD_GAP_EM * em)
        });
        let gap_space = match continuation {
            Some((true, _)) => {
                self.end_run();
                false
            }
            Some((false, space)) => space,
            None => false,
        };

        let run = self.run.get_or_insert_with(|| Run {
            text: String::new(),
            x0: glyph.x0,
            x1: glyph.x0,
            top: glyph.baseline - em,
            bottom: glyph.baseline,
            baseline: glyph.baseline,
            pen: glyph.x0,
            size: em,
            spaces: 0,
        });
        if gap_space {
            run.text.push(' ');
        }
        run.text.push_str(&text);
        run.spaces = 0;
        run.x1 = run.x1.max(glyph.x1);
        run.pen = glyph.x1;
        run.top = run.top.min(glyph.baseline - em);
        run.bottom = run.bottom.max(glyph.baseline);
    }

    /// Close the current run, if any.
    pub fn end_run(&mut self) {
        if let Some(run) = self.run.take() {
            if !run.text.is_empty() {
                self.tokens
                    .push(PositionedToken::new(run.text, run.x0, run.x1, run.top, run.bottom));
            }
        }
    }

    pub fn finish(mut self) -> Vec<PositionedToken> {
        self.end_run();
        self.tokens
    }
}

/// Flattens glyphs into reading text with line breaks.
#[derive(Debug, Default)]
struct TextFlow {
    text: String,
    word_start: bool,
    last_baseline: Option<f64>,
    last_end: f64,
}

impl TextFlow {
    fn begin_word(&mut self) {
        self.word_start = true;
    }

    fn push(&mut self, glyph: &Glyph) {
        if let (true, Some(last)) = (self.word_start, self.last_baseline) {
            let drop = (glyph.baseline - last).abs();
            if drop > glyph.size * 1.5 || (glyph.x0 < self.last_end && drop > glyph.size * 0.5) {
                self.text.push('\n');
            } else if glyph.x0 > self.last_end + glyph.size * WORD_GAP_EM {
                self.text.push(' ');
            }
        }
        self.text.push_str(&glyph.text);
        self.word_start = false;
        self.last_baseline = Some(glyph.baseline);
        self.last_end = glyph.x1;
    }
}

/// pdf-extract sink collecting [`PageGlyphs`] per page number.
#[derive(Debug, Default)]
struct GlyphCollector {
    pages: BTreeMap<u32, PageGlyphs>,
    page: Option<u32>,
    left: f64,
    top: f64,
    runs: RunBuilder,
    flow: TextFlow,
}

impl OutputDev for GlyphCollector {
    fn begin_page(
        &mut self,
        page_num: u32,
        media_box: &pdf_extract::MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.page = Some(page_num);
        self.left = media_box.llx.min(media_box.urx);
        self.top = media_box.lly.max(media_box.ury);
        self.runs = RunBuilder::default();
        self.flow = TextFlow::default();
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        if let Some(number) = self.page.take() {
            let tokens = mem::take(&mut self.runs).finish();
            let text = mem::take(&mut self.flow).text;
            trace!("Page {}: {} glyph runs", number, tokens.len());
            self.pages.insert(number, PageGlyphs { tokens, text });
        }
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        char: &str,
    ) -> Result<(), OutputError> {
        if char.is_empty() {
            return Ok(());
        }
        // trm maps glyph space (before font size) to user space
        let scale_x = trm.m11.hypot(trm.m12);
        let scale_y = trm.m21.hypot(trm.m22);
        let x0 = trm.m31 - self.left;
        let glyph = Glyph::new(
            char,
            x0,
            x0 + width * font_size * scale_x,
            self.top - trm.m32,
            font_size * scale_y,
        );
        self.flow.push(&glyph);
        self.runs.push(&glyph);
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        self.flow.begin_word();
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Read every page's glyphs from a PDF held in memory.
///
/// Pages that pdf-extract finished before an error or panic are kept;
/// the rest are absent from the map.
pub fn read_glyphs(data: &[u8]) -> BTreeMap<u32, PageGlyphs> {
    let mut collector = GlyphCollector::default();
    let result = catch_unwind(AssertUnwindSafe(|| -> Result<(), String> {
        let document = pdf_extract::Document::load_mem(data).map_err(|e| e.to_string())?;
        pdf_extract::output_doc(&document, &mut collector).map_err(|e| e.to_string())
    }));

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("pdf-extract failed: {}", e),
        Err(payload) => debug!("pdf-extract panicked: {}", panic_message(payload.as_ref())),
    }
    collector.pages
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Rebuild plain text from tokens: one line per vertical band, runs joined
/// by single spaces.
pub fn tokens_to_text(tokens: &[PositionedToken], line_tolerance: f64) -> String {
    let mut sorted: Vec<&PositionedToken> = tokens.iter().collect();
    sorted.sort_by(|a, b| reading_order(a, b));
    let centers: Vec<f64> = sorted.iter().map(|t| t.center_y()).collect();

    let mut lines = Vec::new();
    for range in chain_clusters(&centers, line_tolerance) {
        let mut line = sorted[range].to_vec();
        line.sort_by(|a, b| a.x0.total_cmp(&b.x0));
        let text = line
            .iter()
            .map(|t| t.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            lines.push(text);
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Courier 10: every glyph is 6 units wide.
    fn glyphs(text: &str, x: f64, baseline: f64) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = x + i as f64 * 6.0;
                Glyph::new(c.to_string(), x0, x0 + 6.0, baseline, 10.0)
            })
            .collect()
    }

    fn runs(glyphs: &[Glyph]) -> Vec<PositionedToken> {
        let mut builder = RunBuilder::default();
        for glyph in glyphs {
            builder.push(glyph);
        }
        builder.finish()
    }

    fn texts(tokens: &[PositionedToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_single_run_position() {
        let tokens = runs(&glyphs("Carton", 50.0, 92.0));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "Carton");
        assert_eq!(tokens[0].x0, 50.0);
        assert_eq!(tokens[0].x1, 86.0);
        assert_eq!(tokens[0].top, 82.0);
        assert_eq!(tokens[0].bottom, 92.0);
    }

    #[test]
    fn test_double_space_splits_run() {
        let tokens = runs(&glyphs("Blue Shirt  12", 50.0, 92.0));
        assert_eq!(texts(&tokens), vec!["Blue Shirt", "12"]);
        assert_eq!(tokens[1].x0, 122.0);
    }

    #[test]
    fn test_wide_gap_splits_and_small_gap_spaces() {
        let mut all = glyphs("AB", 50.0, 92.0);
        // 2 units past the pen: a word gap
        all.extend(glyphs("C", 64.0, 92.0));
        // 30 units past the pen: a new run
        all.extend(glyphs("D", 100.0, 92.0));
        assert_eq!(texts(&runs(&all)), vec!["AB C", "D"]);
    }

    #[test]
    fn test_baseline_change_splits_run() {
        let mut all = glyphs("one", 50.0, 92.0);
        all.extend(glyphs("two", 68.0, 106.0));
        let tokens = runs(&all);
        assert_eq!(texts(&tokens), vec!["one", "two"]);
        assert_eq!(tokens[1].bottom, 106.0);
    }

    #[test]
    fn test_multi_char_glyphs_and_controls() {
        let all = vec![
            Glyph::new("ﬁ", 50.0, 56.0, 92.0, 10.0),
            Glyph::new("\u{0}", 56.0, 62.0, 92.0, 10.0),
            Glyph::new("x", 56.0, 62.0, 92.0, 10.0),
        ];
        assert_eq!(texts(&runs(&all)), vec!["ﬁx"]);
    }

    #[test]
    fn test_text_flow_breaks_lines_and_words() {
        let mut flow = TextFlow::default();
        for (word, x, baseline) in [("PO#:", 50.0, 92.0), ("123", 80.0, 92.0), ("ASIN#:", 50.0, 106.0)] {
            flow.begin_word();
            for glyph in glyphs(word, x, baseline) {
                flow.push(&glyph);
            }
        }
        assert_eq!(flow.text, "PO#: 123\nASIN#:");
    }

    #[test]
    fn test_unreadable_bytes_yield_no_pages() {
        assert!(read_glyphs(b"not a pdf").is_empty());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("required");
        assert_eq!(panic_message(payload.as_ref()), "required");
        let payload: Box<dyn Any + Send> = Box::new(String::from("MediaBox"));
        assert_eq!(panic_message(payload.as_ref()), "MediaBox");
    }

    #[test]
    fn test_tokens_to_text() {
        let tokens = vec![
            PositionedToken::new("ASIN#: B001", 50.0, 110.0, 120.0, 130.0),
            PositionedToken::new("PO#:", 50.0, 74.0, 100.0, 110.0),
            PositionedToken::new("12345", 80.0, 110.0, 101.0, 111.0),
        ];
        assert_eq!(tokens_to_text(&tokens, 3.0), "PO#: 12345\nASIN#: B001");
    }
}
