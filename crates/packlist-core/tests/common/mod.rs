#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat, Stream, dictionary};

/// Column positions used by [`grid`].
pub const COLUMNS: [i64; 3] = [50, 200, 350];

/// One fixture page: text placed at absolute positions, plus stroked lines.
#[derive(Default)]
pub struct FixturePage {
    operations: Vec<Operation>,
}

impl FixturePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place `text` in Courier 10 with its baseline at `(x, y)` (PDF units, origin bottom-left).
    pub fn text(mut self, x: i64, y: i64, text: &str) -> Self {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// Show two-byte glyph codes with the Identity-H font `F2` at `(x, y)`.
    pub fn cid_text(mut self, x: i64, y: i64, codes: &[u16]) -> Self {
        let bytes = codes.iter().flat_map(|code| code.to_be_bytes()).collect();
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F2".into(), 10.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ]);
        self
    }

    /// One line of text per entry, 14 units apart from `y` down.
    pub fn lines(mut self, x: i64, y: i64, lines: &[&str]) -> Self {
        for (index, line) in lines.iter().enumerate() {
            self = self.text(x, y - 14 * index as i64, line);
        }
        self
    }

    /// Stroke a straight line.
    pub fn line(mut self, x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        self.operations.extend([
            Operation::new("m", vec![x0.into(), y0.into()]),
            Operation::new("l", vec![x1.into(), y1.into()]),
            Operation::new("S", vec![]),
        ]);
        self
    }

    /// Stroke a rectangle.
    pub fn rect(mut self, x: i64, y: i64, width: i64, height: i64) -> Self {
        self.operations.extend([
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("S", vec![]),
        ]);
        self
    }
}

/// A page holding `rows` laid out on [`COLUMNS`], 20 units apart from `top_y` down.
pub fn grid(rows: &[&[&str]], top_y: i64) -> FixturePage {
    let mut page = FixturePage::new();
    for (r, row) in rows.iter().enumerate() {
        let y = top_y - 20 * r as i64;
        for (c, cell) in row.iter().enumerate() {
            page = page.text(COLUMNS[c], y, cell);
        }
    }
    page
}

/// ToUnicode CMap sending codes 0x24..=0x27 to "A".."D".
const ALPHA_CMAP: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0024> <0027> <0041>
endbfrange
endcmap
CMapName currentdict /CMapName get /CIDInit /ProcSet findresource exec /CMap defineresource pop
end
end
";

/// How the Identity-H font `F2` is described.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CidFont {
    /// Not present in the resources.
    Absent,
    /// Complete, with a `/FontDescriptor` on the descendant font.
    Described,
    /// Missing the descendant `/FontDescriptor`.
    Undescribed,
}

/// Build a Letter-sized PDF with the given pages.
pub fn build_pdf(pages: Vec<FixturePage>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    build_pdf_with(pages, CidFont::Absent)
}

fn add_cid_font(doc: &mut Document, variant: CidFont) -> Result<ObjectId, Box<dyn std::error::Error>> {
    let mut descendant = dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => "AlphaSans",
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "DW" => 600,
        "CIDToGIDMap" => "Identity",
    };
    if variant == CidFont::Described {
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => "AlphaSans",
            "Flags" => 32,
            "FontBBox" => vec![0.into(), (-200).into(), 1000.into(), 900.into()],
            "ItalicAngle" => 0,
            "Ascent" => 900,
            "Descent" => -200,
            "CapHeight" => 700,
            "StemV" => 80,
        });
        descendant.set("FontDescriptor", descriptor_id);
    }
    let descendant_id = doc.add_object(descendant);
    let cmap_id = doc.add_object(Stream::new(dictionary! {}, ALPHA_CMAP.as_bytes().to_vec()));
    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "AlphaSans",
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![descendant_id.into()],
        "ToUnicode" => cmap_id,
    }))
}

/// Build a Letter-sized PDF, optionally carrying the Identity-H font `F2`.
pub fn build_pdf_with(
    pages: Vec<FixturePage>,
    cid_font: CidFont,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let mut fonts = dictionary! {
        "F1" => font_id,
    };
    if cid_font != CidFont::Absent {
        fonts.set("F2", add_cid_font(&mut doc, cid_font)?);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let mut page_ids = Vec::new();
    for page in pages {
        let content = Content {
            operations: page.operations,
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<Object>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}
