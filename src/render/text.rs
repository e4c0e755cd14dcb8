use std::{path::PathBuf, sync::Arc};

use usvg::fontdb;

use crate::foundation::error::{MemeError, MemeResult};

/// Display faces tried, in order, when no caption font file is configured.
const PREFERRED_FAMILIES: [&str; 5] = ["Impact", "Anton", "Oswald", "Bebas Neue", "Haettenschweiler"];

/// Where the caption face comes from.
#[derive(Clone, Debug, Default)]
pub enum FontSource {
    /// Query installed system fonts for a bold condensed display face.
    #[default]
    System,
    /// Font file on disk (TTF/OTF/TTC, first face).
    File(PathBuf),
    /// In-memory font bytes and face index.
    Bytes(Arc<Vec<u8>>, u32),
}

/// Caption face: raw font bytes plus the face index within them.
#[derive(Clone)]
pub struct CaptionFont {
    bytes: Arc<Vec<u8>>,
    index: u32,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("font_bytes_len", &self.bytes.len())
            .field("index", &self.index)
            .finish()
    }
}

impl CaptionFont {
    /// Font from bytes; fails when they hold no parsable face.
    pub fn from_bytes(bytes: impl Into<Arc<Vec<u8>>>, index: u32) -> MemeResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(MemeError::font("font data is empty"));
        }
        Ok(Self { bytes, index })
    }

    /// Load the face a [`FontSource`] names.
    pub fn resolve(source: &FontSource) -> MemeResult<Self> {
        match source {
            FontSource::System => Self::discover_system(),
            FontSource::File(path) => {
                let bytes = std::fs::read(path).map_err(|e| {
                    MemeError::font(format!("read font '{}': {e}", path.display()))
                })?;
                Self::from_bytes(bytes, 0)
            }
            FontSource::Bytes(bytes, index) => Self::from_bytes(bytes.clone(), *index),
        }
    }

    /// Pick the best installed match for the classic caption look: one of the preferred
    /// display families, else a bold sans-serif, else whatever face is installed.
    pub fn discover_system() -> MemeResult<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let mut families: Vec<fontdb::Family<'_>> = PREFERRED_FAMILIES
            .iter()
            .map(|&name| fontdb::Family::Name(name))
            .collect();
        families.push(fontdb::Family::SansSerif);

        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            stretch: fontdb::Stretch::Condensed,
            style: fontdb::Style::Normal,
        };

        let id = db
            .query(&query)
            .or_else(|| {
                db.faces()
                    .find(|face| face.weight.0 >= fontdb::Weight::BOLD.0)
                    .map(|face| face.id)
            })
            .or_else(|| db.faces().next().map(|face| face.id))
            .ok_or_else(|| MemeError::font("no system fonts available for captions"))?;

        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| MemeError::font("system font face data is unavailable"))?;
        tracing::debug!(face_index = index, len = bytes.len(), "resolved system caption font");
        Self::from_bytes(bytes, index)
    }

    /// Raw font file bytes.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Face index within the font file.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn font_data(&self) -> vello_cpu::peniko::FontData {
        vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(self.bytes.as_ref().clone()),
            self.index,
        )
    }
}

/// Shaped single-line caption ready to be stroked and filled.
pub struct ShapedLine {
    /// Positioned glyphs, relative to the layout origin.
    pub glyphs: Vec<vello_cpu::Glyph>,
    /// Font size the glyphs were shaped at.
    pub font_size: f32,
    /// Advance width of the whole line.
    pub width: f32,
    /// Baseline offset from the top of the layout box.
    pub baseline: f32,
    /// Ascent of the line.
    pub ascent: f32,
    /// Descent of the line.
    pub descent: f32,
}

/// Stateful helper for building Parley layouts against a single registered caption face.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<()>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Engine with `font` registered as its only family.
    pub fn new(font: &CaptionFont) -> MemeResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| MemeError::font("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| MemeError::font("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Family name the face registered under.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape `text` as one unwrapped line. Line breaks are flattened to spaces the way a
    /// canvas `fillText` call treats them.
    pub fn shape_line(&mut self, text: &str, size_px: f32) -> MemeResult<ShapedLine> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(MemeError::validation(
                "caption font size must be finite and > 0",
            ));
        }

        let flat = flatten_line_breaks(text);

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, &flat, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<()> = builder.build(&flat);
        layout.break_all_lines(None);

        let mut shaped = ShapedLine {
            glyphs: Vec::new(),
            font_size: size_px,
            width: 0.0,
            baseline: 0.0,
            ascent: 0.0,
            descent: 0.0,
        };

        for (i, line) in layout.lines().enumerate() {
            let m = line.metrics();
            shaped.width = shaped.width.max(m.advance);
            if i == 0 {
                shaped.baseline = m.baseline;
                shaped.ascent = m.ascent;
                shaped.descent = m.descent;
            }
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                shaped.font_size = run.run().font_size();
                let mut x = run.offset();
                let y = run.baseline();
                for g in run.glyphs() {
                    shaped.glyphs.push(vello_cpu::Glyph {
                        id: g.id,
                        x: x + g.x,
                        y: y + g.y,
                    });
                    x += g.advance;
                }
            }
        }

        Ok(shaped)
    }
}

/// Replace every character parley could treat as a mandatory break (controls such as LF, VT,
/// NEL, plus the Unicode line and paragraph separators) with a space.
pub(crate) fn flatten_line_breaks(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_control() || matches!(c, '\u{2028}' | '\u{2029}') {
                ' '
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
