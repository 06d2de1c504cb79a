use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context;

use crate::foundation::error::{QrCardError, QrCardResult};

/// Font faces available to caption rendering, looked up by family name.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<usvg::fontdb::Database>,
}

/// A font face chosen for a requested family.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    /// Family name reported by the chosen face.
    pub family: String,
    /// Raw bytes of the font file backing the face.
    pub bytes: Arc<Vec<u8>>,
    /// Face index inside `bytes` (non-zero for collections).
    pub index: u32,
}

impl FontBook {
    /// A book with no faces.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// A book over the host's installed fonts.
    pub fn system() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.faces().count(), "loaded system fonts");
        Self { db: Arc::new(db) }
    }

    /// A book over explicit font files held in memory.
    pub fn from_font_bytes(fonts: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        for bytes in fonts {
            db.load_font_data(bytes);
        }
        Self { db: Arc::new(db) }
    }

    /// Add a `.ttf`/`.otf`/`.ttc` file.
    pub fn add_font_file(&mut self, path: &Path) -> QrCardResult<()> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read font file '{}'", path.display()))?;
        let before = self.face_count();
        Arc::make_mut(&mut self.db).load_font_data(bytes);
        if self.face_count() == before {
            return Err(QrCardError::font(format!(
                "'{}' contains no usable font faces",
                path.display()
            )));
        }
        Ok(())
    }

    /// Number of faces known to the book.
    pub fn face_count(&self) -> usize {
        self.db.faces().count()
    }

    /// Whether the book has no faces at all.
    pub fn is_empty(&self) -> bool {
        self.db.faces().next().is_none()
    }

    /// Pick a face for `family`, falling back to generic sans-serif and then to any face.
    pub fn resolve(&self, family: &str) -> QrCardResult<ResolvedFont> {
        use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

        let requested = match family.trim().to_ascii_lowercase().as_str() {
            "sans-serif" => Family::SansSerif,
            "serif" => Family::Serif,
            "monospace" => Family::Monospace,
            "cursive" => Family::Cursive,
            "fantasy" => Family::Fantasy,
            _ => Family::Name(family.trim()),
        };
        let families = [requested, Family::SansSerif];
        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };

        let id = self
            .db
            .query(&query)
            .or_else(|| self.db.faces().next().map(|f| f.id))
            .ok_or_else(|| {
                QrCardError::font(format!("no font face available for family '{family}'"))
            })?;

        let (bytes, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| QrCardError::font(format!("font data for '{family}' is unreadable")))?;
        let chosen = self
            .db
            .face(id)
            .and_then(|f| f.families.first().map(|(name, _)| name.clone()))
            .unwrap_or_else(|| family.to_string());
        if !chosen.eq_ignore_ascii_case(family) {
            tracing::debug!(requested = family, chosen = %chosen, "caption font fell back");
        }

        Ok(ResolvedFont {
            family: chosen,
            bytes: Arc::new(bytes),
            index,
        })
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.face_count())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Caption ink carried through Parley as the layout brush.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

#[derive(Clone)]
/// Shaped caption: layout plus the font data its glyph ids refer to.
pub struct PreparedCaption {
    /// Single-line layout at pixel size.
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    /// Font bytes used to build glyph outlines.
    pub font_bytes: Arc<Vec<u8>>,
    /// Face index inside `font_bytes`.
    pub font_index: u32,
    /// Id of the Parley blob registered for `font_bytes`. Glyph runs whose font blob has
    /// another id were shaped with a fallback face.
    pub font_blob_id: u64,
    /// Family the layout was shaped with.
    pub font_family: String,
}

impl PreparedCaption {
    /// Advance width of the widest line, in pixels.
    pub fn width(&self) -> f32 {
        self.layout.width()
    }

    /// Height of the line box, in pixels.
    pub fn height(&self) -> f32 {
        self.layout.height()
    }
}

impl std::fmt::Debug for PreparedCaption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedCaption")
            .field("layout_ptr", &Arc::as_ptr(&self.layout))
            .field("font_bytes_len", &self.font_bytes.len())
            .field("font_family", &self.font_family)
            .finish()
    }
}

/// Shapes caption text with Parley. Holds the font and layout contexts between captions and
/// registers each face with Parley only once.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    registered: HashMap<FaceKey, RegisteredFace>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FaceKey {
    family: String,
    index: u32,
    len: usize,
}

#[derive(Clone, Debug)]
struct RegisteredFace {
    family: String,
    blob_id: u64,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Fresh contexts with no fonts registered yet.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
        }
    }

    /// Number of distinct faces registered so far.
    pub fn registered_faces(&self) -> usize {
        self.registered.len()
    }

    fn register(&mut self, font: &ResolvedFont) -> QrCardResult<RegisteredFace> {
        let key = FaceKey {
            family: font.family.clone(),
            index: font.index,
            len: font.bytes.len(),
        };
        if let Some(face) = self.registered.get(&key) {
            return Ok(face.clone());
        }

        let shared: Arc<dyn AsRef<[u8]> + Send + Sync> = font.bytes.clone();
        let blob = parley::fontique::Blob::new(shared);
        let blob_id = blob.id();
        let families = self.font_ctx.collection.register_fonts(blob, None);
        let family_id = families
            .iter()
            .map(|(id, _)| *id)
            .find(|id| {
                self.font_ctx
                    .collection
                    .family_name(*id)
                    .is_some_and(|name| name.eq_ignore_ascii_case(&font.family))
            })
            .or_else(|| families.first().map(|(id, _)| *id))
            .ok_or_else(|| QrCardError::font("no font families registered from font bytes"))?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| QrCardError::font("registered font family has no name"))?
            .to_string();

        let face = RegisteredFace { family, blob_id };
        self.registered.insert(key, face.clone());
        Ok(face)
    }

    /// Shape `text` on one line with `font`, at `size_px`.
    pub fn layout_line(
        &mut self,
        text: &str,
        font: &ResolvedFont,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> QrCardResult<PreparedCaption> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(QrCardError::invalid_input(
                "caption size must be finite and > 0",
            ));
        }

        let face = self.register(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(face.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(PreparedCaption {
            layout: Arc::new(layout),
            font_bytes: Arc::clone(&font.bytes),
            font_index: font.index,
            font_blob_id: face.blob_id,
            font_family: face.family,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
