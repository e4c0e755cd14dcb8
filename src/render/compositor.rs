use crate::{
    foundation::{
        core::RasterImage,
        error::{MemeError, MemeResult},
    },
    render::text::{CaptionFont, FontSource, ShapedLine, TextLayoutEngine},
    session::editing::{CaptionPair, EditingSession, RenderedOutput},
};

/// Fixed caption look: outlined, upper-cased, bold display face.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Caption font size.
    pub font_size_px: f32,
    /// Distance from the top/bottom edge to the caption's glyph box.
    pub inset_px: f32,
    /// Outline width.
    pub stroke_width_px: f32,
    /// Straight RGBA8 fill color.
    pub fill_rgba: [u8; 4],
    /// Straight RGBA8 outline color.
    pub stroke_rgba: [u8; 4],
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size_px: 50.0,
            inset_px: 10.0,
            stroke_width_px: 4.0,
            fill_rgba: [255, 255, 255, 255],
            stroke_rgba: [0, 0, 0, 255],
        }
    }
}

impl CaptionStyle {
    /// Reject non-finite or out-of-range sizes.
    pub fn validate(&self) -> MemeResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(MemeError::validation("caption font size must be > 0"));
        }
        if !self.inset_px.is_finite() || self.inset_px < 0.0 {
            return Err(MemeError::validation("caption inset must be >= 0"));
        }
        if !self.stroke_width_px.is_finite() || self.stroke_width_px < 0.0 {
            return Err(MemeError::validation("caption stroke width must be >= 0"));
        }
        Ok(())
    }
}

struct CaptionText {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
}

impl CaptionText {
    fn load(source: &FontSource) -> MemeResult<Self> {
        let font = CaptionFont::resolve(source)?;
        let engine = TextLayoutEngine::new(&font)?;
        tracing::debug!(family = engine.family_name(), "caption font ready");
        Ok(Self {
            engine,
            font: font.font_data(),
        })
    }
}

struct Surface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

/// Flattens a background raster and two captions into one raster of the background's size.
///
/// The drawing surface and the background paint are kept between calls so that redrawing on
/// every caption keystroke only re-shapes and re-rasterizes the text. The caption font is
/// resolved on the first non-blank caption.
pub struct Compositor {
    style: CaptionStyle,
    font_source: FontSource,
    text: Option<CaptionText>,
    surface: Option<Surface>,
    background: Option<(RasterImage, vello_cpu::Image)>,
}

impl Compositor {
    /// Compositor with `style`; the font is loaded on first use.
    pub fn new(style: CaptionStyle, font_source: FontSource) -> MemeResult<Self> {
        style.validate()?;
        Ok(Self {
            style,
            font_source,
            text: None,
            surface: None,
            background: None,
        })
    }

    /// The caption look.
    pub fn style(&self) -> &CaptionStyle {
        &self.style
    }

    /// Draw the session's background and captions. Without a background this is a no-op
    /// returning `Ok(None)`; on success the result is recorded as the session's output.
    #[tracing::instrument(skip_all)]
    pub fn render(&mut self, session: &mut EditingSession) -> MemeResult<Option<RasterImage>> {
        let Some(background) = session.image().cloned() else {
            tracing::debug!("no background selected, nothing to render");
            return Ok(None);
        };
        let captions = session.captions().clone();

        let image = self.compose(&background, &captions)?;
        session.set_output(RenderedOutput {
            image: image.clone(),
            captions,
        });
        Ok(Some(image))
    }

    /// Composite `background` with `captions` without touching any session.
    pub fn compose(
        &mut self,
        background: &RasterImage,
        captions: &CaptionPair,
    ) -> MemeResult<RasterImage> {
        let width: u16 = background
            .width()
            .try_into()
            .map_err(|_| MemeError::render("surface width exceeds u16"))?;
        let height: u16 = background
            .height()
            .try_into()
            .map_err(|_| MemeError::render("surface height exceeds u16"))?;

        let top = self.shape_caption(&captions.top_text)?;
        let bottom = self.shape_caption(&captions.bottom_text)?;
        let paint = self.background_paint(background)?;

        let (w, h) = (f64::from(width), f64::from(height));
        let mut ctx = vello_cpu::RenderContext::new(width, height);

        ctx.set_transform(vello_cpu::kurbo::Affine::scale_non_uniform(
            w / f64::from(background.width()),
            h / f64::from(background.height()),
        ));
        ctx.set_paint(paint);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(background.width()),
            f64::from(background.height()),
        ));

        let inset = f64::from(self.style.inset_px);
        if let Some(line) = &top {
            let dy = inset + f64::from(line.ascent) - f64::from(line.baseline);
            self.draw_caption(&mut ctx, line, centered_x(w, line), dy)?;
        }
        if let Some(line) = &bottom {
            let dy = h - inset - f64::from(line.descent) - f64::from(line.baseline);
            self.draw_caption(&mut ctx, line, centered_x(w, line), dy)?;
        }
        ctx.flush();

        let surface = self.ensure_surface(width, height);
        clear_pixmap(&mut surface.pixmap);
        ctx.render_to_pixmap(&mut surface.pixmap);

        tracing::debug!(
            width,
            height,
            top = top.is_some(),
            bottom = bottom.is_some(),
            "composited meme"
        );
        RasterImage::from_rgba8_premul(
            u32::from(width),
            u32::from(height),
            surface.pixmap.data_as_u8_slice().to_vec(),
        )
    }

    fn shape_caption(&mut self, caption: &str) -> MemeResult<Option<ShapedLine>> {
        if caption.trim().is_empty() {
            return Ok(None);
        }
        if self.text.is_none() {
            self.text = Some(CaptionText::load(&self.font_source)?);
        }
        let Some(text) = self.text.as_mut() else {
            return Err(MemeError::font("caption font unavailable"));
        };
        let line = text
            .engine
            .shape_line(&caption.to_uppercase(), self.style.font_size_px)?;
        Ok(Some(line))
    }

    fn draw_caption(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        line: &ShapedLine,
        dx: f64,
        dy: f64,
    ) -> MemeResult<()> {
        let Some(text) = self.text.as_ref() else {
            return Err(MemeError::font("caption font unavailable"));
        };

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((dx, dy)));

        if self.style.stroke_width_px > 0.0 {
            let [r, g, b, a] = self.style.stroke_rgba;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(f64::from(
                self.style.stroke_width_px,
            )));
            ctx.glyph_run(&text.font)
                .font_size(line.font_size)
                .stroke_glyphs(line.glyphs.iter().cloned());
        }

        let [r, g, b, a] = self.style.fill_rgba;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.glyph_run(&text.font)
            .font_size(line.font_size)
            .fill_glyphs(line.glyphs.iter().cloned());
        Ok(())
    }

    fn background_paint(&mut self, background: &RasterImage) -> MemeResult<vello_cpu::Image> {
        if let Some((cached, paint)) = &self.background
            && cached.shares_pixels_with(background)
        {
            return Ok(paint.clone());
        }

        let pixmap = raster_to_pixmap(background)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.background = Some((background.clone(), paint.clone()));
        Ok(paint)
    }

    fn ensure_surface(&mut self, width: u16, height: u16) -> &mut Surface {
        let stale = self
            .surface
            .as_ref()
            .is_none_or(|s| s.width != width || s.height != height);
        if stale {
            self.surface = None;
        }
        self.surface.get_or_insert_with(|| Surface {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }
}

fn centered_x(surface_width: f64, line: &ShapedLine) -> f64 {
    (surface_width - f64::from(line.width)) / 2.0
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn raster_to_pixmap(img: &RasterImage) -> MemeResult<vello_cpu::Pixmap> {
    let w: u16 = img
        .width()
        .try_into()
        .map_err(|_| MemeError::render("image width exceeds u16"))?;
    let h: u16 = img
        .height()
        .try_into()
        .map_err(|_| MemeError::render("image height exceeds u16"))?;

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(img.width() as usize * img.height() as usize);
    for px in img.as_premul_bytes().chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
