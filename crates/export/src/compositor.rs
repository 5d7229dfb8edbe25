//! Scene flattening
//!
//! Draws the base image and then every overlay in z-order onto a
//! tiny-skia canvas the size of the capture. Selection handles and other
//! chrome are not part of the scene, so they never reach the output.

use crate::{ExportError, ExportResult};
use ab_glyph::{Font, FontArc, PxScaleFont, ScaleFont};
use capture::PixelBuffer;
use scene::{Color, ImageOverlay, Overlay, Scene, StrokeOverlay, StyleSettings, TextOverlay};
use std::path::{Path, PathBuf};
use tiny_skia::{
    FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    PremultipliedColorU8, Rect, Stroke, Transform,
};

/// Fonts tried when no font is configured
const SYSTEM_FONTS: &[&str] = &[
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Load the configured font, falling back to common system fonts
pub fn load_font(preferred: Option<&Path>) -> Option<FontArc> {
    let candidates = preferred
        .map(Path::to_path_buf)
        .into_iter()
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from));

    for path in candidates {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        match FontArc::try_from_vec(bytes) {
            Ok(font) => {
                log::debug!("[EXPORT] Using font {:?}", path);
                return Some(font);
            }
            Err(e) => log::warn!("[EXPORT] Ignoring font {:?}: {}", path, e),
        }
    }

    log::warn!("[EXPORT] No usable font found; text overlays export without glyphs");
    None
}

/// Flattens scenes into bitmaps
#[derive(Clone, Default)]
pub struct Compositor {
    font: Option<FontArc>,
}

impl Compositor {
    pub fn new(font: Option<FontArc>) -> Self {
        Self { font }
    }

    pub fn from_settings(settings: &StyleSettings) -> Self {
        Self::new(load_font(settings.font_path.as_deref()))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render the base image and all overlays into one bitmap of the
    /// scene's size.
    ///
    /// Callers hide chrome and let a frame present before calling, the
    /// same way capture does.
    pub fn composite(&self, scene: &Scene) -> ExportResult<PixelBuffer> {
        let mut canvas = to_pixmap(scene.base().pixels())?;

        for (_, overlay) in scene.overlays_in_z_order() {
            match overlay {
                Overlay::Image(image) => draw_image(&mut canvas, image)?,
                Overlay::Stroke(stroke) => draw_stroke(&mut canvas, stroke),
                Overlay::Text(text) => self.draw_text(&mut canvas, text),
            }
        }

        from_pixmap(&canvas)
    }

    fn draw_text(&self, canvas: &mut Pixmap, text: &TextOverlay) {
        let (width, height) = match &self.font {
            Some(font) => measure_text(font, text),
            None => {
                let size = text.estimated_size();
                (size.width as f32, size.height as f32)
            }
        };
        let x = text.position.x as f32;
        let y = text.position.y as f32;

        let background = text.background();
        if !background.is_transparent() {
            if let Some(rect) = Rect::from_xywh(x, y, width, height) {
                canvas.fill_rect(rect, &solid(background), Transform::identity(), None);
            }
        }

        let Some(font) = &self.font else {
            return;
        };
        if text.content.is_empty() || text.foreground().is_transparent() {
            return;
        }
        if let Some(glyphs) = render_glyphs(font, text, width.ceil() as u32, height.ceil() as u32) {
            canvas.draw_pixmap(
                x.round() as i32,
                y.round() as i32,
                glyphs.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Straight RGBA in, premultiplied pixmap out
fn to_pixmap(pixels: &PixelBuffer) -> ExportResult<Pixmap> {
    let size = IntSize::from_wh(pixels.width(), pixels.height()).ok_or(ExportError::EmptyImage)?;
    let mut data = pixels.as_raw().to_vec();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u16;
        for c in &mut px[..3] {
            *c = ((*c as u16 * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size).ok_or(ExportError::EmptyImage)
}

fn from_pixmap(pixmap: &Pixmap) -> ExportResult<PixelBuffer> {
    let mut data = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    PixelBuffer::from_rgba(pixmap.width(), pixmap.height(), data).ok_or(ExportError::EmptyImage)
}

fn draw_image(canvas: &mut Pixmap, image: &ImageOverlay) -> ExportResult<()> {
    let b = image.bounds();
    if image.pixels().is_empty() || b.width <= 0.0 || b.height <= 0.0 {
        return Ok(());
    }
    let source = to_pixmap(image.pixels())?;

    // Rotation is applied modulo a full turn
    let angle = image.rotation.rem_euclid(360.0) as f32;
    let center = b.center();
    let placed = Transform::from_rotate_at(angle, center.x as f32, center.y as f32)
        .pre_translate(b.x as f32, b.y as f32);
    let scaled = placed.pre_scale(
        b.width as f32 / source.width() as f32,
        b.height as f32 / source.height() as f32,
    );

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    canvas.draw_pixmap(0, 0, source.as_ref(), &paint, scaled, None);

    if image.border.enabled {
        let thickness = image.border.tier.thickness();
        let inset = (thickness / 2.0) as f32;
        let frame = Rect::from_xywh(
            inset,
            inset,
            (b.width - thickness) as f32,
            (b.height - thickness) as f32,
        );
        if let Some(frame) = frame {
            let path = PathBuilder::from_rect(frame);
            let stroke = Stroke {
                width: thickness as f32,
                ..Stroke::default()
            };
            canvas.stroke_path(&path, &solid(image.border.color), &stroke, placed, None);
        }
    }
    Ok(())
}

fn draw_stroke(canvas: &mut Pixmap, stroke: &StrokeOverlay) {
    let mut pb = PathBuilder::new();
    for segment in stroke.segments() {
        pb.move_to(segment.start.x as f32, segment.start.y as f32);
        pb.line_to(segment.end.x as f32, segment.end.y as f32);
    }
    let Some(path) = pb.finish() else {
        return;
    };

    let style = Stroke {
        width: stroke.thickness as f32,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    canvas.stroke_path(&path, &solid(stroke.color), &style, Transform::identity(), None);
}

fn line_width(scaled: &PxScaleFont<&FontArc>, line: &str) -> f32 {
    let mut width = 0.0;
    let mut prev = None;
    for ch in line.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Text box size with padding, from real glyph metrics
fn measure_text(font: &FontArc, text: &TextOverlay) -> (f32, f32) {
    let scaled = font.as_scaled(text.font_size() as f32);
    let pad = text.padding() as f32;
    let widest = text
        .lines()
        .map(|line| line_width(&scaled, line))
        .fold(0.0f32, f32::max);
    let rows = text.lines().count().max(1) as f32;
    (
        widest + pad * 2.0,
        rows * (scaled.height() + scaled.line_gap()) + pad * 2.0,
    )
}

fn premultiplied(color: Color, alpha: u8) -> Option<PremultipliedColorU8> {
    let scale = |c: u8| ((c as u16 * alpha as u16 + 127) / 255) as u8;
    PremultipliedColorU8::from_rgba(scale(color.r), scale(color.g), scale(color.b), alpha)
}

/// Rasterize the text content into a transparent pixmap of the box size
fn render_glyphs(font: &FontArc, text: &TextOverlay, width: u32, height: u32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(width, height)?;
    let size = text.font_size() as f32;
    let scaled = font.as_scaled(size);
    let pad = text.padding() as f32;
    let line_height = scaled.height() + scaled.line_gap();
    let foreground = text.foreground();
    let stride = width as usize;
    let pixels = pixmap.pixels_mut();

    for (row, line) in text.lines().enumerate() {
        let baseline = pad + scaled.ascent() + row as f32 * line_height;
        let mut caret = pad;
        let mut prev = None;

        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(size, ab_glyph::point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i32 + gx as i32;
                let y = bounds.min.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * foreground.a as f32).round() as u8;
                let index = y as usize * stride + x as usize;
                if alpha <= pixels[index].alpha() {
                    return;
                }
                if let Some(px) = premultiplied(foreground, alpha) {
                    pixels[index] = px;
                }
            });
        }
    }

    Some(pixmap)
}
