//! Overlay objects layered above the captured image

use crate::geometry::{distance_to_segment, Bounds, Point, Size};
use crate::style::{clamp_font_size, Color};
use capture::PixelBuffer;
use std::sync::Arc;

/// Operations an overlay may take part in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Movable,
    Resizable,
    Rotatable,
    Editable,
    Deletable,
}

impl Capability {
    const fn bit(self) -> u8 {
        match self {
            Capability::Movable => 1,
            Capability::Resizable => 1 << 1,
            Capability::Rotatable => 1 << 2,
            Capability::Editable => 1 << 3,
            Capability::Deletable => 1 << 4,
        }
    }
}

/// Set of capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const fn of(caps: &[Capability]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < caps.len() {
            bits |= caps[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn contains(self, cap: Capability) -> bool {
        self.0 & cap.bit() != 0
    }
}

pub const TEXT_CAPABILITIES: Capabilities =
    Capabilities::of(&[Capability::Movable, Capability::Editable, Capability::Deletable]);
pub const IMAGE_CAPABILITIES: Capabilities = Capabilities::of(&[
    Capability::Movable,
    Capability::Resizable,
    Capability::Rotatable,
    Capability::Deletable,
]);
pub const STROKE_CAPABILITIES: Capabilities = Capabilities::of(&[Capability::Deletable]);

/// Smallest width/height an image can be resized to
pub const MIN_OVERLAY_SIZE: f64 = 50.0;
/// Pick radius around resize and rotate handles
pub const HANDLE_RADIUS: f64 = 8.0;
/// Distance of the rotate handle above the top edge
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;
/// Extra pick slack around stroke segments
pub const STROKE_HIT_TOLERANCE: f64 = 3.0;

const TEXT_PADDING: f64 = 4.0;
const TEXT_ADVANCE_RATIO: f64 = 0.6;
const TEXT_LINE_RATIO: f64 = 1.25;

/// Font size and colors shared between text overlays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub foreground: Color,
    pub background: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub position: Point,
    pub content: String,
    font_size: f64,
    foreground: Color,
    background: Color,
    editing: bool,
}

impl TextOverlay {
    pub fn new(position: Point, style: TextStyle) -> Self {
        Self {
            position,
            content: String::new(),
            font_size: clamp_font_size(style.font_size),
            foreground: style.foreground,
            background: style.background,
            editing: false,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Set the font size, clamped to [8, 200]
    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = clamp_font_size(size);
    }

    pub fn foreground(&self) -> Color {
        self.foreground
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_foreground(&mut self, color: Color) {
        self.foreground = color;
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            foreground: self.foreground,
            background: self.background,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    /// Box size estimated from character counts; the compositor measures
    /// glyphs when a font is available.
    pub fn estimated_size(&self) -> Size {
        let columns = self.lines().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
        let rows = self.lines().count().max(1);
        Size::new(
            columns as f64 * self.font_size * TEXT_ADVANCE_RATIO + TEXT_PADDING * 2.0,
            rows as f64 * self.font_size * TEXT_LINE_RATIO + TEXT_PADDING * 2.0,
        )
    }

    pub fn padding(&self) -> f64 {
        TEXT_PADDING
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_origin_size(self.position, self.estimated_size())
    }
}

/// Border thickness tier of an image overlay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BorderTier {
    #[default]
    Thin,
    Thick,
}

impl BorderTier {
    pub fn from_index(index: u8) -> Self {
        if index == 0 {
            BorderTier::Thin
        } else {
            BorderTier::Thick
        }
    }

    pub fn index(self) -> u8 {
        match self {
            BorderTier::Thin => 0,
            BorderTier::Thick => 1,
        }
    }

    pub fn thickness(self) -> f64 {
        match self {
            BorderTier::Thin => 2.0,
            BorderTier::Thick => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageBorder {
    pub enabled: bool,
    pub tier: BorderTier,
    pub color: Color,
}

impl ImageBorder {
    pub fn new(color: Color) -> Self {
        Self {
            enabled: false,
            tier: BorderTier::Thin,
            color,
        }
    }
}

/// Corner handle; `x_dir`/`y_dir` are -1 for left/top and +1 for right/bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub x_dir: i8,
    pub y_dir: i8,
}

impl Corner {
    pub const TOP_LEFT: Corner = Corner { x_dir: -1, y_dir: -1 };
    pub const TOP_RIGHT: Corner = Corner { x_dir: 1, y_dir: -1 };
    pub const BOTTOM_LEFT: Corner = Corner { x_dir: -1, y_dir: 1 };
    pub const BOTTOM_RIGHT: Corner = Corner { x_dir: 1, y_dir: 1 };
    pub const ALL: [Corner; 4] = [
        Corner::TOP_LEFT,
        Corner::TOP_RIGHT,
        Corner::BOTTOM_LEFT,
        Corner::BOTTOM_RIGHT,
    ];
}

/// Manipulation handle shown on a selected image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Resize(Corner),
    Rotate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageOverlay {
    pub position: Point,
    pub size: Size,
    /// Degrees, unbounded; rendering treats it modulo 360
    pub rotation: f64,
    pub border: ImageBorder,
    pixels: Arc<PixelBuffer>,
}

impl ImageOverlay {
    pub fn new(pixels: PixelBuffer, position: Point, border_color: Color) -> Self {
        let size = Size::new(pixels.width() as f64, pixels.height() as f64);
        Self {
            position,
            size,
            rotation: 0.0,
            border: ImageBorder::new(border_color),
            pixels: Arc::new(pixels),
        }
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_origin_size(self.position, self.size)
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.position = bounds.origin();
        self.size = bounds.size();
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Map a scene point into the unrotated frame of this image
    fn unrotate(&self, p: Point) -> Point {
        p.rotate_about(self.center(), -self.rotation)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.bounds().contains(self.unrotate(p))
    }

    /// Scene position of a handle, following the rotation
    pub fn handle_position(&self, handle: Handle) -> Point {
        let b = self.bounds();
        let local = match handle {
            Handle::Resize(corner) => Point::new(
                if corner.x_dir < 0 { b.x } else { b.x + b.width },
                if corner.y_dir < 0 { b.y } else { b.y + b.height },
            ),
            Handle::Rotate => Point::new(b.x + b.width / 2.0, b.y - ROTATE_HANDLE_OFFSET),
        };
        local.rotate_about(b.center(), self.rotation)
    }

    pub fn handle_at(&self, p: Point) -> Option<Handle> {
        std::iter::once(Handle::Rotate)
            .chain(Corner::ALL.iter().map(|c| Handle::Resize(*c)))
            .find(|h| self.handle_position(*h).distance(p) <= HANDLE_RADIUS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeMode {
    Freehand,
    Arrow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }
}

/// Freehand stroke or arrow; immutable once its gesture ends
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeOverlay {
    segments: Vec<Segment>,
    pub color: Color,
    pub thickness: f64,
    pub mode: StrokeMode,
}

impl StrokeOverlay {
    pub fn new(mode: StrokeMode, color: Color, thickness: f64) -> Self {
        Self {
            segments: Vec::new(),
            color,
            thickness,
            mode,
        }
    }

    /// A finished stroke built from known segments
    pub fn from_segments(
        mode: StrokeMode,
        color: Color,
        thickness: f64,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            segments,
            color,
            thickness,
            mode,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub(crate) fn replace_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
    }

    pub fn contains(&self, p: Point) -> bool {
        let reach = self.thickness / 2.0 + STROKE_HIT_TOLERANCE;
        self.segments
            .iter()
            .any(|s| distance_to_segment(p, s.start, s.end) <= reach)
    }

    pub fn bounds(&self) -> Bounds {
        let mut points = self.segments.iter().flat_map(|s| [s.start, s.end]);
        let Some(first) = points.next() else {
            return Bounds::default();
        };
        let (mut min, mut max) = (first, first);
        for p in points {
            min = Point::new(min.x.min(p.x), min.y.min(p.y));
            max = Point::new(max.x.max(p.x), max.y.max(p.y));
        }
        let pad = self.thickness / 2.0;
        Bounds::new(min.x - pad, min.y - pad, max.x - min.x + pad * 2.0, max.y - min.y + pad * 2.0)
    }
}

/// Annotation object owned by a scene
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Text(TextOverlay),
    Image(ImageOverlay),
    Stroke(StrokeOverlay),
}

impl Overlay {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Overlay::Text(_) => TEXT_CAPABILITIES,
            Overlay::Image(_) => IMAGE_CAPABILITIES,
            Overlay::Stroke(_) => STROKE_CAPABILITIES,
        }
    }

    pub fn can(&self, cap: Capability) -> bool {
        self.capabilities().contains(cap)
    }

    pub fn contains(&self, p: Point) -> bool {
        match self {
            Overlay::Text(text) => text.bounds().contains(p),
            Overlay::Image(image) => image.contains(p),
            Overlay::Stroke(stroke) => stroke.contains(p),
        }
    }

    pub fn bounds(&self) -> Bounds {
        match self {
            Overlay::Text(text) => text.bounds(),
            Overlay::Image(image) => image.bounds(),
            Overlay::Stroke(stroke) => stroke.bounds(),
        }
    }

    /// Top-left anchor of a movable overlay
    pub fn position(&self) -> Option<Point> {
        match self {
            Overlay::Text(text) => Some(text.position),
            Overlay::Image(image) => Some(image.position),
            Overlay::Stroke(_) => None,
        }
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        match self {
            Overlay::Text(text) => text.position = position,
            Overlay::Image(image) => image.position = position,
            Overlay::Stroke(_) => {}
        }
    }

    pub fn as_text(&self) -> Option<&TextOverlay> {
        match self {
            Overlay::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageOverlay> {
        match self {
            Overlay::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_stroke(&self) -> Option<&StrokeOverlay> {
        match self {
            Overlay::Stroke(stroke) => Some(stroke),
            _ => None,
        }
    }
}

/// Resize `initial` by dragging `corner` by `delta`.
///
/// The opposite corner stays fixed. With `aspect_lock` the axis with the
/// larger change wins and the other follows the initial aspect ratio.
pub fn resize_bounds(initial: Bounds, corner: Corner, delta: Point, aspect_lock: bool) -> Bounds {
    let x_dir = corner.x_dir as f64;
    let y_dir = corner.y_dir as f64;

    let mut width = (initial.width + delta.x * x_dir).max(MIN_OVERLAY_SIZE);
    let mut height = (initial.height + delta.y * y_dir).max(MIN_OVERLAY_SIZE);

    if aspect_lock && initial.width > 0.0 && initial.height > 0.0 {
        let aspect = initial.width / initial.height;
        if (width - initial.width).abs() > (height - initial.height).abs() {
            height = width / aspect;
        } else {
            width = height * aspect;
        }
    }

    let x = if corner.x_dir < 0 { initial.x - (width - initial.width) } else { initial.x };
    let y = if corner.y_dir < 0 { initial.y - (height - initial.height) } else { initial.y };

    Bounds::new(x, y, width, height)
}

/// Rotation after dragging from `start` to `current` around `center`
pub fn rotated_angle(initial_angle: f64, center: Point, start: Point, current: Point) -> f64 {
    initial_angle + ((current - center).angle_degrees() - (start - center).angle_degrees())
}
