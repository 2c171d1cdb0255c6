//! Placement geometry
//!
//! Signature rectangles are given in the coordinate system a reader sees:
//! origin at the top-left corner of the visible page, y growing downward,
//! units of PDF points. PDF content is drawn in user space, which has its
//! origin at the bottom-left of the MediaBox and is rotated by `/Rotate` before
//! display. This module converts between the two.

/// Placement rectangle in visible-page points (top-left origin)
///
/// Only non-finite values are rejected (see [`Rect::is_finite`]): negative
/// sizes produce a mirrored image and rectangles outside the page are drawn
/// (and clipped) as-is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Whether every component is a real number; NaN and infinities have no
    /// representation in a content stream
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|value| value.is_finite())
    }

    /// Largest rectangle with the image's aspect ratio, centered inside this one
    ///
    /// Degenerate rectangles and empty images are returned unchanged.
    pub fn fit_within(&self, image_width: u32, image_height: u32) -> Rect {
        if self.width <= 0.0 || self.height <= 0.0 || image_width == 0 || image_height == 0 {
            return *self;
        }

        let scale = (self.width / image_width as f32).min(self.height / image_height as f32);
        let width = image_width as f32 * scale;
        let height = image_height as f32 * scale;

        Rect {
            x: self.x + (self.width - width) / 2.0,
            y: self.y + (self.height - height) / 2.0,
            width,
            height,
        }
    }
}

/// How the image fills the placement rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFit {
    /// Scale the image to exactly the rectangle
    #[default]
    Stretch,
    /// Keep the image's aspect ratio, centered in the rectangle
    Contain,
}

/// A PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .all(|value| value.is_finite())
    }

    /// Operands followed by the `cm` operator, ready for a content stream
    pub fn to_cm_operator(&self) -> String {
        format!(
            "{} {} {} {} {} {} cm",
            format_number(self.a),
            format_number(self.b),
            format_number(self.c),
            format_number(self.d),
            format_number(self.e),
            format_number(self.f),
        )
    }
}

/// Format a number for a content stream without exponent or trailing zeros
pub fn format_number(value: f32) -> String {
    // -0 and tiny float noise both print as 0
    if value.abs() < 0.0005 {
        return "0".to_string();
    }

    let text = format!("{:.3}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

/// US Letter MediaBox, used when a page declares none
pub const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// The visible area of a page and its display rotation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Visible box in user space, normalized so x0 <= x1 and y0 <= y1
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    /// Clockwise display rotation: 0, 90, 180 or 270
    pub rotation: u16,
}

impl PageGeometry {
    /// Build from a page box `[llx lly urx ury]` and a `/Rotate` value
    ///
    /// Rotations that are not a multiple of 90 are treated as 0.
    pub fn new(page_box: [f32; 4], rotate: i64) -> Self {
        let [ax, ay, bx, by] = page_box;
        let normalized = rotate.rem_euclid(360);
        let rotation = if normalized % 90 == 0 { normalized as u16 } else { 0 };

        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
            rotation,
        }
    }

    /// US Letter, unrotated
    pub fn letter() -> Self {
        Self::new(LETTER, 0)
    }

    /// Width and height as displayed, after rotation
    pub fn visible_size(&self) -> (f32, f32) {
        let width = self.x1 - self.x0;
        let height = self.y1 - self.y0;
        match self.rotation {
            90 | 270 => (height, width),
            _ => (width, height),
        }
    }

    /// Map a visible-page point (top-left origin, y down) to user space
    fn to_user_space(&self, x: f32, y: f32) -> (f32, f32) {
        match self.rotation {
            90 => (self.x0 + y, self.y0 + x),
            180 => (self.x1 - x, self.y0 + y),
            270 => (self.x1 - y, self.y1 - x),
            _ => (self.x0 + x, self.y1 - y),
        }
    }

    /// Matrix mapping an image's unit square onto `rect`, upright as displayed
    ///
    /// Image space has (0, 0) at the bottom-left of the picture, so the
    /// origin goes to the rectangle's bottom-left corner in visible space.
    pub fn image_matrix(&self, rect: &Rect) -> Matrix {
        let bottom = rect.y + rect.height;
        let (ox, oy) = self.to_user_space(rect.x, bottom);
        let (rx, ry) = self.to_user_space(rect.x + rect.width, bottom);
        let (ux, uy) = self.to_user_space(rect.x, rect.y);

        Matrix {
            a: rx - ox,
            b: ry - oy,
            c: ux - ox,
            d: uy - oy,
            e: ox,
            f: oy,
        }
    }
}
