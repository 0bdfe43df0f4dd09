use crate::foundation::core::{OPA_COVER, OPA_TRANSP, Opa, Point, Rgba8};
use crate::foundation::error::ErrorCode;
use crate::pixel::blend::BlendMode;

/// Zoom factor meaning "no scaling".
pub const ZOOM_NONE: u16 = 256;

/// How an image is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageDrawDsc {
    /// Overall opacity.
    pub opa: Opa,
    /// Recolor target; also the color of alpha-only images.
    pub recolor: Rgba8,
    /// How far pixels are pulled toward `recolor`.
    pub recolor_opa: Opa,
    /// Blend mode.
    pub blend_mode: BlendMode,
    /// Rotation in tenths of a degree, clockwise.
    pub angle: i32,
    /// Scale, `256` is 1.0.
    pub zoom: u16,
    /// Rotation/zoom center relative to the image's top-left; `None` is the image center.
    pub pivot: Option<Point>,
    /// Corner radius clipping the image.
    pub radius: i32,
    /// Bilinear sampling for transformed draws (nearest otherwise).
    pub antialias: bool,
    /// Animation frame.
    pub frame_id: u32,
}

impl Default for ImageDrawDsc {
    fn default() -> Self {
        Self {
            opa: OPA_COVER,
            recolor: Rgba8::BLACK,
            recolor_opa: OPA_TRANSP,
            blend_mode: BlendMode::Normal,
            angle: 0,
            zoom: ZOOM_NONE,
            pivot: None,
            radius: 0,
            antialias: true,
            frame_id: 0,
        }
    }
}

impl ImageDrawDsc {
    /// Whether rotation or scaling is requested.
    pub fn has_transform(&self) -> bool {
        self.angle.rem_euclid(3600) != 0 || self.zoom != ZOOM_NONE
    }
}

/// Which sides of a rectangle a border covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BorderSide(u8);

impl BorderSide {
    /// No side.
    pub const NONE: Self = Self(0);
    /// Bottom edge.
    pub const BOTTOM: Self = Self(1);
    /// Top edge.
    pub const TOP: Self = Self(2);
    /// Left edge.
    pub const LEFT: Self = Self(4);
    /// Right edge.
    pub const RIGHT: Self = Self(8);
    /// Every edge.
    pub const FULL: Self = Self(15);

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether every side in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two side sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for BorderSide {
    fn default() -> Self {
        Self::FULL
    }
}

/// How a rectangle is drawn: shadow, then background, then border, then outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RectDrawDsc {
    /// Corner radius, or [`crate::RADIUS_CIRCLE`].
    pub radius: i32,
    /// Blend mode for every part.
    pub blend_mode: BlendMode,

    /// Background color.
    pub bg_color: Rgba8,
    /// Background opacity.
    pub bg_opa: Opa,

    /// Border color.
    pub border_color: Rgba8,
    /// Border thickness, drawn inside the rectangle.
    pub border_width: i32,
    /// Border opacity.
    pub border_opa: Opa,
    /// Sides the border is drawn on.
    pub border_side: BorderSide,

    /// Outline color.
    pub outline_color: Rgba8,
    /// Outline thickness, drawn outside the rectangle.
    pub outline_width: i32,
    /// Gap between the rectangle and the outline.
    pub outline_pad: i32,
    /// Outline opacity.
    pub outline_opa: Opa,

    /// Shadow color.
    pub shadow_color: Rgba8,
    /// Blur extent; `0` gives a sharp shadow.
    pub shadow_width: i32,
    /// Horizontal shadow offset.
    pub shadow_ofs_x: i32,
    /// Vertical shadow offset.
    pub shadow_ofs_y: i32,
    /// Grows (or shrinks, if negative) the shadow before blurring.
    pub shadow_spread: i32,
    /// Shadow opacity.
    pub shadow_opa: Opa,
}

impl Default for RectDrawDsc {
    fn default() -> Self {
        Self {
            radius: 0,
            blend_mode: BlendMode::Normal,
            bg_color: Rgba8::WHITE,
            bg_opa: OPA_COVER,
            border_color: Rgba8::BLACK,
            border_width: 0,
            border_opa: OPA_COVER,
            border_side: BorderSide::FULL,
            outline_color: Rgba8::BLACK,
            outline_width: 0,
            outline_pad: 0,
            outline_opa: OPA_COVER,
            shadow_color: Rgba8::BLACK,
            shadow_width: 0,
            shadow_ofs_x: 0,
            shadow_ofs_y: 0,
            shadow_spread: 0,
            shadow_opa: OPA_COVER,
        }
    }
}

/// What a draw call ended up doing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Everything requested was drawn.
    Drawn,
    /// Nothing was visible (clipped away, fully transparent, masked out).
    Invisible,
    /// The source could not be resolved; a placeholder box was drawn instead.
    Fallback(String),
    /// The base shape was drawn but a decorative part was skipped.
    Degraded(ErrorCode),
    /// The call was abandoned before drawing.
    Abandoned(ErrorCode),
}

impl DrawOutcome {
    /// Whether anything reached the target.
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Drawn | Self::Fallback(_) | Self::Degraded(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/dsc.rs"]
mod tests;
