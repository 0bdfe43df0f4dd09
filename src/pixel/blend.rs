//! Straight-alpha per-pixel blending of `(source, mask, destination)` triples.

use crate::foundation::core::{OPA_COVER, Opa, Rgba8};
use crate::foundation::math::{lerp_u8, mul_div255_u8};

/// How a source color combines with the destination color before coverage is applied.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source over destination.
    #[default]
    Normal,
    /// `dst + src`, saturating.
    Additive,
    /// `dst - src`, saturating.
    Subtractive,
    /// `dst * src`.
    Multiply,
}

impl BlendMode {
    fn mix_channel(self, dc: u8, sc: u8) -> u8 {
        match self {
            Self::Normal => sc,
            Self::Additive => dc.saturating_add(sc),
            Self::Subtractive => dc.saturating_sub(sc),
            Self::Multiply => mul_div255_u8(u16::from(dc), u16::from(sc)),
        }
    }
}

/// Blend one source pixel into `dst` (4 bytes, straight RGBA) with an extra coverage `opa`.
///
/// Non-normal modes replace the source color by the mode's mix, weighted by how opaque
/// the destination already is, then composite it source-over.
pub fn blend_pixel(dst: &mut [u8], src: Rgba8, opa: Opa, mode: BlendMode) {
    let sa = mul_div255_u8(u16::from(src.a), u16::from(opa));
    if sa == 0 {
        return;
    }
    let da = dst[3];
    let sc = [src.r, src.g, src.b];

    let sc = if mode == BlendMode::Normal || da == 0 {
        sc
    } else {
        [0, 1, 2].map(|i| lerp_u8(sc[i], mode.mix_channel(dst[i], sc[i]), da))
    };

    if sa == OPA_COVER {
        dst[..3].copy_from_slice(&sc);
        dst[3] = OPA_COVER;
        return;
    }

    let sa32 = u32::from(sa);
    // Destination weight: da * (1 - sa), in 0..=255*255.
    let dw = u32::from(da) * (255 - sa32);
    let out_a_x255 = sa32 * 255 + dw;
    if out_a_x255 == 0 {
        dst.copy_from_slice(&[0, 0, 0, 0]);
        return;
    }
    for i in 0..3 {
        let num = u32::from(sc[i]) * sa32 * 255 + u32::from(dst[i]) * dw;
        dst[i] = ((num + out_a_x255 / 2) / out_a_x255).min(255) as u8;
    }
    dst[3] = ((out_a_x255 + 127) / 255).min(255) as u8;
}

/// Blend a row of RGBA source pixels into a row of RGBA destination pixels.
///
/// `mask`, when present, holds one coverage value per pixel.
pub fn blend_row(dst: &mut [u8], src: &[u8], mask: Option<&[Opa]>, opa: Opa, mode: BlendMode) {
    for (i, (d, s)) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)).enumerate() {
        let m = match mask {
            Some(m) => mul_div255_u8(u16::from(m[i]), u16::from(opa)),
            None => opa,
        };
        if m == 0 {
            continue;
        }
        blend_pixel(d, Rgba8::from_slice(s), m, mode);
    }
}

/// Blend a solid color into a row of RGBA destination pixels.
pub fn fill_row(dst: &mut [u8], color: Rgba8, mask: Option<&[Opa]>, opa: Opa, mode: BlendMode) {
    for (i, d) in dst.chunks_exact_mut(4).enumerate() {
        let m = match mask {
            Some(m) => mul_div255_u8(u16::from(m[i]), u16::from(opa)),
            None => opa,
        };
        if m == 0 {
            continue;
        }
        blend_pixel(d, color, m, mode);
    }
}

/// Move the RGB channels of `px` toward `color` by `opa`, keeping alpha.
pub fn recolor(px: Rgba8, color: Rgba8, opa: Opa) -> Rgba8 {
    if opa == 0 {
        return px;
    }
    Rgba8::new(
        lerp_u8(px.r, color.r, opa),
        lerp_u8(px.g, color.g, opa),
        lerp_u8(px.b, color.b, opa),
        px.a,
    )
}

/// [`recolor`] over a row of RGBA pixels.
pub fn recolor_row(row: &mut [u8], color: Rgba8, opa: Opa) {
    if opa == 0 {
        return;
    }
    for px in row.chunks_exact_mut(4) {
        let c = recolor(Rgba8::from_slice(px), color, opa);
        px.copy_from_slice(&c.to_array());
    }
}

/// Multiply every alpha of a row of RGBA pixels by the matching mask value.
pub fn apply_mask_to_alpha(row: &mut [u8], mask: &[Opa]) {
    for (px, &m) in row.chunks_exact_mut(4).zip(mask) {
        px[3] = mul_div255_u8(u16::from(px[3]), u16::from(m));
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(u16::from(px[0]), a);
        px[1] = mul_div255_u8(u16::from(px[1]), a);
        px[2] = mul_div255_u8(u16::from(px[2]), a);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/blend.rs"]
mod tests;
