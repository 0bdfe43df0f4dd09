use crate::pixel::blend::BlendMode;

/// Per-channel weighting factor of a blend equation `out = src*Fs + dst*Fd`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendFactor {
    /// `0`
    Zero = 0,
    /// `1`
    One = 1,
    /// Source color.
    SrcColor = 2,
    /// `1 - source color`.
    InvSrcColor = 3,
    /// Source alpha.
    SrcAlpha = 4,
    /// `1 - source alpha`.
    InvSrcAlpha = 5,
    /// Destination alpha.
    DstAlpha = 6,
    /// `1 - destination alpha`.
    InvDstAlpha = 7,
    /// Destination color.
    DstColor = 8,
    /// `1 - destination color`.
    InvDstColor = 9,
}

impl BlendFactor {
    /// Parse the 8-bit field value.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::SrcColor,
            3 => Self::InvSrcColor,
            4 => Self::SrcAlpha,
            5 => Self::InvSrcAlpha,
            6 => Self::DstAlpha,
            7 => Self::InvDstAlpha,
            8 => Self::DstColor,
            9 => Self::InvDstColor,
            _ => return None,
        })
    }
}

/// How the weighted source and destination terms are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendEquation {
    /// `src*Fs + dst*Fd`
    #[default]
    Add = 0,
    /// `dst*Fd - src*Fs`
    ReverseSubtract = 1,
}

/// Packed GPU blend configuration: `src_factor (bits 0-7) | dst_factor (bits 8-15) |
/// equation (bits 16-19) | extra_ops (bits 20-31)`.
///
/// The layout is a driver-facing contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlendWord(u32);

impl BlendWord {
    /// Modulate source RGB toward the recolor constant.
    pub const RECOLOR: u32 = 1 << 20;
    /// Sample through a lookup table (indexed textures).
    pub const LUT: u32 = 1 << 21;
    /// Stencil test in screen space.
    pub const STENCIL_XY: u32 = 1 << 22;
    /// Stencil test in texture space.
    pub const STENCIL_TXTY: u32 = 1 << 23;
    /// Skip the raster-op blender.
    pub const NO_USE_ROPBL: u32 = 1 << 24;
    /// Invert the destination color key test.
    pub const DST_CKEY_NEG: u32 = 1 << 25;
    /// Premultiply the source before blending.
    pub const SRC_PREMULT: u32 = 1 << 26;
    /// Multiply source alpha by the constant alpha.
    pub const MODULATE_A: u32 = 1 << 27;
    /// Replace source alpha by the constant alpha.
    pub const FORCE_A: u32 = 1 << 28;
    /// Multiply source RGB by the constant color.
    pub const MODULATE_RGB: u32 = 1 << 29;
    /// Discard source texels equal to the color key.
    pub const SRC_CKEY: u32 = 1 << 30;
    /// Only write where the destination equals the color key.
    pub const DST_CKEY: u32 = 1 << 31;

    const OPS_MASK: u32 = 0xFFF0_0000;

    /// Pack two factors and extra-op flags. Flags outside bits 20-31 are dropped.
    pub const fn new(src: BlendFactor, dst: BlendFactor, ops: u32) -> Self {
        Self((src as u32) | ((dst as u32) << 8) | (ops & Self::OPS_MASK))
    }

    /// Same word with a different combining equation.
    pub const fn with_equation(self, eq: BlendEquation) -> Self {
        Self((self.0 & !0x000F_0000) | ((eq as u32) << 16))
    }

    /// Source-over with straight alpha.
    pub const fn src_over() -> Self {
        Self::new(BlendFactor::SrcAlpha, BlendFactor::InvSrcAlpha, 0)
    }

    /// Overwrite the destination.
    pub const fn copy() -> Self {
        Self::new(BlendFactor::One, BlendFactor::Zero, 0)
    }

    /// Multiply destination alpha by source alpha, leaving destination color untouched.
    pub const fn mask() -> Self {
        Self::new(BlendFactor::Zero, BlendFactor::SrcAlpha, 0)
    }

    /// Standard word for a [`BlendMode`].
    pub const fn from_mode(mode: BlendMode) -> Self {
        match mode {
            BlendMode::Normal => Self::src_over(),
            BlendMode::Additive => Self::new(BlendFactor::SrcAlpha, BlendFactor::One, 0),
            BlendMode::Subtractive => Self::new(BlendFactor::SrcAlpha, BlendFactor::One, 0)
                .with_equation(BlendEquation::ReverseSubtract),
            BlendMode::Multiply => Self::new(BlendFactor::DstColor, BlendFactor::InvSrcAlpha, 0),
        }
    }

    /// Inverse of [`BlendWord::from_mode`] for the four standard words.
    pub fn mode(self) -> Option<BlendMode> {
        let base = self.without_ops(Self::MODULATE_A | Self::MODULATE_RGB);
        [
            BlendMode::Normal,
            BlendMode::Additive,
            BlendMode::Subtractive,
            BlendMode::Multiply,
        ]
        .into_iter()
        .find(|&m| Self::from_mode(m) == base)
    }

    /// Raw 32-bit value.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Rebuild from a raw value, rejecting unknown factors and equations.
    pub fn from_bits(bits: u32) -> Option<Self> {
        if (bits >> 16) & 0xf > BlendEquation::ReverseSubtract as u32 {
            return None;
        }
        BlendFactor::from_u8((bits & 0xff) as u8)?;
        BlendFactor::from_u8(((bits >> 8) & 0xff) as u8)?;
        Some(Self(bits))
    }

    /// Source factor.
    pub fn src_factor(self) -> BlendFactor {
        BlendFactor::from_u8((self.0 & 0xff) as u8).unwrap_or(BlendFactor::One)
    }

    /// Destination factor.
    pub fn dst_factor(self) -> BlendFactor {
        BlendFactor::from_u8(((self.0 >> 8) & 0xff) as u8).unwrap_or(BlendFactor::Zero)
    }

    /// Combining equation.
    pub fn equation(self) -> BlendEquation {
        match (self.0 >> 16) & 0xf {
            1 => BlendEquation::ReverseSubtract,
            _ => BlendEquation::Add,
        }
    }

    /// Extra-op flags (bits 20-31).
    pub const fn ops(self) -> u32 {
        self.0 & Self::OPS_MASK
    }

    /// `true` when every bit of `op` is set.
    pub const fn has(self, op: u32) -> bool {
        op != 0 && self.0 & op == op
    }

    /// Same word with `ops` added.
    pub const fn with_ops(self, ops: u32) -> Self {
        Self(self.0 | (ops & Self::OPS_MASK))
    }

    /// Same word with `ops` cleared.
    pub const fn without_ops(self, ops: u32) -> Self {
        Self(self.0 & !(ops & Self::OPS_MASK))
    }
}

impl Default for BlendWord {
    fn default() -> Self {
        Self::src_over()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pixel/blend_word.rs"]
mod tests;
