use smallvec::SmallVec;

use crate::foundation::area::Area;
use crate::foundation::core::{OPA_COVER, OPA_TRANSP, Opa};
use crate::foundation::error::{BlitError, BlitResult};
use crate::foundation::math::mul_div255_u8;
use crate::gpu::driver::{GpuDriver, TextureFormat, TextureId};
use crate::mask::angle::AngleMask;
use crate::mask::radius::RadiusMask;
use crate::mask::simple::{FadeMask, MapMask, RectMask};
use crate::pixel::format::try_alloc_bytes;

/// Number of simultaneously active masks.
pub const MASK_SLOTS: usize = 16;

/// Outcome of sampling masks over one scanline segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskResult {
    /// Every pixel is zero; the run can be skipped.
    Transparent,
    /// Every pixel is fully opaque; masking can be skipped.
    FullCover,
    /// Mixed coverage was written into the buffer.
    Changed,
}

/// Stable handle of an active mask. Handles are reused after removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaskId(u8);

impl MaskId {
    /// Slot index.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// One mask descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum Mask {
    /// Rounded rectangle (inner or outer).
    Radius(RadiusMask),
    /// Angular wedge.
    Angle(AngleMask),
    /// Rectangular clip.
    Rect(RectMask),
    /// Vertical fade.
    Fade(FadeMask),
    /// Explicit bitmap.
    Map(MapMask),
}

impl Mask {
    /// Multiply this mask's coverage into `buf`, the run starting at `(abs_x, abs_y)`.
    fn apply_row(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        match self {
            Self::Radius(m) => m.apply_row(buf, abs_x, abs_y),
            Self::Angle(m) => m.apply_row(buf, abs_x, abs_y),
            Self::Rect(m) => m.apply_row(buf, abs_x, abs_y),
            Self::Fade(m) => m.apply_row(buf, abs_x, abs_y),
            Self::Map(m) => m.apply_row(buf, abs_x, abs_y),
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    mask: Mask,
    owner: Option<u64>,
}

/// Fixed slot array of active masks, combined by multiplying coverage.
///
/// Adds and removes are expected to nest within one draw call.
#[derive(Clone, Debug, Default)]
pub struct MaskEngine {
    slots: [Option<Slot>; MASK_SLOTS],
}

impl MaskEngine {
    /// Empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `mask` in the first free slot.
    pub fn add(&mut self, mask: Mask) -> BlitResult<MaskId> {
        self.insert(mask, None)
    }

    /// Register `mask` tagged with `owner`, removable in bulk with [`MaskEngine::remove_owner`].
    pub fn add_with_owner(&mut self, mask: Mask, owner: u64) -> BlitResult<MaskId> {
        self.insert(mask, Some(owner))
    }

    fn insert(&mut self, mask: Mask, owner: Option<u64>) -> BlitResult<MaskId> {
        let Some(idx) = self.slots.iter().position(Option::is_none) else {
            tracing::warn!(slots = MASK_SLOTS, "mask slots exhausted");
            return Err(BlitError::validation(format!(
                "all {MASK_SLOTS} mask slots are in use"
            )));
        };
        self.slots[idx] = Some(Slot { mask, owner });
        Ok(MaskId(idx as u8))
    }

    /// Deactivate `id`, returning its descriptor.
    pub fn remove(&mut self, id: MaskId) -> Option<Mask> {
        self.slots
            .get_mut(id.index())
            .and_then(Option::take)
            .map(|s| s.mask)
    }

    /// Remove every mask added with `owner`; returns how many were removed.
    pub fn remove_owner(&mut self, owner: u64) -> usize {
        let mut n = 0;
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|s| s.owner == Some(owner)) {
                *slot = None;
                n += 1;
            }
        }
        n
    }

    /// Descriptor registered under `id`.
    pub fn get(&self, id: MaskId) -> Option<&Mask> {
        self.slots.get(id.index())?.as_ref().map(|s| &s.mask)
    }

    /// Number of active masks.
    pub fn count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// `true` when no mask is active.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Ids of all active masks in slot order.
    pub fn active_ids(&self) -> SmallVec<[MaskId; MASK_SLOTS]> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| MaskId(i as u8))
            .collect()
    }

    /// Sample every active mask over `buf.len()` pixels starting at `(abs_x, abs_y)`.
    ///
    /// `buf` is overwritten with the combined coverage. With no active masks the result
    /// is [`MaskResult::FullCover`].
    pub fn apply(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32) -> MaskResult {
        self.apply_filtered(buf, abs_x, abs_y, None)
    }

    /// Like [`MaskEngine::apply`] but restricted to `ids`. Unknown ids are ignored.
    pub fn apply_ids(&self, buf: &mut [Opa], abs_x: i32, abs_y: i32, ids: &[MaskId]) -> MaskResult {
        self.apply_filtered(buf, abs_x, abs_y, Some(ids))
    }

    fn apply_filtered(
        &self,
        buf: &mut [Opa],
        abs_x: i32,
        abs_y: i32,
        ids: Option<&[MaskId]>,
    ) -> MaskResult {
        buf.fill(OPA_COVER);
        if buf.is_empty() {
            return MaskResult::FullCover;
        }
        let mut changed = false;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            if ids.is_some_and(|ids| !ids.contains(&MaskId(i as u8))) {
                continue;
            }
            match slot.mask.apply_row(buf, abs_x, abs_y) {
                MaskResult::Transparent => {
                    buf.fill(OPA_TRANSP);
                    return MaskResult::Transparent;
                }
                MaskResult::FullCover => {}
                MaskResult::Changed => changed = true,
            }
        }
        if !changed {
            return MaskResult::FullCover;
        }
        classify(buf)
    }

    /// Sample `ids` (or every active mask when `None`) over a whole area.
    pub fn dump(&self, area: Area, ids: Option<&[MaskId]>) -> BlitResult<OpaMap> {
        let mut map = OpaMap::new(area.width() as u32, area.height() as u32)?;
        for y in area.y1..=area.y2 {
            // Short-circuited rows come back already filled with 0 or 255.
            self.apply_filtered(map.row_mut((y - area.y1) as u32), area.x1, y, ids);
        }
        Ok(map)
    }

    /// Sample masks over `area` straight into a new `A8` texture, row by row.
    ///
    /// Transparent rows are not uploaded; new textures start out transparent.
    pub fn dump_to_texture<D: GpuDriver + ?Sized>(
        &self,
        driver: &mut D,
        area: Area,
        ids: Option<&[MaskId]>,
    ) -> BlitResult<TextureId> {
        let w = area.width() as u32;
        let h = area.height() as u32;
        let mut row = try_alloc_bytes(w as usize)?;
        let tex = driver.create_texture(w, h, TextureFormat::A8)?;
        for y in area.y1..=area.y2 {
            if self.apply_filtered(&mut row, area.x1, y, ids) == MaskResult::Transparent {
                continue;
            }
            let ty = y - area.y1;
            let region = Area::new(0, ty, w as i32 - 1, ty);
            if let Err(err) = driver.upload(tex, region, &row, w as usize) {
                driver.destroy_texture(tex);
                return Err(err);
            }
        }
        Ok(tex)
    }
}

/// Multiply per-pixel coverage `cov(i)` into `buf` and classify the coverage itself.
pub(crate) fn mul_row(buf: &mut [Opa], mut cov: impl FnMut(usize) -> Opa) -> MaskResult {
    let mut all_transp = true;
    let mut all_cover = true;
    for (i, m) in buf.iter_mut().enumerate() {
        let c = cov(i);
        if c != OPA_TRANSP {
            all_transp = false;
        }
        if c != OPA_COVER {
            all_cover = false;
            *m = mul_div255_u8(u16::from(*m), u16::from(c));
        }
    }
    if all_transp {
        MaskResult::Transparent
    } else if all_cover {
        MaskResult::FullCover
    } else {
        MaskResult::Changed
    }
}

pub(crate) fn classify(buf: &[Opa]) -> MaskResult {
    if buf.iter().all(|&m| m == OPA_COVER) {
        MaskResult::FullCover
    } else if buf.iter().all(|&m| m == OPA_TRANSP) {
        MaskResult::Transparent
    } else {
        MaskResult::Changed
    }
}

/// Row-major single-channel coverage bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpaMap {
    width: u32,
    height: u32,
    data: Vec<Opa>,
}

impl OpaMap {
    /// Zeroed `width x height` map; allocation failure is reported, not fatal.
    pub fn new(width: u32, height: u32) -> BlitResult<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| BlitError::validation("opacity map size overflow"))?;
        Ok(Self {
            width,
            height,
            data: try_alloc_bytes(len)?,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Coverage at `(x, y)`, zero outside the map.
    pub fn get(&self, x: u32, y: u32) -> Opa {
        if x >= self.width || y >= self.height {
            return OPA_TRANSP;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Set coverage at `(x, y)`; ignored outside the map.
    pub fn set(&mut self, x: u32, y: u32, v: Opa) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = v;
        }
    }

    /// Row `y`.
    pub fn row(&self, y: u32) -> &[Opa] {
        let w = self.width as usize;
        &self.data[y as usize * w..(y as usize + 1) * w]
    }

    /// Mutable row `y`.
    pub fn row_mut(&mut self, y: u32) -> &mut [Opa] {
        let w = self.width as usize;
        &mut self.data[y as usize * w..(y as usize + 1) * w]
    }

    /// All coverage bytes.
    pub fn as_bytes(&self) -> &[Opa] {
        &self.data
    }

    /// Mutable coverage bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [Opa] {
        &mut self.data
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/engine.rs"]
mod tests;
