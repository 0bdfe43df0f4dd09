use crate::foundation::error::BlitResult;
use crate::mask::engine::OpaMap;
use crate::pixel::format::try_alloc_bytes;

/// Triangular ("stack") kernel of `2 * radius + 1` taps in Q16, summing to exactly `1 << 16`.
pub(crate) fn stack_kernel_q16(radius: u32) -> Vec<u32> {
    if radius == 0 {
        return vec![1 << 16];
    }
    let r = radius as i64;
    let total = (r + 1) * (r + 1);
    let mut weights: Vec<u32> = (-r..=r)
        .map(|i| ((((r + 1 - i.abs()) << 16) + total / 2) / total) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + (1 << 16) - acc).clamp(0, 1 << 16) as u32;
    weights
}

/// Blur a coverage map in place with a separable stack blur; edges are clamped.
pub(crate) fn stack_blur_opa(map: &mut OpaMap, radius: u32) -> BlitResult<()> {
    if radius == 0 || map.width() == 0 || map.height() == 0 {
        return Ok(());
    }
    let k = stack_kernel_q16(radius);
    let (w, h) = (map.width(), map.height());
    let mut tmp = try_alloc_bytes(map.as_bytes().len())?;
    horizontal_q16(map.as_bytes(), &mut tmp, w, h, &k);
    vertical_q16(&tmp, map.as_bytes_mut(), w, h, &k);
    Ok(())
}

fn horizontal_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        let row = (y * w) as usize;
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                acc += u64::from(kw) * u64::from(src[row + sx as usize]);
            }
            dst[row + x as usize] = q16_to_u8(acc);
        }
    }
}

fn vertical_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                acc += u64::from(kw) * u64::from(src[(sy * w + x) as usize]);
            }
            dst[(y * w + x) as usize] = q16_to_u8(acc);
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/draw/blur.rs"]
mod tests;
