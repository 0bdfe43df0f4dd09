//! Deferred draw operations queued against an off-screen layer.

use tracing::debug;

use crate::decode::source::ImageSource;
use crate::draw::dsc::{DrawOutcome, ImageDrawDsc, RectDrawDsc};
use crate::draw::renderer::Renderer;
use crate::draw::surface::Surface;
use crate::foundation::area::Area;
use crate::foundation::core::{OPA_MIN, Opa};
use crate::foundation::error::BlitResult;
use crate::pixel::blend::{BlendMode, blend_row};

#[derive(Clone, Debug)]
/// One queued draw, owning copies of its descriptors. Coordinates are absolute.
pub enum DrawTask {
    /// Draw an image.
    Image {
        /// Placement, see [`Renderer::draw_image`].
        coords: Area,
        /// Image source.
        src: ImageSource,
        /// Descriptor.
        dsc: ImageDrawDsc,
    },
    /// Draw a rectangle.
    Rect {
        /// Rectangle bounds.
        coords: Area,
        /// Descriptor.
        dsc: RectDrawDsc,
    },
    /// Multiply the layer by a rounded-rect coverage and clear it outside.
    MaskRect {
        /// Kept region.
        area: Area,
        /// Corner radius.
        radius: i32,
    },
}

impl DrawTask {
    fn translated(&self, dx: i32, dy: i32) -> Self {
        match self {
            Self::Image { coords, src, dsc } => Self::Image {
                coords: coords.translate(dx, dy),
                src: src.clone(),
                dsc: *dsc,
            },
            Self::Rect { coords, dsc } => Self::Rect {
                coords: coords.translate(dx, dy),
                dsc: *dsc,
            },
            Self::MaskRect { area, radius } => Self::MaskRect {
                area: area.translate(dx, dy),
                radius: *radius,
            },
        }
    }
}

/// Off-screen surface covering `area` of its parent, with a queue of pending draws.
#[derive(Debug)]
pub struct Layer {
    area: Area,
    surface: Surface,
    queue: Vec<DrawTask>,
}

impl Layer {
    /// Transparent layer over `area`.
    pub fn new(area: Area) -> BlitResult<Self> {
        Ok(Self {
            area,
            surface: Surface::new(area.width().max(0) as u32, area.height().max(0) as u32)?,
            queue: Vec::new(),
        })
    }

    /// Region of the parent this layer covers.
    pub fn area(&self) -> Area {
        self.area
    }

    /// Layer pixels; `(0, 0)` is `area.x1, area.y1` of the parent.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Queue a draw.
    pub fn push(&mut self, task: DrawTask) {
        self.queue.push(task);
    }

    /// Pending draws.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Run and drop every queued draw in submission order.
    ///
    /// The renderer's clip is interpreted in parent coordinates for the duration. Active
    /// masks are sampled in layer coordinates.
    pub fn dispatch(&mut self, renderer: &mut Renderer) -> Vec<DrawOutcome> {
        let (dx, dy) = (-self.area.x1, -self.area.y1);
        let saved = renderer.clip();
        renderer.set_clip(saved.map(|c| c.translate(dx, dy)));
        let tasks = std::mem::take(&mut self.queue);
        debug!(tasks = tasks.len(), area = ?self.area, "dispatching layer");
        let outcomes = tasks
            .iter()
            .map(|t| match t.translated(dx, dy) {
                DrawTask::Image { coords, src, dsc } => {
                    renderer.draw_image(&mut self.surface, coords, &src, &dsc)
                }
                DrawTask::Rect { coords, dsc } => {
                    renderer.draw_rect(&mut self.surface, coords, &dsc)
                }
                DrawTask::MaskRect { area, radius } => {
                    renderer.mask_rect(&mut self.surface, area, radius)
                }
            })
            .collect();
        renderer.set_clip(saved);
        outcomes
    }

    /// Blend the layer onto `target` at its area.
    pub fn blend_into(&self, target: &mut Surface, opa: Opa, mode: BlendMode) {
        if opa <= OPA_MIN {
            return;
        }
        let Some(vis) = self.area.intersect(&target.area()) else {
            return;
        };
        for y in vis.y1..=vis.y2 {
            let row = self.surface.row((y - self.area.y1) as u32);
            let x0 = (vis.x1 - self.area.x1) as usize * 4;
            let src = &row[x0..x0 + vis.width() as usize * 4];
            blend_row(target.span_mut(y, vis.x1, vis.x2), src, None, opa, mode);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/task.rs"]
mod tests;
