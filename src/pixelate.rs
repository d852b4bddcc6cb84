//! Mosaic sampling over a captured RGBA buffer, and the stepped sweeps that
//! grow or shrink the block size.

use crate::error::{EffectError, EffectResult};

/// Captured RGBA8 pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> EffectResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(EffectError::dom(format!(
                "raster {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let pos = (x as usize + y as usize * self.width as usize) * 4;
        [self.data[pos], self.data[pos + 1], self.data[pos + 2]]
    }

    pub fn rgba(&self, x: u32, y: u32) -> [u8; 4] {
        let pos = (x as usize + y as usize * self.width as usize) * 4;
        [
            self.data[pos],
            self.data[pos + 1],
            self.data[pos + 2],
            self.data[pos + 3],
        ]
    }

    fn fill(&mut self, block: &Block) {
        let x_end = block.x.saturating_add(block.size).min(self.width);
        let y_end = block.y.saturating_add(block.size).min(self.height);
        for y in block.y..y_end {
            for x in block.x..x_end {
                let pos = (x as usize + y as usize * self.width as usize) * 4;
                self.data[pos..pos + 3].copy_from_slice(&block.rgb);
                self.data[pos + 3] = 255;
            }
        }
    }
}

/// One flat rectangle of the mosaic. `size` may overhang the raster edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub x: u32,
    pub y: u32,
    pub size: u32,
    pub rgb: [u8; 3],
}

impl Block {
    pub fn css_color(&self) -> String {
        let [r, g, b] = self.rgb;
        format!("rgb({r}, {g}, {b})")
    }
}

/// Blocks of edge `size` covering `source`, each coloured by its top-left pixel.
pub fn mosaic(source: &Raster, size: u32) -> impl Iterator<Item = Block> + '_ {
    let size = size.max(1);
    (0..source.height).step_by(size as usize).flat_map(move |y| {
        (0..source.width).step_by(size as usize).map(move |x| Block {
            x,
            y,
            size,
            rgb: source.rgb(x, y),
        })
    })
}

/// Rasterise the mosaic of `source` at `size` on the CPU.
pub fn pixelate(source: &Raster, size: u32) -> Raster {
    let mut out = Raster::blank(source.width, source.height);
    for block in mosaic(source, size) {
        out.fill(&block);
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Block size grows from `base` to `base * steps`.
    Coarsen,
    /// Block size shrinks from `base * steps` to `base`.
    Refine,
}

/// A fixed number of evenly spaced redraws at changing block size.
///
/// The first step is due at `start`; each following step is due one
/// `interval` after the previous one.
#[derive(Clone, Debug, PartialEq)]
pub struct Sweep {
    base: u32,
    steps: u32,
    direction: Direction,
    interval_ms: f64,
    drawn: u32,
    next_due_ms: f64,
}

impl Sweep {
    pub fn new(base: u32, steps: u32, duration_ms: f64, direction: Direction, start_ms: f64) -> Self {
        let steps = steps.max(1);
        Self {
            base: base.max(1),
            steps,
            direction,
            interval_ms: duration_ms / steps as f64,
            drawn: 0,
            next_due_ms: start_ms,
        }
    }

    /// Block size the given zero-based draw uses, clamped at `u32::MAX`.
    fn size_at(&self, index: u32) -> u32 {
        let multiplier = match self.direction {
            Direction::Coarsen => index + 1,
            Direction::Refine => self.steps - index,
        };
        self.base.saturating_mul(multiplier)
    }

    pub fn is_done(&self) -> bool {
        self.drawn >= self.steps
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        (!self.is_done()).then_some(self.next_due_ms)
    }

    /// Take the step due at or before `now`, returning its block size and due time.
    pub fn advance(&mut self, now_ms: f64) -> Option<(u32, f64)> {
        if self.is_done() || self.next_due_ms > now_ms {
            return None;
        }
        let size = self.size_at(self.drawn);
        let due = self.next_due_ms;
        self.drawn += 1;
        self.next_due_ms += self.interval_ms;
        Some((size, due))
    }
}
