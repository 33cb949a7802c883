use std::convert::Infallible;

use embedded_graphics::{pixelcolor::BinaryColor, prelude::*};

use crate::config::{PANEL_HEIGHT, PANEL_WIDTH};

const STRIDE: usize = (PANEL_WIDTH as usize).div_ceil(8);

// Native RAM layout of the 2.13" V4 panel: portrait, 122 px rows padded to 16 bytes.
pub const PANEL_LINE_BYTES: usize = (PANEL_HEIGHT as usize).div_ceil(8);
pub const PANEL_BUFFER_LEN: usize = PANEL_LINE_BYTES * PANEL_WIDTH as usize;

/// Bounding box of the pixels that differ between two frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Mutable drawing surface; `finish` turns it into an immutable [`Frame`].
#[derive(Clone)]
pub struct Canvas {
    bits: Vec<u8>,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            bits: vec![0; STRIDE * PANEL_HEIGHT as usize],
        }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, ink: bool) {
        if x < 0 || y < 0 || x >= PANEL_WIDTH as i32 || y >= PANEL_HEIGHT as i32 {
            return;
        }
        let (idx, mask) = bit_position(x as u32, y as u32);
        if ink {
            self.bits[idx] |= mask;
        } else {
            self.bits[idx] &= !mask;
        }
    }

    pub fn finish(self) -> Frame {
        Frame { bits: self.bits }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(PANEL_WIDTH, PANEL_HEIGHT)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set_pixel(point.x, point.y, color.is_on());
        }
        Ok(())
    }
}

/// A finished 250x122 monochrome bitmap. `true` pixels are ink (black).
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bits: Vec<u8>,
}

impl Frame {
    pub fn blank() -> Self {
        Canvas::new().finish()
    }

    pub fn width(&self) -> u32 {
        PANEL_WIDTH
    }

    pub fn height(&self) -> u32 {
        PANEL_HEIGHT
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= PANEL_WIDTH || y >= PANEL_HEIGHT {
            return false;
        }
        let (idx, mask) = bit_position(x, y);
        self.bits[idx] & mask != 0
    }

    pub fn ink_count(&self) -> u32 {
        self.bits.iter().map(|b| b.count_ones()).sum()
    }

    pub fn checksum(&self) -> u32 {
        crc32fast::hash(&self.bits)
    }

    /// Smallest rectangle covering every pixel that differs from `other`.
    pub fn dirty_region(&self, other: &Frame) -> Option<Region> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..PANEL_HEIGHT {
            let row = y as usize * STRIDE;
            for byte in 0..STRIDE {
                let diff = self.bits[row + byte] ^ other.bits[row + byte];
                if diff == 0 {
                    continue;
                }
                for bit in 0..8 {
                    if diff & (0x80 >> bit) == 0 {
                        continue;
                    }
                    let x = (byte * 8 + bit) as u32;
                    bounds = Some(match bounds {
                        None => (x, y, x, y),
                        Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                    });
                }
            }
        }
        bounds.map(|(x0, y0, x1, y1)| Region {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
    }

    /// Rotate into the panel's portrait RAM layout (bit set = white).
    pub fn to_panel_buffer(&self) -> Vec<u8> {
        let mut buf = vec![0xFF; PANEL_BUFFER_LEN];
        for y in 0..PANEL_HEIGHT {
            for x in 0..PANEL_WIDTH {
                if !self.pixel(x, y) {
                    continue;
                }
                let new_x = y as usize;
                let new_y = (PANEL_WIDTH - x - 1) as usize;
                buf[new_x / 8 + new_y * PANEL_LINE_BYTES] &= !(0x80 >> (new_x % 8));
            }
        }
        buf
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &PANEL_WIDTH)
            .field("height", &PANEL_HEIGHT)
            .field("crc", &format_args!("{:08x}", self.checksum()))
            .finish()
    }
}

fn bit_position(x: u32, y: u32) -> (usize, u8) {
    let idx = y as usize * STRIDE + x as usize / 8;
    (idx, 0x80 >> (x % 8))
}
