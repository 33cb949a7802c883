//! Font selection for the renderer.
//!
//! A TrueType/TrueType-collection file is preferred and rasterised with
//! `fontdue`; when no candidate file exists, or the file does not parse, the
//! built-in `embedded-graphics` bitmap fonts are used instead.

use std::path::{Path, PathBuf};

use embedded_graphics::{
    mono_font::{iso_8859_1, MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Baseline, Text},
};
use fontdue::{Font, FontSettings};

use super::frame::Canvas;
use crate::{Error, Result};

// Coverage at or above this value becomes ink.
const INK_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    Tiny,
    Small,
    Normal,
    Large,
}

impl FontSize {
    fn pixels(self) -> f32 {
        match self {
            FontSize::Tiny => 10.0,
            FontSize::Small => 12.0,
            FontSize::Normal => 16.0,
            FontSize::Large => 20.0,
        }
    }

    fn builtin(self) -> &'static MonoFont<'static> {
        match self {
            FontSize::Tiny => &iso_8859_1::FONT_5X8,
            FontSize::Small => &iso_8859_1::FONT_6X10,
            FontSize::Normal => &iso_8859_1::FONT_7X13,
            FontSize::Large => &iso_8859_1::FONT_9X15_BOLD,
        }
    }
}

/// Where the active font came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    Builtin,
    BuiltinAfterError { path: PathBuf, reason: String },
}

enum Face {
    TrueType(Box<Font>),
    Builtin,
}

pub struct FontSet {
    face: Face,
    source: FontSource,
}

impl FontSet {
    pub fn builtin() -> Self {
        Self {
            face: Face::Builtin,
            source: FontSource::Builtin,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = Font::from_bytes(data, FontSettings::default()).map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("cannot parse font {}: {e}", path.display()),
            ))
        })?;
        Ok(Self {
            face: Face::TrueType(Box::new(font)),
            source: FontSource::File(path.to_path_buf()),
        })
    }

    /// Pick the first existing candidate; never fails.
    pub fn discover(candidates: &[PathBuf]) -> Self {
        let Some(path) = candidates.iter().find(|p| p.exists()) else {
            return Self::builtin();
        };
        match Self::load(path) {
            Ok(set) => set,
            Err(err) => Self {
                face: Face::Builtin,
                source: FontSource::BuiltinAfterError {
                    path: path.clone(),
                    reason: err.to_string(),
                },
            },
        }
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Draw `text` with its top-left corner at `origin`.
    pub fn draw(&self, canvas: &mut Canvas, origin: Point, text: &str, size: FontSize) {
        match &self.face {
            Face::Builtin => {
                let style = MonoTextStyle::new(size.builtin(), BinaryColor::On);
                // Drawing into a Canvas cannot fail.
                let _ = Text::with_baseline(text, origin, style, Baseline::Top).draw(canvas);
            }
            Face::TrueType(font) => draw_truetype(font, canvas, origin, text, size.pixels()),
        }
    }
}

fn draw_truetype(font: &Font, canvas: &mut Canvas, origin: Point, text: &str, px: f32) {
    let ascent = font
        .horizontal_line_metrics(px)
        .map_or(px, |m| m.ascent)
        .round() as i32;
    let baseline = origin.y + ascent;
    let mut pen_x = origin.x as f32;

    for ch in text.chars() {
        let (metrics, coverage) = font.rasterize(ch, px);
        let left = pen_x.round() as i32 + metrics.xmin;
        let top = baseline - metrics.ymin - metrics.height as i32;
        for gy in 0..metrics.height {
            for gx in 0..metrics.width {
                if coverage[gy * metrics.width + gx] >= INK_THRESHOLD {
                    canvas.set_pixel(left + gx as i32, top + gy as i32, true);
                }
            }
        }
        pen_x += metrics.advance_width;
    }
}
