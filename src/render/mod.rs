//! Fixed-layout dashboard rendering.

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Line, PrimitiveStyle, Rectangle},
};

use crate::config::PANEL_WIDTH;
use crate::metrics::MetricsSnapshot;

pub mod font;
pub mod frame;

pub use font::{FontSet, FontSize, FontSource};
pub use frame::{Canvas, Frame, Region, PANEL_BUFFER_LEN};

const HEADER_RULE_Y: i32 = 23;
const NETWORK_Y: i32 = 30;
const METRICS_Y: i32 = 75;
const METRICS_RULE_Y: i32 = METRICS_Y - 10;
const BOX_WIDTH: i32 = 47;
const BOX_HEIGHT: i32 = 40;
const BOX_SPACING: i32 = 3;
const BOX_START_X: i32 = 2;

/// Turns a [`MetricsSnapshot`] into a [`Frame`]. Holds only the fonts.
pub struct FrameRenderer {
    fonts: FontSet,
}

impl FrameRenderer {
    pub fn new(fonts: FontSet) -> Self {
        Self { fonts }
    }

    pub fn fonts(&self) -> &FontSet {
        &self.fonts
    }

    pub fn render(&self, snapshot: &MetricsSnapshot) -> Frame {
        let mut canvas = Canvas::new();
        self.draw_header(&mut canvas, snapshot);
        self.draw_network(&mut canvas, snapshot);
        self.draw_metric_boxes(&mut canvas, snapshot);
        canvas.finish()
    }

    fn draw_header(&self, canvas: &mut Canvas, snapshot: &MetricsSnapshot) {
        self.text(canvas, 5, 2, &snapshot.hostname, FontSize::Large);
        let stamp = snapshot.captured_at.format("%Y-%m-%d %H:%M").to_string();
        self.text(canvas, 90, 2, &stamp, FontSize::Small);
        rule(canvas, HEADER_RULE_Y);
    }

    fn draw_network(&self, canvas: &mut Canvas, snapshot: &MetricsSnapshot) {
        self.text(canvas, 5, NETWORK_Y, "Network Info:", FontSize::Normal);
        self.text(
            canvas,
            130,
            NETWORK_Y,
            &format!("Net: {}", snapshot.internet),
            FontSize::Small,
        );
        self.text(
            canvas,
            10,
            NETWORK_Y + 20,
            &format!("IP: {}", snapshot.lan_ip),
            FontSize::Small,
        );
        self.text(
            canvas,
            130,
            NETWORK_Y + 20,
            &format!("WiFi: {}", snapshot.wifi_signal),
            FontSize::Small,
        );
    }

    fn draw_metric_boxes(&self, canvas: &mut Canvas, snapshot: &MetricsSnapshot) {
        rule(canvas, METRICS_RULE_Y);
        for (i, (label, value)) in metric_tiles(snapshot).iter().enumerate() {
            let x = BOX_START_X + i as i32 * (BOX_WIDTH + BOX_SPACING);
            let _ = Rectangle::with_corners(
                Point::new(x, METRICS_Y),
                Point::new(x + BOX_WIDTH, METRICS_Y + BOX_HEIGHT),
            )
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(canvas);
            self.text(canvas, x + 5, METRICS_Y + 2, label, FontSize::Tiny);
            self.text(canvas, x + 5, METRICS_Y + 15, value, FontSize::Small);
        }
    }

    fn text(&self, canvas: &mut Canvas, x: i32, y: i32, text: &str, size: FontSize) {
        self.fonts.draw(canvas, Point::new(x, y), text, size);
    }
}

/// Label/value pairs for the five boxes, left to right.
pub fn metric_tiles(snapshot: &MetricsSnapshot) -> [(&'static str, String); 5] {
    [
        ("CPU", snapshot.cpu_pct.map(format_percent).to_string()),
        ("TEMP", snapshot.temp_c.map(|t| format!("{t:.1}°C")).to_string()),
        ("MEM", snapshot.mem_pct.map(format_percent).to_string()),
        ("DISK", snapshot.disk_pct.map(format_percent).to_string()),
        ("UP", snapshot.uptime.to_string()),
    ]
}

fn format_percent(value: f32) -> String {
    format!("{value:.1}%")
}

fn rule(canvas: &mut Canvas, y: i32) {
    let _ = Line::new(Point::new(0, y), Point::new(PANEL_WIDTH as i32, y))
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(canvas);
}
