//! Waveshare 2.13" V4 (SSD1680-class) e-paper driver.
//! Command sequences follow the vendor reference driver; the bus is split out
//! so the driver can run against rppal on the Pi or a recording mock in tests.

use crate::render::{Frame, PANEL_BUFFER_LEN};
use crate::{Error, Result};

pub mod fake;
pub mod rppal_bus;

/// Operations the refresh controller needs from a panel.
pub trait DisplayDriver {
    fn init(&mut self) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
    fn display(&mut self, frame: &Frame) -> Result<()>;
    fn display_partial(&mut self, frame: &Frame) -> Result<()>;
    fn sleep(&mut self) -> Result<()>;
}

/// Minimal trait to allow swapping the SPI/GPIO backend (for tests or rppal).
pub trait PanelBus {
    fn write_command(&mut self, cmd: u8) -> Result<()>;
    fn write_data(&mut self, data: &[u8]) -> Result<()>;
    fn set_reset(&mut self, high: bool) -> Result<()>;
    fn is_busy(&mut self) -> Result<bool>;
    fn delay_ms(&mut self, ms: u64);
}

// Panel RAM geometry (portrait).
const RAM_WIDTH: u16 = 122;
const RAM_HEIGHT: u16 = 250;

// Commands.
const CMD_DRIVER_OUTPUT: u8 = 0x01;
const CMD_DEEP_SLEEP: u8 = 0x10;
const CMD_DATA_ENTRY: u8 = 0x11;
const CMD_SW_RESET: u8 = 0x12;
const CMD_TEMP_SENSOR: u8 = 0x18;
const CMD_MASTER_ACTIVATE: u8 = 0x20;
const CMD_UPDATE_CONTROL_1: u8 = 0x21;
const CMD_UPDATE_CONTROL_2: u8 = 0x22;
const CMD_WRITE_RAM_BW: u8 = 0x24;
const CMD_BORDER: u8 = 0x3C;
const CMD_RAM_X_WINDOW: u8 = 0x44;
const CMD_RAM_Y_WINDOW: u8 = 0x45;
const CMD_RAM_X_COUNTER: u8 = 0x4E;
const CMD_RAM_Y_COUNTER: u8 = 0x4F;

const UPDATE_FULL: u8 = 0xF7;
const UPDATE_PARTIAL: u8 = 0xFF;

const BUSY_POLL_MS: u64 = 10;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 10_000;
const SLEEP_SETTLE_MS: u64 = 2_000;

/// 2.13" V4 panel driver.
pub struct Epd2in13V4<B: PanelBus> {
    bus: B,
    busy_timeout_ms: u64,
}

impl<B: PanelBus> Epd2in13V4<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn with_busy_timeout(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn reset(&mut self) -> Result<()> {
        self.bus.set_reset(true)?;
        self.bus.delay_ms(20);
        self.bus.set_reset(false)?;
        self.bus.delay_ms(2);
        self.bus.set_reset(true)?;
        self.bus.delay_ms(20);
        Ok(())
    }

    fn wait_until_idle(&mut self) -> Result<()> {
        let mut waited = 0;
        while self.bus.is_busy()? {
            if waited >= self.busy_timeout_ms {
                return Err(Error::BusyTimeout(self.busy_timeout_ms));
            }
            self.bus.delay_ms(BUSY_POLL_MS);
            waited += BUSY_POLL_MS;
        }
        Ok(())
    }

    fn command(&mut self, cmd: u8, data: &[u8]) -> Result<()> {
        self.bus.write_command(cmd)?;
        if !data.is_empty() {
            self.bus.write_data(data)?;
        }
        Ok(())
    }

    fn set_window(&mut self) -> Result<()> {
        let x_end = ((RAM_WIDTH - 1) >> 3) as u8;
        let y_end = RAM_HEIGHT - 1;
        self.command(CMD_RAM_X_WINDOW, &[0x00, x_end])?;
        self.command(
            CMD_RAM_Y_WINDOW,
            &[0x00, 0x00, (y_end & 0xFF) as u8, (y_end >> 8) as u8],
        )
    }

    fn set_cursor(&mut self) -> Result<()> {
        self.command(CMD_RAM_X_COUNTER, &[0x00])?;
        self.command(CMD_RAM_Y_COUNTER, &[0x00, 0x00])
    }

    fn driver_output(&mut self) -> Result<()> {
        let last_gate = RAM_HEIGHT - 1;
        self.command(
            CMD_DRIVER_OUTPUT,
            &[(last_gate & 0xFF) as u8, (last_gate >> 8) as u8, 0x00],
        )
    }

    fn activate(&mut self, mode: u8) -> Result<()> {
        self.command(CMD_UPDATE_CONTROL_2, &[mode])?;
        self.command(CMD_MASTER_ACTIVATE, &[])?;
        self.wait_until_idle()
    }

    fn write_ram(&mut self, buffer: &[u8]) -> Result<()> {
        if buffer.len() != PANEL_BUFFER_LEN {
            return Err(Error::InvalidArgs(format!(
                "panel buffer must be {PANEL_BUFFER_LEN} bytes, got {}",
                buffer.len()
            )));
        }
        self.command(CMD_WRITE_RAM_BW, buffer)
    }
}

impl<B: PanelBus> DisplayDriver for Epd2in13V4<B> {
    fn init(&mut self) -> Result<()> {
        self.reset()?;
        self.wait_until_idle()?;
        self.command(CMD_SW_RESET, &[])?;
        self.wait_until_idle()?;

        self.driver_output()?;
        self.command(CMD_DATA_ENTRY, &[0x03])?;
        self.set_window()?;
        self.set_cursor()?;
        self.command(CMD_BORDER, &[0x05])?;
        self.command(CMD_UPDATE_CONTROL_1, &[0x00, 0x80])?;
        self.command(CMD_TEMP_SENSOR, &[0x80])?;
        self.wait_until_idle()
    }

    fn clear(&mut self) -> Result<()> {
        self.write_ram(&[0xFF; PANEL_BUFFER_LEN])?;
        self.activate(UPDATE_FULL)
    }

    fn display(&mut self, frame: &Frame) -> Result<()> {
        self.write_ram(&frame.to_panel_buffer())?;
        self.activate(UPDATE_FULL)
    }

    fn display_partial(&mut self, frame: &Frame) -> Result<()> {
        // Short reset pulse, then reload the partial waveform settings.
        self.bus.set_reset(false)?;
        self.bus.delay_ms(1);
        self.bus.set_reset(true)?;

        self.command(CMD_BORDER, &[0x80])?;
        self.driver_output()?;
        self.command(CMD_DATA_ENTRY, &[0x03])?;
        self.set_window()?;
        self.set_cursor()?;
        self.write_ram(&frame.to_panel_buffer())?;
        self.activate(UPDATE_PARTIAL)
    }

    fn sleep(&mut self) -> Result<()> {
        self.command(CMD_DEEP_SLEEP, &[0x01])?;
        self.bus.delay_ms(SLEEP_SETTLE_MS);
        Ok(())
    }
}
