use crate::{epd::PanelBus, Error, Result};

// BCM pin numbers of the Waveshare e-Paper HAT. CS is the hardware CE0 line.
pub const RST_PIN: u8 = 17;
pub const DC_PIN: u8 = 25;
pub const BUSY_PIN: u8 = 24;
pub const SPI_CLOCK_HZ: u32 = 4_000_000;

// spidev rejects transfers above its default buffer size.
#[cfg(target_os = "linux")]
const SPI_CHUNK: usize = 4096;

#[cfg(target_os = "linux")]
fn map_hw_err(err: impl std::fmt::Display) -> Error {
    // Wrap rppal errors so the caller sees a standard IO error payload.
    Error::Io(std::io::Error::other(err.to_string()))
}

/// Linux implementation using rppal's SPI and GPIO.
#[cfg(target_os = "linux")]
pub struct RppalPanelBus {
    spi: rppal::spi::Spi,
    dc: rppal::gpio::OutputPin,
    rst: rppal::gpio::OutputPin,
    busy: rppal::gpio::InputPin,
}

#[cfg(target_os = "linux")]
impl RppalPanelBus {
    /// Open SPI0/CE0 and claim the HAT's control pins.
    pub fn new_default() -> Result<Self> {
        use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

        let spi = Spi::new(Bus::Spi0, SlaveSelect::Ss0, SPI_CLOCK_HZ, Mode::Mode0)
            .map_err(map_hw_err)?;
        let gpio = rppal::gpio::Gpio::new().map_err(map_hw_err)?;
        let dc = gpio.get(DC_PIN).map_err(map_hw_err)?.into_output_low();
        let rst = gpio.get(RST_PIN).map_err(map_hw_err)?.into_output_high();
        let busy = gpio.get(BUSY_PIN).map_err(map_hw_err)?.into_input();
        Ok(Self { spi, dc, rst, busy })
    }

    fn write_spi(&mut self, bytes: &[u8]) -> Result<()> {
        for chunk in bytes.chunks(SPI_CHUNK) {
            self.spi.write(chunk).map_err(map_hw_err)?;
        }
        Ok(())
    }
}

#[cfg(target_os = "linux")]
impl PanelBus for RppalPanelBus {
    fn write_command(&mut self, cmd: u8) -> Result<()> {
        self.dc.set_low();
        self.write_spi(&[cmd])
    }

    fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.dc.set_high();
        self.write_spi(data)
    }

    fn set_reset(&mut self, high: bool) -> Result<()> {
        if high {
            self.rst.set_high();
        } else {
            self.rst.set_low();
        }
        Ok(())
    }

    fn is_busy(&mut self) -> Result<bool> {
        Ok(self.busy.is_high())
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

/// Non-Linux stub to satisfy builds on dev hosts; returns errors at runtime.
#[cfg(not(target_os = "linux"))]
pub struct RppalPanelBus;

#[cfg(not(target_os = "linux"))]
impl RppalPanelBus {
    pub fn new_default() -> Result<Self> {
        Err(Error::InvalidArgs(
            "RppalPanelBus is only available on Linux targets".into(),
        ))
    }
}

#[cfg(not(target_os = "linux"))]
impl PanelBus for RppalPanelBus {
    fn write_command(&mut self, _cmd: u8) -> Result<()> {
        Err(Error::InvalidArgs(
            "RppalPanelBus is only available on Linux targets".into(),
        ))
    }

    fn write_data(&mut self, _data: &[u8]) -> Result<()> {
        Err(Error::InvalidArgs(
            "RppalPanelBus is only available on Linux targets".into(),
        ))
    }

    fn set_reset(&mut self, _high: bool) -> Result<()> {
        Err(Error::InvalidArgs(
            "RppalPanelBus is only available on Linux targets".into(),
        ))
    }

    fn is_busy(&mut self) -> Result<bool> {
        Err(Error::InvalidArgs(
            "RppalPanelBus is only available on Linux targets".into(),
        ))
    }

    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}
