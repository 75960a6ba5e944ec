//! TCS34725 colour/light sensor driver (clear channel only).
//!
//! Talks to the sensor through the `embedded-hal` 1.0 [`I2c`] trait so the
//! same driver runs on the ESP-IDF I²C master and on a host-side fake.
//!
//! Bring-up sequence:
//!
//! 1. ENABLE ← PON, wait ≥ 2.4 ms for the oscillator.
//! 2. ENABLE ← PON | AEN.
//! 3. ATIME ← integration time, CONTROL ← gain.
//! 4. Wait one integration period before the first read.
//!
//! Every register access sets the COMMAND bit; the clear-channel read uses
//! auto-increment so CDATAL/CDATAH come back in one transaction.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Fixed 7-bit bus address.
pub const ADDRESS: u8 = 0x29;

const COMMAND_BIT: u8 = 0x80;
const AUTO_INCREMENT: u8 = 0x20;

const REG_ENABLE: u8 = 0x00;
const REG_ATIME: u8 = 0x01;
const REG_CONTROL: u8 = 0x0F;
const REG_CDATAL: u8 = 0x14;

const ENABLE_PON: u8 = 0x01;
const ENABLE_AEN: u8 = 0x02;

const POWER_ON_DELAY_MS: u32 = 3;
const FIRST_SAMPLE_DELAY_MS: u32 = 100;

/// TCS34725 on an owned I²C bus handle.
pub struct Tcs34725<I2C> {
    i2c: I2C,
    integration_time: u8,
    gain: u8,
}

impl<I2C: I2c> Tcs34725<I2C> {
    pub fn new(i2c: I2C, integration_time: u8, gain: u8) -> Self {
        Self {
            i2c,
            integration_time,
            gain,
        }
    }

    /// Power the sensor up and start the RGBC engine.
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), I2C::Error> {
        self.write_reg(REG_ENABLE, ENABLE_PON)?;
        delay.delay_ms(POWER_ON_DELAY_MS);
        self.write_reg(REG_ENABLE, ENABLE_PON | ENABLE_AEN)?;
        self.write_reg(REG_ATIME, self.integration_time)?;
        self.write_reg(REG_CONTROL, self.gain)?;
        delay.delay_ms(FIRST_SAMPLE_DELAY_MS);
        Ok(())
    }

    /// Raw clear-channel count.
    pub fn read_clear(&mut self) -> Result<u16, I2C::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(ADDRESS, &[COMMAND_BIT | AUTO_INCREMENT | REG_CDATAL], &mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    /// Give the bus handle back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(ADDRESS, &[COMMAND_BIT | reg, value])
    }
}
