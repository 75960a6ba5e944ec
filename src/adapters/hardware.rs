//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the TCS34725 driver and routes pin and PWM access to the raw
//! helpers in [`hw_init`](crate::drivers::hw_init).  This is the only
//! module in the system that touches actual hardware.  On host builds the
//! helpers operate on an in-memory pin bank.
//!
//! The adapter is shared by the monitoring loop, the command path, and
//! every ramp task, so every method takes `&self`.  GPIO and LEDC writes
//! are single register accesses and need no locking; the I²C sensor sits
//! behind a mutex because a read is a multi-byte transaction.

use std::sync::{Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{info, warn};

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::hw_init;
use crate::error::HwError;
use crate::pins;
use crate::sensors::tcs34725::Tcs34725;

struct AmbientSensor<I2C, D> {
    driver: Tcs34725<I2C>,
    delay: D,
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, D> {
    ambient: Mutex<AmbientSensor<I2C, D>>,
}

impl<I2C: I2c, D: DelayNs> HardwareAdapter<I2C, D> {
    pub fn new(driver: Tcs34725<I2C>, delay: D) -> Self {
        Self {
            ambient: Mutex::new(AmbientSensor { driver, delay }),
        }
    }

    fn with_sensor<R>(&self, f: impl FnOnce(&mut AmbientSensor<I2C, D>) -> R) -> R {
        let mut guard = self.ambient.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I2C, D> SensorPort for HardwareAdapter<I2C, D>
where
    I2C: I2c + Send,
    D: DelayNs + Send,
{
    fn digital_read(&self, pin: i32) -> Result<bool, HwError> {
        hw_init::gpio_read(pin).map_err(|rc| {
            warn!("gpio_read({pin}) failed (rc={rc})");
            HwError::GpioReadFailed(pin)
        })
    }

    fn init_ambient_sensor(&self) -> Result<(), HwError> {
        self.with_sensor(|s| s.driver.init(&mut s.delay)).map_err(|e| {
            warn!("TCS34725 init failed: {:?}", e.kind());
            HwError::I2cFailed
        })?;
        info!("TCS34725 initialised");
        Ok(())
    }

    fn read_ambient_light(&self) -> Result<u16, HwError> {
        self.with_sensor(|s| s.driver.read_clear()).map_err(|e| {
            warn!("TCS34725 read failed: {:?}", e.kind());
            HwError::I2cFailed
        })
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I2C, D> ActuatorPort for HardwareAdapter<I2C, D>
where
    I2C: I2c + Send,
    D: DelayNs + Send,
{
    fn digital_write(&self, pin: i32, high: bool) -> Result<(), HwError> {
        hw_init::gpio_write(pin, high).map_err(|rc| {
            warn!("gpio_write({pin}) failed (rc={rc})");
            HwError::GpioWriteFailed(pin)
        })
    }

    fn set_pwm_duty(&self, pin: i32, duty: u8) -> Result<(), HwError> {
        let channel = pins::pwm_channel(pin).ok_or(HwError::NoPwmChannel(pin))?;
        hw_init::ledc_set(channel, duty.min(100)).map_err(|rc| {
            warn!("ledc_set(ch{channel}) failed (rc={rc})");
            HwError::PwmWriteFailed(pin)
        })
    }
}
