//! One-shot hardware peripheral initialization and raw pin access.
//!
//! Configures GPIO directions and the LEDC timer/channels using raw
//! ESP-IDF sys calls.  [`init_peripherals`] is called once from `main()`
//! before any task starts.
//!
//! Host builds replace the register accesses with a small in-memory pin
//! bank so the hardware adapter can be exercised without a board.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc)  => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcTimerFailed(rc)   => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed(rc) => write!(f, "LEDC channel config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Scale a 0–100 % duty onto the LEDC resolution.
pub fn percent_to_ledc(duty: u8) -> u32 {
    let max = (1u32 << pins::PWM_RESOLUTION_BITS) - 1;
    u32::from(duty.min(100)) * max / 100
}

#[cfg(feature = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
        init_ledc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(feature = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(feature = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for &pin in &pins::INPUT_GPIOS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured (PIR, IR, LED2 detect)");
    Ok(())
}

#[cfg(feature = "espidf")]
pub fn gpio_read(pin: i32) -> Result<bool, i32> {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    Ok((unsafe { gpio_get_level(pin) }) != 0)
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(feature = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    for &pin in &pins::OUTPUT_GPIOS {
        // INPUT_OUTPUT so the driven level can be read back.
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: GPIO outputs configured (LED2, fault LED)");
    Ok(())
}

#[cfg(feature = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_gpio_outputs(); the register write is atomic per pin.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret != ESP_OK as i32 { return Err(ret); }
    Ok(())
}

// ── LEDC PWM ─────────────────────────────────────────────────

#[cfg(feature = "espidf")]
unsafe fn init_ledc() -> Result<(), HwInitError> {
    // Timer 0: every indicator light (1 kHz, 8-bit)
    let timer0 = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    let ret = unsafe { ledc_timer_config(&timer0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }

    // Channels 0-4: PIR, IR, TCS, LED1, LED3
    for (i, &gpio) in pins::PWM_GPIOS.iter().enumerate() {
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel: ledc_channel_t_LEDC_CHANNEL_0 + i as u32,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 { return Err(HwInitError::LedcChannelFailed(ret)); }
    }

    info!("hw_init: LEDC configured (CH0-4 indicator lights)");
    Ok(())
}

#[cfg(feature = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) -> Result<(), i32> {
    // SAFETY: LEDC channels were configured in init_ledc(); each channel
    // has a single writer (its ramp slot owner or the loop).
    unsafe {
        let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, percent_to_ledc(duty));
        if ret != ESP_OK as i32 { return Err(ret); }
        let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
        if ret != ESP_OK as i32 { return Err(ret); }
    }
    Ok(())
}

// ── Host pin bank ─────────────────────────────────────────────

#[cfg(not(feature = "espidf"))]
mod sim {
    use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

    const GPIO_COUNT: usize = 49;
    const LEDC_CHANNELS: usize = 8;

    static LEVELS: [AtomicBool; GPIO_COUNT] = [const { AtomicBool::new(false) }; GPIO_COUNT];
    static DUTIES: [AtomicU8; LEDC_CHANNELS] = [const { AtomicU8::new(0) }; LEDC_CHANNELS];

    fn slot(pin: i32) -> Result<usize, i32> {
        usize::try_from(pin)
            .ok()
            .filter(|&p| p < GPIO_COUNT)
            .ok_or(-1)
    }

    pub fn read(pin: i32) -> Result<bool, i32> {
        Ok(LEVELS[slot(pin)?].load(Ordering::Relaxed))
    }

    pub fn write(pin: i32, high: bool) -> Result<(), i32> {
        LEVELS[slot(pin)?].store(high, Ordering::Relaxed);
        Ok(())
    }

    pub fn set_duty(channel: u32, duty: u8) -> Result<(), i32> {
        let ch = DUTIES.get(channel as usize).ok_or(-1)?;
        ch.store(duty, Ordering::Relaxed);
        Ok(())
    }

    pub fn duty(channel: u32) -> Option<u8> {
        DUTIES.get(channel as usize).map(|d| d.load(Ordering::Relaxed))
    }
}

#[cfg(not(feature = "espidf"))]
pub fn gpio_read(pin: i32) -> Result<bool, i32> {
    sim::read(pin)
}

#[cfg(not(feature = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    sim::write(pin, high)
}

#[cfg(not(feature = "espidf"))]
pub fn ledc_set(channel: u32, duty: u8) -> Result<(), i32> {
    sim::set_duty(channel, duty)
}

/// Last duty written to a simulated LEDC channel.
#[cfg(not(feature = "espidf"))]
pub fn sim_ledc_duty(channel: u32) -> Option<u8> {
    sim::duty(channel)
}
