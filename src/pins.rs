//! GPIO / peripheral pin assignments for the Nightwatch controller board.
//!
//! Single source of truth. Every driver and adapter references this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Presence sensors (digital inputs, pull-down)
// ---------------------------------------------------------------------------

/// HC-SR501 PIR motion sensor output. HIGH = motion.
pub const PIR_SENSOR_GPIO: i32 = 4;
/// IR obstacle / proximity sensor output. HIGH = object present.
pub const IR_SENSOR_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Dimmable indicator lights (LEDC PWM)
// ---------------------------------------------------------------------------

pub const PIR_LED_GPIO: i32 = 7;
pub const IR_LED_GPIO: i32 = 15;
/// Ambient-responsive light paired with the colour sensor.
pub const TCS_LED_GPIO: i32 = 16;
pub const LED1_GPIO: i32 = 17;
pub const LED3_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Binary light with independent readback
// ---------------------------------------------------------------------------

/// Digital output driving LED2 (not PWM controlled).
pub const LED2_GPIO: i32 = 10;
/// Digital input sensing whether LED2 actually conducts.
pub const LED2_DETECT_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Fault indicator
// ---------------------------------------------------------------------------

/// Red LED, HIGH whenever a non-normal fault mode is active.
pub const FAULT_LED_GPIO: i32 = 11;

// ---------------------------------------------------------------------------
// I²C bus (TCS34725 colour sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// I²C clock for the colour sensor.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC frequency shared by every indicator light.
pub const LED_PWM_FREQ_HZ: u32 = 1_000;

/// Dimmable outputs in LEDC channel order (channel N drives entry N).
pub const PWM_GPIOS: [i32; 5] = [
    PIR_LED_GPIO,
    IR_LED_GPIO,
    TCS_LED_GPIO,
    LED1_GPIO,
    LED3_GPIO,
];

/// Digital inputs configured at boot.
pub const INPUT_GPIOS: [i32; 3] = [PIR_SENSOR_GPIO, IR_SENSOR_GPIO, LED2_DETECT_GPIO];

/// Plain digital outputs configured at boot (driven LOW initially).
pub const OUTPUT_GPIOS: [i32; 2] = [LED2_GPIO, FAULT_LED_GPIO];

/// LEDC channel index for a PWM-capable pin.
pub fn pwm_channel(pin: i32) -> Option<u32> {
    PWM_GPIOS
        .iter()
        .position(|&p| p == pin)
        .map(|idx| idx as u32)
}
