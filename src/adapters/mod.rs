//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements          | Connects to               |
//! |------------|---------------------|---------------------------|
//! | `hardware` | SensorPort          | GPIO, TCS34725 over I²C   |
//! |            | ActuatorPort        | GPIO, LEDC PWM            |
//! | `log_sink` | EventSink           | Serial log output         |
//! | `time`     | TimePort            | ESP32 system timer        |
//! | `flicker`  | FlickerSource       | `rand` PRNG               |

pub mod flicker;
pub mod hardware;
pub mod log_sink;
pub mod time;
