//! Nightwatch Firmware: Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   SystemClock   RandomFlicker  │
//! │  (Sensor+Actuator) (EventSink)    (TimePort)    (Flicker)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  LightingService · MonitorLoop · RampEngine            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Console (stdin lines → AppCommand → JSON reply)               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Task layout:
//!
//! | Task      | Core | Role                                     |
//! |-----------|------|------------------------------------------|
//! | main      | 0    | console command loop                     |
//! | monitor   | 1    | sensor monitoring loop (watchdog-fed)    |
//! | ramp      | 1    | one short-lived task per fading light    |

#![deny(unused_must_use)]

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;

use nightwatch::adapters::flicker::RandomFlicker;
use nightwatch::adapters::hardware::HardwareAdapter;
use nightwatch::adapters::log_sink::LogEventSink;
use nightwatch::adapters::time::SystemClock;
use nightwatch::app::service::LightingService;
use nightwatch::config::SystemConfig;
use nightwatch::console::{self, ConsoleCommand, ParseError};
use nightwatch::drivers::{hw_init, task_pin};
use nightwatch::pins;
use nightwatch::sensors::tcs34725::Tcs34725;

const MONITOR_PRIORITY: u8 = 5;
const MONITOR_STACK_KB: usize = 8;
const CONSOLE_IDLE: Duration = Duration::from_millis(100);

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Nightwatch v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate()?;

    // ── 3. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;

    let peripherals = Peripherals::take()?;
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )?;
    let sensor = Tcs34725::new(i2c, config.sensor_integration_time, config.sensor_gain);
    let hw = Arc::new(HardwareAdapter::new(sensor, FreeRtos));

    // ── 4. Service + monitoring loop ──────────────────────────
    let service = LightingService::new(
        hw,
        config,
        Arc::new(LogEventSink::new()),
        Arc::new(SystemClock::new()),
    );
    service.start();

    let monitor = service.monitor(Box::new(RandomFlicker::new()));
    task_pin::spawn_on_core(
        task_pin::Core::App,
        MONITOR_PRIORITY,
        MONITOR_STACK_KB,
        "monitor\0",
        move || {
            monitor.run();
        },
    )?;

    // ── 5. Console ────────────────────────────────────────────
    info!("Console ready: {}", console::USAGE);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                std::thread::sleep(CONSOLE_IDLE);
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Console read failed: {e}");
                std::thread::sleep(CONSOLE_IDLE);
                continue;
            }
        }

        let reply = match console::parse_line(&line) {
            Ok(ConsoleCommand::App(cmd)) => console::render(&service.handle_command(cmd)),
            Ok(ConsoleCommand::Help) => console::render_help(),
            Err(ParseError::Empty) => continue,
            Err(e) => console::render_error(&e.to_string()),
        };
        if let Err(e) = writeln!(stdout, "{reply}").and_then(|()| stdout.flush()) {
            warn!("Console write failed: {e}");
        }
    }
}
