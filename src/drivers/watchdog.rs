//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the monitoring loop
//! stalls for longer than the configured timeout.
//!
//! The subscribing task must call `feed()` on every cycle, including the
//! short polls made while a delayed response is being simulated.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(feature = "espidf")]
use log::info;

pub struct Watchdog {
    #[cfg(feature = "espidf")]
    subscribed: bool,
    #[cfg(not(feature = "espidf"))]
    feeds: std::sync::atomic::AtomicU32,
}

impl Watchdog {
    /// Initialise and subscribe the calling task to the TWDT.
    pub fn new(timeout_secs: u32) -> Self {
        #[cfg(feature = "espidf")]
        {
            // SAFETY: TWDT calls only touch IDF-owned state; the null
            // handle subscribes the calling task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: timeout_secs * 1000,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({}s timeout, panic on trigger)", timeout_secs);
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self { subscribed }
            }
        }

        #[cfg(not(feature = "espidf"))]
        {
            log::info!("Watchdog(sim): no-op ({}s timeout)", timeout_secs);
            Self {
                feeds: std::sync::atomic::AtomicU32::new(0),
            }
        }
    }

    /// Feed the watchdog.
    pub fn feed(&self) {
        #[cfg(feature = "espidf")]
        {
            if self.subscribed {
                // SAFETY: resets the calling task's TWDT entry.
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }

        #[cfg(not(feature = "espidf"))]
        {
            self.feeds.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }

    /// Number of feeds so far (simulation only).
    #[cfg(not(feature = "espidf"))]
    pub fn feeds(&self) -> u32 {
        self.feeds.load(std::sync::atomic::Ordering::Relaxed)
    }
}
