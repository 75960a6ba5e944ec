//! Fuzz target: console line parser
//!
//! Feeds arbitrary UTF-8 lines through `parse_line` and checks:
//! - No panics under any input
//! - A parsed `mode` command always carries exactly one code token
//! - Error replies always render as a JSON object with an `error` key
//!
//! cargo fuzz run fuzz_console_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use nightwatch::app::commands::AppCommand;
use nightwatch::console::{self, ConsoleCommand};

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    match console::parse_line(line) {
        Ok(ConsoleCommand::App(AppCommand::SetFaultMode(code))) => {
            assert!(!code.is_empty());
            assert!(!code.contains(char::is_whitespace));
        }
        Ok(_) => {}
        Err(e) => {
            let reply = console::render_error(&e.to_string());
            let value: serde_json::Value =
                serde_json::from_str(&reply).expect("error reply is valid JSON");
            assert!(value.get("error").is_some());
        }
    }
});
