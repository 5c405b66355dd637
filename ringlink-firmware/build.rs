//! Build script for ringlink-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates node.toml at compile time, then runs it through the same
//!   parser the firmware uses so nothing it rejects at boot can build

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Pin keys of the [pins] section
const RING_PINS: [&str; 6] = [
    "clock_out",
    "data_out",
    "ack_in",
    "clock_in",
    "data_in",
    "ack_out",
];

const KEYPAD_LINES: usize = 4;

/// Sections and keys accepted by the firmware's parser
const SCHEMA: [(&str, &[&str]); 6] = [
    ("node", &["id"]),
    ("timing", &["bit_delay_us", "settle_delay_us", "start_hold_us"]),
    ("limits", &["ack_polls", "edge_polls", "retry_limit"]),
    ("receive", &["oversize", "resync"]),
    ("pins", &RING_PINS),
    ("keypad", &["rows", "cols"]),
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate node.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=node.toml");

    let config_path = Path::new("node.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: node.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a node.toml configuration file.           ║\n\
            ║  Please create one in the ringlink-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read node.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in node.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_schema(&config);
    validate_node(&config);
    validate_timing(&config);
    validate_limits(&config);
    validate_receive(&config);
    validate_pins(&config);
    validate_with_firmware_parser(&config_content);

    println!("cargo:warning=node.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build listing every problem found in one section
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Reject sections and keys the firmware would refuse at boot
fn validate_schema(config: &toml::Value) {
    let Some(root) = config.as_table() else {
        return;
    };

    let mut errors = Vec::new();

    for (name, section) in root {
        let Some((_, keys)) = SCHEMA.iter().find(|(s, _)| *s == name.as_str()) else {
            errors.push(format!("Unknown section [{}]", name));
            continue;
        };
        let Some(table) = section.as_table() else {
            errors.push(format!("[{}] must be a section", name));
            continue;
        };
        for key in table.keys() {
            if !keys.contains(&key.as_str()) {
                errors.push(format!("[{}] unknown key '{}'", name, key));
            }
        }
    }

    report("Unknown settings in node.toml", &errors);
}

/// Delays must be non-negative integers that fit in a u32
fn validate_timing(config: &toml::Value) {
    let timing = match config.get("timing") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();

    for (key, value) in timing {
        match value {
            toml::Value::Integer(n) if (0..=i64::from(u32::MAX)).contains(n) => {}
            toml::Value::Integer(_) => errors.push(format!("[timing] {} out of range", key)),
            _ => errors.push(format!("[timing] {} must be an integer", key)),
        }
    }

    report("Invalid timing configuration", &errors);
}

/// Final gate: the firmware's own parser must accept the file
fn validate_with_firmware_parser(content: &str) {
    if let Err(e) = ringlink_core::config::parse_config(content) {
        report(
            "node.toml rejected by the firmware parser",
            &[format!("{:?}", e)],
        );
    }
}

/// The [node] section and its id are mandatory
fn validate_node(config: &toml::Value) {
    let mut errors = Vec::new();

    match config.get("node").and_then(|n| n.get("id")) {
        Some(toml::Value::String(id)) => {
            let valid = id.len() == 1 && id.chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                errors.push(format!("[node] id '{}' must be one hex digit", id));
            }
        }
        Some(_) => errors.push("[node] id must be a string like \"1\"".to_string()),
        None => errors.push("Missing [node] id - every node needs an id".to_string()),
    }

    report("Invalid node configuration", &errors);
}

fn validate_limits(config: &toml::Value) {
    let limits = match config.get("limits") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();

    for key in ["ack_polls", "edge_polls", "retry_limit"] {
        match limits.get(key) {
            Some(toml::Value::Integer(n)) if *n < 1 => {
                errors.push(format!("[limits] {} must be at least 1", key));
            }
            Some(toml::Value::Integer(_)) | None => {}
            Some(_) => errors.push(format!("[limits] {} must be an integer", key)),
        }
    }

    if let Some(toml::Value::Integer(n)) = limits.get("retry_limit") {
        if *n > 255 {
            errors.push("[limits] retry_limit must be 1-255".to_string());
        }
    }

    report("Invalid limits configuration", &errors);
}

fn validate_receive(config: &toml::Value) {
    let receive = match config.get("receive") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    let mut errors = Vec::new();

    if let Some(policy) = receive.get("oversize") {
        if !matches!(policy.as_str(), Some("drain" | "abandon")) {
            errors.push("[receive] oversize must be 'drain' or 'abandon'".to_string());
        }
    }

    if let Some(resync) = receive.get("resync") {
        if resync.as_bool().is_none() {
            errors.push("[receive] resync must be true or false".to_string());
        }
    }

    report("Invalid receive configuration", &errors);
}

/// Parse "gpioN" / "^gpioN" into the GPIO number
fn pin_number(value: &str) -> Option<u8> {
    let name = value.strip_prefix('^').unwrap_or(value);
    let pin: u8 = name.strip_prefix("gpio")?.parse().ok()?;
    (pin <= 29).then_some(pin)
}

/// Every pin must be well-formed and used only once
fn validate_pins(config: &toml::Value) {
    let mut errors = Vec::new();
    let mut used: Vec<(u8, String)> = Vec::new();

    let mut check = |label: String, value: &toml::Value, errors: &mut Vec<String>| {
        let Some(text) = value.as_str() else {
            errors.push(format!("{} must be a string like \"gpio4\"", label));
            return;
        };
        match pin_number(text) {
            Some(pin) => {
                if let Some((_, other)) = used.iter().find(|(p, _)| *p == pin) {
                    errors.push(format!("{} reuses gpio{} from {}", label, pin, other));
                } else {
                    used.push((pin, label));
                }
            }
            None => errors.push(format!("{} '{}' is not gpio0-gpio29", label, text)),
        }
    };

    if let Some(pins) = config.get("pins").and_then(|p| p.as_table()) {
        for key in RING_PINS {
            if let Some(value) = pins.get(key) {
                check(format!("[pins] {}", key), value, &mut errors);
            }
        }
    }

    if let Some(keypad) = config.get("keypad").and_then(|k| k.as_table()) {
        for key in ["rows", "cols"] {
            match keypad.get(key) {
                Some(toml::Value::Array(lines)) => {
                    if lines.len() != KEYPAD_LINES {
                        errors.push(format!("[keypad] {} needs {} pins", key, KEYPAD_LINES));
                    }
                    for (i, value) in lines.iter().enumerate() {
                        check(format!("[keypad] {}[{}]", key, i), value, &mut errors);
                    }
                }
                Some(_) => errors.push(format!("[keypad] {} must be an array", key)),
                None => {}
            }
        }
    }

    report("Invalid pin configuration", &errors);
}
