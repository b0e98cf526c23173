//! Float text forms.
//!
//! Floats are written with the shortest text that reads back bit-exact.
//! NaN payloads other than the canonical quiet NaN would be lost as
//! `NaN`, so they are written as `NaNbox` followed by the raw bits in hex.

use alloc::format;
use alloc::string::{String, ToString};
use std::sync::OnceLock;

const NAN_BOX: &str = "NaNbox";

/// Checks once whether `Display` round-trips floats on this target.
fn display_round_trips() -> bool {
    static ROUND_TRIPS: OnceLock<bool> = OnceLock::new();
    *ROUND_TRIPS.get_or_init(|| {
        let probes = [
            -8.222_727_151_242_68e-63_f64,
            0.1,
            1.0 / 3.0,
            f64::MAX,
            f64::MIN_POSITIVE,
            5e-324,
        ];
        let exact = probes.iter().all(|v| {
            v.to_string()
                .parse::<f64>()
                .is_ok_and(|back| back.to_bits() == v.to_bits())
        });
        if !exact {
            log::info!("float display is lossy, writing floats in exponent form");
        }
        exact
    })
}

pub(crate) fn f64_to_text(value: f64) -> String {
    if value.is_nan() && value.to_bits() != f64::NAN.to_bits() {
        return format!("{NAN_BOX}{:016X}", value.to_bits());
    }
    if display_round_trips() {
        value.to_string()
    } else {
        format!("{value:.16e}")
    }
}

pub(crate) fn f64_from_text(text: &str) -> Result<f64, String> {
    match text.strip_prefix(NAN_BOX) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .map(f64::from_bits)
            .map_err(|e| e.to_string()),
        None => text.parse::<f64>().map_err(|e| e.to_string()),
    }
}

pub(crate) fn f32_to_text(value: f32) -> String {
    if value.is_nan() && value.to_bits() != f32::NAN.to_bits() {
        return format!("{NAN_BOX}{:08X}", value.to_bits());
    }
    if display_round_trips() {
        value.to_string()
    } else {
        format!("{value:.8e}")
    }
}

pub(crate) fn f32_from_text(text: &str) -> Result<f32, String> {
    match text.strip_prefix(NAN_BOX) {
        Some(hex) => u32::from_str_radix(hex, 16)
            .map(f32::from_bits)
            .map_err(|e| e.to_string()),
        None => text.parse::<f32>().map_err(|e| e.to_string()),
    }
}

// -----------------------------------------------------------------------------
// Tests
