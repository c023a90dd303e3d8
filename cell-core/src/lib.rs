#![no_std]

// Protection logic for a single cell module.
//
// Everything here is free of the Rust standard library and of any MCU
// specifics so the firmware and the host emulator run the exact same
// decision core.

pub mod calibration;
pub mod config;
pub mod cycles;
pub mod debounce;
pub mod filter;
pub mod protection;
pub mod scheduler;
pub mod telemetry;
