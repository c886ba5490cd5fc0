#![no_std]

// Shared logic for the single-button flashlight mode controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Side effects leave the crate only through the
// `LightOutput` and `MaintenanceOps` traits.

pub mod config;
pub mod context;
pub mod controller;
pub mod display;
pub mod gesture;
pub mod repl;
pub mod states;
pub mod strobe;
pub mod supervisor;
pub mod table;
pub mod telemetry;
pub mod timing;
