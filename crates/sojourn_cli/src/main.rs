//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `sojourn_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Why: keep a tiny CLI probe to validate core crate wiring
    // independently from host application setup.
    println!("sojourn_core ping={}", sojourn_core::ping());
    println!("sojourn_core version={}", sojourn_core::core_version());
}
