// crates/ghosttrail-core/src/helpers/mod.rs
//
// Small, dependency-free helpers shared by the frame model and the overlay.

pub mod plane;
