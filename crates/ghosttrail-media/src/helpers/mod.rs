// crates/ghosttrail-media/src/helpers/mod.rs
//
// Internal helper modules for ghosttrail-media.
// Not re-exported from lib.rs; these are decode/encode implementation
// details, not part of the public API consumed by the CLI.

pub mod yuv;
