// crates/ghosttrail-cli/src/helpers/mod.rs

pub mod format;
