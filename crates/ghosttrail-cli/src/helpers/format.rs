// crates/ghosttrail-cli/src/helpers/format.rs
//
// Terminal string utilities for pipeline events. Nothing here touches ffmpeg
// or the pixel data.

/// "120/300 frames (40%)", or just "120 frames" when the container does not
/// advertise a frame count. The percentage is capped at 100 because frame
/// count hints are estimates.
pub fn progress_line(frames: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total > 0 => {
            let pct = (frames.saturating_mul(100) / total).min(100);
            format!("{frames}/{total} frames ({pct}%)")
        }
        _ => format!("{frames} frames"),
    }
}

/// Human label for a delay depth: depth 0 freezes the first frame.
pub fn delay_label(depth: usize) -> String {
    match depth {
        0 => "freeze (first frame)".to_string(),
        1 => "1 frame".to_string(),
        n => format!("{n} frames"),
    }
}
