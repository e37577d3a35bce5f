//! Generally useful shared code.

/// Clear the screen and put the cursor back at the top, for a clean exit.
pub const RESET_SCREEN: &str = "\x1b[2J\x1b[H";

/// Microseconds in a second.
pub const ONE_MICROSECOND: u64 = 1_000_000;

/// Sleep until the next frame is due, given when the last one started.
pub async fn sleep_until_next_frame_tick(last_frame_tick: &mut std::time::Instant, frame_rate: u32) {
    let target = ONE_MICROSECOND.wrapping_div(frame_rate.max(1).into());
    let target_frame_rate_micro = std::time::Duration::from_micros(target);
    if let Some(wait) = target_frame_rate_micro.checked_sub(last_frame_tick.elapsed()) {
        tokio::time::sleep(wait).await;
    }
    *last_frame_tick = std::time::Instant::now();
}
