//! Effective duration resolution
//!
//! The one place that decides how long an item stays on screen. The timeline
//! display, the total-duration header and the playback preview all call
//! [`effective_duration`], so they cannot disagree.

/// Shortest accepted override, in seconds
pub const MIN_DURATION_SECS: u32 = 1;

/// Longest accepted override, in seconds
pub const MAX_DURATION_SECS: u32 = 3600;

/// Used when neither the item, its asset, nor the playlist provide a duration
pub const FALLBACK_DURATION_SECS: u32 = 10;

/// Resolve the duration of one item.
///
/// Fallback chain: item override → asset intrinsic duration → playlist
/// default → [`FALLBACK_DURATION_SECS`]. Zero is treated as "not set" at every
/// step.
pub fn effective_duration(
    override_seconds: Option<u32>,
    asset_seconds: Option<u32>,
    playlist_default: Option<u32>,
) -> u32 {
    [override_seconds, asset_seconds, playlist_default]
        .into_iter()
        .flatten()
        .find(|secs| *secs > 0)
        .unwrap_or(FALLBACK_DURATION_SECS)
}

/// Clamp a user-entered override to the accepted range
pub fn clamp_duration(seconds: u32) -> u32 {
    seconds.clamp(MIN_DURATION_SECS, MAX_DURATION_SECS)
}
