//! Desktop notifications
//!
//! Best-effort reporting of the switch outcome via notify-rust, with icon
//! detection using `FreeDesktop` standard icon names. A failure here never
//! fails the run.

use color_eyre::eyre::{Context, Result};
use notify_rust::Notification;

/// Send a desktop notification
///
/// # Errors
/// Returns an error if the notification cannot be sent (e.g., no notification
/// daemon running). Callers downgrade this to a warning.
pub fn send_notification(summary: &str, body: &str, icon: &str) -> Result<()> {
    Notification::new()
        .summary(summary)
        .body(body)
        .appname("pacycle")
        .icon(icon)
        .timeout(3000)
        .show()
        .context("Failed to show notification")?;

    Ok(())
}

/// Pick a `FreeDesktop` icon from a sink's description and name.
#[must_use]
pub fn icon_for_sink(description: &str, name: &str) -> &'static str {
    let desc_lower = description.to_lowercase();
    let name_lower = name.to_lowercase();

    if desc_lower.contains("hdmi")
        || desc_lower.contains("tv")
        || desc_lower.contains("display")
        || name_lower.contains("hdmi")
    {
        "video-display"
    } else if desc_lower.contains("headphone")
        || desc_lower.contains("headset")
        || desc_lower.contains("bluetooth")
        || name_lower.contains("bluez")
    {
        "audio-headphones"
    } else {
        // Speakers, optical, digital, etc.
        "audio-speakers"
    }
}
