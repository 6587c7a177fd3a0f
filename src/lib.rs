//! `pacycle` - PulseAudio sink cycler
//!
//! Steps the audio server's default output sink through an ordered,
//! regex-filterable, repeating sequence and re-homes every active application
//! stream to the new sink. Built to hang off a hotkey: one invocation, one
//! step through the cycle.
//!
//! # Features
//! - Regex filtering of sinks by description (`-s`)
//! - Per-sink card-profile selection via repeatable (sink, profile) regex
//!   pairs (`-p`), so one physical card can contribute several cycle entries
//! - Desktop notification of the selected sink and profile
//! - Dry-run plus listing mode for discovering sink and profile names
//!
//! All server access goes through the `pactl` command-line tool (JSON output,
//! PulseAudio >= 16; PipeWire's pipewire-pulse works the same way).

pub mod cli;
pub mod commands;
pub mod config;
pub mod cycle;
pub mod notification;
pub mod pulse;
pub mod style;

// Re-export commonly used types for convenience
pub use cli::Args;
pub use config::Config;
