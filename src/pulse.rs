//! PulseAudio integration
//!
//! Provides sink, card, and stream access via the PulseAudio command-line
//! tool `pactl`:
//! - `pactl --format=json list ...`: JSON queries for sinks, cards, and
//!   sink-inputs (requires PulseAudio >= 16; PipeWire's pipewire-pulse works)
//! - `pactl get-default-sink` / `set-default-sink`: default sink handling
//! - `pactl set-card-profile` / `move-sink-input`: mutations
//!
//! pactl does not expose a card index on sink objects, so the owning card is
//! resolved here from shared properties with a name-stem fallback.

use std::collections::HashMap;
use std::process::Command;

use color_eyre::eyre::{self, Context, Result};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::cycle::Profile;

// ============================================================================
// pactl JSON structures
// ============================================================================

/// A sink from `pactl --format=json list sinks`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaSink {
    pub index: u32,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// A card from `pactl --format=json list cards`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaCard {
    pub index: u32,
    pub name: String,
    /// Keyed by profile name. Key order is not meaningful after parsing;
    /// [`available_profiles`] imposes the priority order instead.
    #[serde(default)]
    pub profiles: HashMap<String, PaCardProfile>,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaCardProfile {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub priority: u32,
}

/// An application stream from `pactl --format=json list sink-inputs`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaSinkInput {
    pub index: u32,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl PaSinkInput {
    /// Owning application name, when the stream advertises one.
    #[must_use]
    pub fn application_name(&self) -> &str {
        self.properties
            .get("application.name")
            .map_or("(unknown)", String::as_str)
    }
}

// ============================================================================
// Card resolution and profile ordering
// ============================================================================

/// Resolve a sink's owning card.
///
/// Sinks and cards of the same ALSA device share an `alsa.card` property;
/// that match is tried first. Bluetooth and other sinks fall back to
/// name-stem affinity: `alsa_output.X.*` belongs to `alsa_card.X`, and
/// `bluez_output.X...` to `bluez_card.X`.
#[must_use]
pub fn card_for_sink<'a>(sink: &PaSink, cards: &'a [PaCard]) -> Option<&'a PaCard> {
    if let Some(alsa_card) = sink.properties.get("alsa.card")
        && let Some(card) = cards
            .iter()
            .find(|c| c.properties.get("alsa.card") == Some(alsa_card))
    {
        return Some(card);
    }

    cards.iter().find(|card| {
        let Some((kind, stem)) = card.name.split_once("_card.") else {
            return false;
        };
        sink.name
            .strip_prefix(kind)
            .and_then(|rest| rest.strip_prefix("_output."))
            .and_then(|rest| rest.strip_prefix(stem))
            .is_some_and(|tail| tail.is_empty() || tail.starts_with('.'))
    })
}

/// A card's available profiles, ordered by descending priority then name.
///
/// The parser does not keep pactl's JSON key order, so priority (the
/// server's own ranking) stands in for enumeration order. Deterministic for
/// fixed server state.
#[must_use]
pub fn available_profiles(card: &PaCard) -> Vec<Profile> {
    let mut entries: Vec<(&String, &PaCardProfile)> = card
        .profiles
        .iter()
        .filter(|(_, profile)| profile.available)
        .collect();
    entries.sort_by(|(a_name, a), (b_name, b)| {
        b.priority.cmp(&a.priority).then_with(|| a_name.cmp(b_name))
    });

    entries
        .into_iter()
        .map(|(name, profile)| Profile {
            name: name.clone(),
            description: profile.description.clone(),
            available: true,
        })
        .collect()
}

// ============================================================================
// pactl interface
// ============================================================================

/// `pactl` wrapper for all server queries and mutations.
pub struct Pactl;

impl Pactl {
    /// Validate that `pactl` is available in `PATH`.
    ///
    /// # Errors
    /// Returns an error with installation instructions if it is missing.
    pub fn validate_tools() -> Result<()> {
        let found = Command::new("pactl")
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success());

        if !found {
            eyre::bail!(
                "Required tool 'pactl' not found in PATH.\n\
                 \n\
                 Install the PulseAudio utilities package for your distribution:\n\
                 - Arch/Manjaro: pacman -S libpulse\n\
                 - Fedora: dnf install pulseaudio-utils\n\
                 - Debian/Ubuntu: apt install pulseaudio-utils"
            );
        }

        Ok(())
    }

    fn query(args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new("pactl")
            .args(args)
            .output()
            .with_context(|| format!("Failed to run: pactl {}", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            eyre::bail!(
                "pactl {} failed: {}. Is the audio server running?",
                args.join(" "),
                stderr.trim()
            );
        }

        Ok(output.stdout)
    }

    fn mutate(args: &[&str]) -> Result<()> {
        let output = Command::new("pactl")
            .args(args)
            .output()
            .with_context(|| format!("Failed to run: pactl {}", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            eyre::bail!("pactl {} failed: {}", args.join(" "), stderr.trim());
        }

        debug!("pactl {}", args.join(" "));
        Ok(())
    }

    /// Enumerate all sinks.
    ///
    /// # Errors
    /// Returns an error if `pactl` fails or returns invalid JSON.
    pub fn list_sinks() -> Result<Vec<PaSink>> {
        let out = Self::query(&["--format=json", "list", "sinks"])?;
        let sinks: Vec<PaSink> = serde_json::from_slice(&out)
            .context("Failed to parse `pactl list sinks` JSON (PulseAudio >= 16 required)")?;
        trace!("pactl returned {} sinks", sinks.len());
        Ok(sinks)
    }

    /// Enumerate all cards, with their profiles and active profile.
    ///
    /// # Errors
    /// Returns an error if `pactl` fails or returns invalid JSON.
    pub fn list_cards() -> Result<Vec<PaCard>> {
        let out = Self::query(&["--format=json", "list", "cards"])?;
        let cards: Vec<PaCard> = serde_json::from_slice(&out)
            .context("Failed to parse `pactl list cards` JSON (PulseAudio >= 16 required)")?;
        trace!("pactl returned {} cards", cards.len());
        Ok(cards)
    }

    /// Enumerate active application streams.
    ///
    /// # Errors
    /// Returns an error if `pactl` fails or returns invalid JSON.
    pub fn list_sink_inputs() -> Result<Vec<PaSinkInput>> {
        let out = Self::query(&["--format=json", "list", "sink-inputs"])?;
        let inputs: Vec<PaSinkInput> = serde_json::from_slice(&out)
            .context("Failed to parse `pactl list sink-inputs` JSON")?;
        trace!("pactl returned {} sink-inputs", inputs.len());
        Ok(inputs)
    }

    /// Current default sink name.
    ///
    /// # Errors
    /// Returns an error if `pactl` fails or no default sink is configured.
    pub fn default_sink_name() -> Result<String> {
        let out = Self::query(&["get-default-sink"])?;
        let name = String::from_utf8_lossy(&out).trim().to_string();
        if name.is_empty() {
            eyre::bail!("No default sink configured on the server");
        }
        Ok(name)
    }
}

// ============================================================================
// Mutation boundary
// ============================================================================

/// One mutating request toward the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    SetCardProfile { card_index: u32, profile_name: String },
    SetDefaultSink { sink_name: String },
    MoveSinkInput { input_index: u32, sink_name: String },
}

/// The mutating half of the server boundary.
///
/// The live implementation shells out to `pactl`; dry runs substitute
/// [`Recorder`], which keeps the computed requests without touching the
/// server. Queries stay on [`Pactl`] since they never change state.
pub trait Mutator {
    /// Set a card's active profile.
    ///
    /// # Errors
    /// Returns an error if the request cannot be applied.
    fn set_card_profile(&mut self, card_index: u32, profile_name: &str) -> Result<()>;

    /// Set the process-wide default sink.
    ///
    /// # Errors
    /// Returns an error if the request cannot be applied.
    fn set_default_sink(&mut self, sink_name: &str) -> Result<()>;

    /// Relocate one application stream to a sink.
    ///
    /// # Errors
    /// Returns an error if the request cannot be applied.
    fn move_sink_input(&mut self, input_index: u32, sink_name: &str) -> Result<()>;
}

/// Live mutator backed by `pactl`.
pub struct PactlMutator;

impl Mutator for PactlMutator {
    fn set_card_profile(&mut self, card_index: u32, profile_name: &str) -> Result<()> {
        Pactl::mutate(&["set-card-profile", &card_index.to_string(), profile_name])
    }

    fn set_default_sink(&mut self, sink_name: &str) -> Result<()> {
        Pactl::mutate(&["set-default-sink", sink_name])
    }

    fn move_sink_input(&mut self, input_index: u32, sink_name: &str) -> Result<()> {
        Pactl::mutate(&["move-sink-input", &input_index.to_string(), sink_name])
    }
}

/// Records requests without performing them.
#[derive(Debug, Default)]
pub struct Recorder {
    pub requests: Vec<MutationRequest>,
}

impl Mutator for Recorder {
    fn set_card_profile(&mut self, card_index: u32, profile_name: &str) -> Result<()> {
        self.requests.push(MutationRequest::SetCardProfile {
            card_index,
            profile_name: profile_name.to_string(),
        });
        Ok(())
    }

    fn set_default_sink(&mut self, sink_name: &str) -> Result<()> {
        self.requests.push(MutationRequest::SetDefaultSink {
            sink_name: sink_name.to_string(),
        });
        Ok(())
    }

    fn move_sink_input(&mut self, input_index: u32, sink_name: &str) -> Result<()> {
        self.requests.push(MutationRequest::MoveSinkInput {
            input_index,
            sink_name: sink_name.to_string(),
        });
        Ok(())
    }
}
