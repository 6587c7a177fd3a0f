//! Command-line interface definitions
//!
//! Uses clap for argument parsing with derive macros.

use clap::{ArgAction, Parser};

/// pacycle - PulseAudio sink cycler
///
/// Step the default sink through a filtered, repeating list.
#[derive(Parser, Debug)]
#[command(name = "pacycle")]
#[command(version)]
#[command(about = "Cycle the default PulseAudio sink through a filtered list")]
#[command(after_help = "\
BEHAVIOR:
  - Builds an ordered list of (sink, profile) candidates from the filters
  - Finds the entry matching the current default sink's card and active profile
  - Switches to the next entry, wrapping around after the last one
  - Moves every playing application stream to the new sink

EXAMPLES:
  # headset -> speakers -> headset -> ...
  pacycle -s 'Headset|Speakers'

  # headset (forced onto its good-sound profile) -> speakers -> ...
  pacycle -s 'Headset|Speakers' -p 'Headset' 'a2dp'

  # monitor cycles through both HDMI profiles
  pacycle -s 'Monitor' -p 'Monitor' 'HDMI1|HDMI2'

DISCOVERY:
  pacycle --dry -v -s '' lists every sink and profile without changing anything.

CONFIG FILE:
  Defaults for these flags can live in $XDG_CONFIG_HOME/pacycle/config.toml.
  Flags given on the command line take precedence.")]
pub struct Args {
    /// Regex of sink descriptions to cycle through (default: every sink)
    #[arg(short = 's', long = "sink", value_name = "SINK_REGEX")]
    pub sink: Option<String>,

    /// Sink/profile regex pair: for sinks matching SINK_REGEX, each card
    /// profile matching PROFILE_REGEX becomes its own cycle entry. Repeatable.
    #[arg(
        short = 'p',
        long = "profile",
        num_args = 2,
        value_names = ["SINK_REGEX", "PROFILE_REGEX"],
        action = ArgAction::Append
    )]
    pub profile: Vec<String>,

    /// Send a desktop notification with the selected sink and profile
    #[arg(short = 'n', long)]
    pub notify: bool,

    /// Compute and report without changing sinks or profiles
    #[arg(long)]
    pub dry: bool,

    /// Increase diagnostic output (-v lists candidates, -vv traces matching)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Profile rule pairs as supplied, in order.
    #[must_use]
    pub fn profile_rules(&self) -> Vec<(String, String)> {
        self.profile
            .chunks_exact(2)
            .map(|pair| (pair[0].clone(), pair[1].clone()))
            .collect()
    }
}
