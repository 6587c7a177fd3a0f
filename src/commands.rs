//! The cycle command
//!
//! One synchronous pass: snapshot server state, build the candidate list,
//! locate the current position, advance, apply, notify. Filters are compiled
//! before the first server call so a malformed regex aborts before anything
//! else happens.

use std::collections::HashMap;

use color_eyre::eyre::{Context, Result, eyre};
use crossterm::style::Stylize;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::cli::Args;
use crate::config::Config;
use crate::cycle::{self, Candidate, CurrentPosition, Device, Profile, ProfileRule, SCAN_LIMIT};
use crate::notification::{icon_for_sink, send_notification};
use crate::pulse::{
    Mutator, PaCard, PaSink, PaSinkInput, Pactl, PactlMutator, Recorder, available_profiles,
    card_for_sink,
};
use crate::style::PacycleStyle;

/// Options for one cycle run, merged from CLI flags and the config file.
#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub sink_pattern: String,
    pub profile_rules: Vec<(String, String)>,
    pub notify: bool,
    pub dry: bool,
    pub verbose: u8,
}

impl CycleOptions {
    /// Merge CLI flags with config file defaults. Flags win; CLI-supplied
    /// profile rules replace the file's rules rather than extending them.
    /// With neither source supplying rules, the empty/empty pair applies, so
    /// every available profile of every filtered sink becomes a candidate.
    #[must_use]
    pub fn merge(args: &Args, config: &Config) -> Self {
        let sink_pattern = args
            .sink
            .clone()
            .unwrap_or_else(|| config.sink_pattern.clone());

        let mut profile_rules = args.profile_rules();
        if profile_rules.is_empty() {
            profile_rules.clone_from(&config.profile_rules);
        }
        if profile_rules.is_empty() {
            profile_rules.push((String::new(), String::new()));
        }

        Self {
            sink_pattern,
            profile_rules,
            notify: args.notify || config.settings.notify,
            dry: args.dry,
            verbose: args.verbose,
        }
    }
}

/// What the apply stage did (or, on a dry run, would have done).
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    pub sink_name: String,
    pub sink_description: String,
    /// The profile that was set, when the candidate's profile differed from
    /// the card's active one.
    pub profile_set: Option<Profile>,
    /// Application names of the streams moved to the new sink.
    pub moved_streams: Vec<String>,
}

/// Run one full cycle step.
///
/// # Errors
/// Fails on malformed filter regexes, missing `pactl`, a missing or
/// unresolvable default sink, a candidate list that never matches the current
/// position, or any failed mutation. Notification failure only warns.
pub fn run_cycle(opts: &CycleOptions) -> Result<()> {
    let (device_pattern, rules) = compile_filters(opts)?;

    Pactl::validate_tools()?;
    let sinks = Pactl::list_sinks()?;
    let cards = Pactl::list_cards()?;
    let sink_inputs = Pactl::list_sink_inputs()?;

    let current = current_position(&sinks, &cards)?;
    let (devices, profiles_by_card) = assemble_inventory(&sinks, &cards);
    let candidates = cycle::build_candidates(&devices, &profiles_by_card, &device_pattern, &rules);

    if opts.verbose >= 1 {
        print_candidates(&candidates);
    }

    let target = cycle::advance(&candidates, &current, SCAN_LIMIT)?;
    debug!(
        sink = %target.device.name,
        profile = target.profile.as_ref().map(|p| p.name.as_str()),
        "next candidate"
    );

    let outcome = if opts.dry {
        let mut recorder = Recorder::default();
        let outcome = apply(target, &cards, &sink_inputs, &mut recorder, Pactl::list_sinks)?;
        debug!(
            suppressed = recorder.requests.len(),
            "dry run: mutations recorded, not sent"
        );
        outcome
    } else {
        apply(
            target,
            &cards,
            &sink_inputs,
            &mut PactlMutator,
            Pactl::list_sinks,
        )?
    };

    report(&outcome, opts);

    if opts.notify {
        let mut body = format!("New sink: {}", outcome.sink_description);
        if let Some(ref profile) = outcome.profile_set {
            body.push_str("\nNew profile: ");
            body.push_str(&profile.description);
        }
        let icon = icon_for_sink(&outcome.sink_description, &outcome.sink_name);
        if let Err(err) = send_notification("Sink changed", &body, icon) {
            warn!("Notification failed: {err:#}");
        }
    }

    Ok(())
}

/// Apply the chosen candidate in the required order: profile first, then
/// default sink, then every active stream.
///
/// Mutations flow through `mutator` so dry runs can substitute a
/// [`Recorder`]. `refresh_sinks` re-queries the sink list after a profile
/// change; the change can replace the card's sink node, so the sink to apply
/// is re-resolved by card and the first sink it owns is taken.
///
/// # Errors
/// Fails if the candidate's card vanished, no sink appears for the card
/// after a profile change, or a mutation request fails.
pub fn apply<M, F>(
    target: &Candidate,
    cards: &[PaCard],
    sink_inputs: &[PaSinkInput],
    mutator: &mut M,
    mut refresh_sinks: F,
) -> Result<ApplyOutcome>
where
    M: Mutator + ?Sized,
    F: FnMut() -> Result<Vec<PaSink>>,
{
    let mut sink_name = target.device.name.clone();
    let mut sink_description = target.device.description.clone();
    let mut profile_set = None;

    if let Some(ref profile) = target.profile {
        let card = cards
            .iter()
            .find(|c| c.index == target.device.card_index)
            .ok_or_else(|| eyre!("Card #{} vanished during the run", target.device.card_index))?;

        if card.active_profile.as_deref() != Some(profile.name.as_str()) {
            info!("Setting profile '{}' on card '{}'", profile.name, card.name);
            mutator.set_card_profile(card.index, &profile.name)?;

            let sinks = refresh_sinks()?;
            let resolved = sinks
                .iter()
                .find(|s| card_for_sink(s, cards).is_some_and(|c| c.index == card.index))
                .ok_or_else(|| {
                    eyre!("No sink found for card '{}' after profile change", card.name)
                })?;
            sink_name = resolved.name.clone();
            sink_description = resolved.description.clone();
            profile_set = Some(profile.clone());
        }
    }

    info!("Setting default sink to '{sink_name}'");
    mutator.set_default_sink(&sink_name)?;

    let mut moved_streams = Vec::with_capacity(sink_inputs.len());
    for input in sink_inputs {
        info!("Moving stream '{}' to '{sink_name}'", input.application_name());
        mutator.move_sink_input(input.index, &sink_name)?;
        moved_streams.push(input.application_name().to_string());
    }

    Ok(ApplyOutcome {
        sink_name,
        sink_description,
        profile_set,
        moved_streams,
    })
}

fn compile_filters(opts: &CycleOptions) -> Result<(Regex, Vec<ProfileRule>)> {
    let device_pattern = Regex::new(&opts.sink_pattern)
        .with_context(|| format!("Invalid sink filter regex '{}'", opts.sink_pattern))?;

    let mut rules = Vec::with_capacity(opts.profile_rules.len());
    for (sink, profile) in &opts.profile_rules {
        rules.push(ProfileRule {
            sink: Regex::new(sink)
                .with_context(|| format!("Invalid profile rule sink regex '{sink}'"))?,
            profile: Regex::new(profile)
                .with_context(|| format!("Invalid profile rule profile regex '{profile}'"))?,
        });
    }

    Ok((device_pattern, rules))
}

/// Compute the current cycle position once: the default sink's card and that
/// card's active profile. Missing pieces are configuration errors and abort
/// before any mutation.
fn current_position(sinks: &[PaSink], cards: &[PaCard]) -> Result<CurrentPosition> {
    let default_name = Pactl::default_sink_name()?;
    let sink = sinks
        .iter()
        .find(|s| s.name == default_name)
        .ok_or_else(|| eyre!("Default sink '{default_name}' not in the sink list"))?;
    let card = card_for_sink(sink, cards)
        .ok_or_else(|| eyre!("No owning card found for default sink '{default_name}'"))?;
    let profile_name = card
        .active_profile
        .clone()
        .ok_or_else(|| eyre!("Card '{}' reports no active profile", card.name))?;

    debug!(card = card.index, profile = %profile_name, "current position");
    Ok(CurrentPosition {
        card_index: card.index,
        profile_name,
    })
}

/// Pair every sink with its owning card and collect each card's available
/// profiles. Sinks with no resolvable card (combine/null modules) cannot
/// take part in a card-keyed cycle and are skipped.
fn assemble_inventory(
    sinks: &[PaSink],
    cards: &[PaCard],
) -> (Vec<Device>, HashMap<u32, Vec<Profile>>) {
    let mut devices = Vec::with_capacity(sinks.len());
    let mut profiles_by_card = HashMap::new();

    for sink in sinks {
        let Some(card) = card_for_sink(sink, cards) else {
            debug!(sink = %sink.name, "sink has no owning card, excluded from the cycle");
            continue;
        };
        devices.push(Device {
            index: sink.index,
            name: sink.name.clone(),
            description: sink.description.clone(),
            card_index: card.index,
        });
        profiles_by_card
            .entry(card.index)
            .or_insert_with(|| available_profiles(card));
    }

    (devices, profiles_by_card)
}

/// Print the candidate listing, grouped by sink. Together with `--dry` this
/// is the discovery mode: `pacycle --dry -v -s ''` shows every sink and
/// profile name without mutating anything.
fn print_candidates(candidates: &[Candidate]) {
    println!("{}", "CANDIDATES:".header());
    if candidates.is_empty() {
        println!("  {}", "(none match the filters)".subtle());
        return;
    }

    let mut last_device = None;
    for candidate in candidates {
        if last_device != Some(candidate.device.index) {
            println!("{}", candidate.device.description.as_str().bold());
            println!("  {}", candidate.device.name.as_str().technical());
            last_device = Some(candidate.device.index);
        }
        match &candidate.profile {
            Some(profile) => println!(
                "    {:<40} {}",
                profile.name,
                profile.description.as_str().subtle()
            ),
            None => println!("    {}", "(no profile change)".subtle()),
        }
    }
    println!();
}

fn report(outcome: &ApplyOutcome, opts: &CycleOptions) {
    let label = if opts.dry {
        "Would switch to:".warning()
    } else {
        "Switched to:".success()
    };
    println!("{} {}", label, outcome.sink_description.as_str().bold());

    if let Some(ref profile) = outcome.profile_set {
        let label = if opts.dry {
            "With profile:".warning()
        } else {
            "Profile:".success()
        };
        println!("{} {}", label, profile.description.as_str().technical());
    }

    if opts.verbose >= 1 {
        for app in &outcome.moved_streams {
            println!("  {} {}", "moved".subtle(), app);
        }
    }
}
