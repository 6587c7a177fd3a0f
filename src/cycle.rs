//! Candidate construction and cyclic position resolution
//!
//! The pure half of the cycle: building the ordered `(sink, profile)`
//! candidate list from regex filters, locating the server's current position
//! in that list, and computing the next entry in cyclic order. Nothing in
//! this module talks to the audio server.

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

/// Cap on the cyclic scan in [`advance`], guarding against an empty or
/// otherwise pathological candidate list.
pub const SCAN_LIMIT: usize = 100;

/// An audio sink known to the server.
///
/// `card_index` identifies the owning hardware card; candidates are compared
/// against the current position by card rather than by sink, because a
/// profile change can change which sink represents the same physical card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub index: u32,
    pub name: String,
    pub description: String,
    pub card_index: u32,
}

/// A named hardware configuration of a card (e.g. analog-stereo, hdmi).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub available: bool,
}

/// One entry of the cycle: a sink plus an optional profile to set.
///
/// `profile: None` means "this entry causes no profile change".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub device: Device,
    pub profile: Option<Profile>,
}

impl Candidate {
    /// Whether this candidate equals the server's current position.
    ///
    /// True iff the candidate's card is the current card AND the candidate
    /// either specifies no profile or specifies exactly the active one. A
    /// candidate with the same card but a different profile is not current:
    /// the cycle must move on to it, not silently accept it.
    #[must_use]
    pub fn is_current(&self, current: &CurrentPosition) -> bool {
        self.device.card_index == current.card_index
            && self
                .profile
                .as_ref()
                .is_none_or(|p| p.name == current.profile_name)
    }
}

/// The server's live position, computed once per run: the default sink's
/// card and that card's active profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPosition {
    pub card_index: u32,
    pub profile_name: String,
}

/// A compiled `(sink_pattern, profile_pattern)` filter rule.
#[derive(Debug, Clone)]
pub struct ProfileRule {
    pub sink: Regex,
    pub profile: Regex,
}

/// Raised when the cyclic scan cannot locate the current position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no match found: current sink/profile not in the candidate list (scanned {scanned} steps)")]
pub struct NoMatchError {
    pub scanned: usize,
}

/// The two-field-OR match predicate: does `pattern` match either string?
///
/// Sinks and profiles are matched against both their description and their
/// name, so filters work with whichever form the user knows.
#[must_use]
pub fn matches_either(pattern: &Regex, primary: &str, secondary: &str) -> bool {
    pattern.is_match(primary) || pattern.is_match(secondary)
}

/// Build the ordered candidate list from the device filter and profile rules.
///
/// Devices whose description does not match `device_pattern` are skipped
/// entirely. For each remaining device, every available profile of its card
/// is tested against the rules in supplied order; the first matching rule
/// yields one `(device, profile)` candidate and ends rule evaluation for that
/// profile. A device whose profiles match no rule contributes exactly one
/// `(device, None)` candidate, so every filtered device stays reachable.
///
/// An empty result (no device matched) is not an error here; [`advance`]
/// reports it as [`NoMatchError`].
#[must_use]
pub fn build_candidates(
    devices: &[Device],
    profiles_by_card: &HashMap<u32, Vec<Profile>>,
    device_pattern: &Regex,
    rules: &[ProfileRule],
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for device in devices {
        if !device_pattern.is_match(&device.description) {
            continue;
        }

        let profiles = profiles_by_card
            .get(&device.card_index)
            .map_or(&[][..], Vec::as_slice);

        let mut matched = 0usize;
        for profile in profiles.iter().filter(|p| p.available) {
            // First matching rule wins for this profile.
            for rule in rules {
                if matches_either(&rule.sink, &device.description, &device.name)
                    && matches_either(&rule.profile, &profile.description, &profile.name)
                {
                    candidates.push(Candidate {
                        device: device.clone(),
                        profile: Some(profile.clone()),
                    });
                    matched += 1;
                    break;
                }
            }
        }

        if matched == 0 {
            candidates.push(Candidate {
                device: device.clone(),
                profile: None,
            });
        }
    }

    candidates
}

/// Locate the current position in the cyclic candidate list and return the
/// next candidate.
///
/// The scan is a bounded modular walk: `candidates[k % len]` for
/// `k in 0..scan_limit`. After the matching entry the walk closes one step
/// later, so the last candidate advances to the first. An empty list, or a
/// bound exhausted without a match, fails with [`NoMatchError`].
pub fn advance<'a>(
    candidates: &'a [Candidate],
    current: &CurrentPosition,
    scan_limit: usize,
) -> Result<&'a Candidate, NoMatchError> {
    if candidates.is_empty() {
        return Err(NoMatchError { scanned: 0 });
    }

    for k in 0..scan_limit {
        let idx = k % candidates.len();
        if candidates[idx].is_current(current) {
            return Ok(&candidates[(idx + 1) % candidates.len()]);
        }
    }

    Err(NoMatchError {
        scanned: scan_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn device(index: u32, name: &str, description: &str, card_index: u32) -> Device {
        Device {
            index,
            name: name.to_string(),
            description: description.to_string(),
            card_index,
        }
    }

    fn profile(name: &str, description: &str) -> Profile {
        Profile {
            name: name.to_string(),
            description: description.to_string(),
            available: true,
        }
    }

    fn rule(sink: &str, profile: &str) -> ProfileRule {
        ProfileRule {
            sink: Regex::new(sink).unwrap(),
            profile: Regex::new(profile).unwrap(),
        }
    }

    fn any_rule() -> Vec<ProfileRule> {
        vec![rule("", "")]
    }

    #[test_case("Jabra", "Jabra Evolve", "alsa_output.usb", true; "primary match")]
    #[test_case("usb", "Jabra Evolve", "alsa_output.usb", true; "secondary match")]
    #[test_case("GP104", "Jabra Evolve", "alsa_output.usb", false; "neither matches")]
    #[test_case("", "anything", "at all", true; "empty pattern matches everything")]
    fn matches_either_cases(pattern: &str, primary: &str, secondary: &str, expected: bool) {
        let pattern = Regex::new(pattern).unwrap();
        assert_eq!(matches_either(&pattern, primary, secondary), expected);
    }

    #[test]
    fn no_devices_match_pattern_yields_empty_list() {
        let devices = vec![
            device(1, "alsa_output.a", "Headset", 1),
            device(2, "alsa_output.b", "Speakers", 2),
        ];
        let profiles = HashMap::new();
        let pattern = Regex::new("Projector").unwrap();

        let candidates = build_candidates(&devices, &profiles, &pattern, &any_rule());
        assert_eq!(candidates, vec![]);
    }

    #[test]
    fn device_without_profile_match_appears_exactly_once_with_none() {
        let devices = vec![device(1, "alsa_output.a", "Headset", 1)];
        let mut profiles = HashMap::new();
        profiles.insert(1, vec![profile("analog-stereo", "Analog Stereo")]);
        let pattern = Regex::new("").unwrap();
        // Rule never matches the profile, so the device falls back to None.
        let rules = vec![rule("Headset", "hdmi")];

        let candidates = build_candidates(&devices, &profiles, &pattern, &rules);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].device.name, "alsa_output.a");
        assert_eq!(candidates[0].profile, None);
    }

    #[test]
    fn one_candidate_per_matching_profile_and_no_fallback_entry() {
        let devices = vec![device(3, "alsa_output.gpu", "Monitor GP104", 3)];
        let mut profiles = HashMap::new();
        profiles.insert(
            3,
            vec![
                profile("hdmi-stereo-1", "HDMI1"),
                profile("hdmi-stereo-2", "HDMI2"),
            ],
        );
        let pattern = Regex::new("").unwrap();
        let rules = vec![rule("GP104", "HDMI1"), rule("GP104", "HDMI2")];

        let candidates = build_candidates(&devices, &profiles, &pattern, &rules);
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.profile.is_some()));
        assert_eq!(candidates[0].profile.as_ref().unwrap().name, "hdmi-stereo-1");
        assert_eq!(candidates[1].profile.as_ref().unwrap().name, "hdmi-stereo-2");
    }

    #[test]
    fn first_matching_rule_wins_per_profile() {
        let devices = vec![device(3, "alsa_output.gpu", "Monitor", 3)];
        let mut profiles = HashMap::new();
        profiles.insert(3, vec![profile("hdmi-stereo", "HDMI Stereo")]);
        let pattern = Regex::new("").unwrap();
        // Both rules match the single profile; only one candidate results.
        let rules = vec![rule("Monitor", "HDMI"), rule("Monitor", "Stereo")];

        let candidates = build_candidates(&devices, &profiles, &pattern, &rules);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].profile.as_ref().unwrap().name, "hdmi-stereo");
    }

    #[test]
    fn unavailable_profiles_are_ignored() {
        let devices = vec![device(1, "alsa_output.a", "Headset", 1)];
        let mut profiles = HashMap::new();
        profiles.insert(
            1,
            vec![Profile {
                name: "hdmi-stereo".to_string(),
                description: "HDMI Stereo".to_string(),
                available: false,
            }],
        );
        let pattern = Regex::new("").unwrap();

        let candidates = build_candidates(&devices, &profiles, &pattern, &any_rule());
        // The only profile is unplugged, so the device falls back to None.
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].profile, None);
    }

    #[test]
    fn default_empty_rule_enumerates_every_available_profile() {
        let devices = vec![device(1, "alsa_output.a", "Headset", 1)];
        let mut profiles = HashMap::new();
        profiles.insert(
            1,
            vec![profile("analog-stereo", "Analog Stereo"), profile("off", "Off")],
        );
        let pattern = Regex::new("").unwrap();

        let candidates = build_candidates(&devices, &profiles, &pattern, &any_rule());
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.profile.is_some()));
    }

    #[test]
    fn candidate_order_follows_device_then_profile_enumeration() {
        let devices = vec![
            device(1, "alsa_output.a", "Headset", 1),
            device(2, "alsa_output.b", "Speakers", 2),
        ];
        let mut profiles = HashMap::new();
        profiles.insert(1, vec![profile("p1", "P1"), profile("p2", "P2")]);
        profiles.insert(2, vec![profile("p3", "P3")]);
        let pattern = Regex::new("").unwrap();

        let candidates = build_candidates(&devices, &profiles, &pattern, &any_rule());
        let order: Vec<(u32, &str)> = candidates
            .iter()
            .map(|c| (c.device.index, c.profile.as_ref().unwrap().name.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "p1"), (1, "p2"), (2, "p3")]);
    }

    #[test]
    fn advance_is_cyclic_from_last_to_first() {
        let candidates = vec![
            Candidate {
                device: device(1, "a", "Headset", 1),
                profile: None,
            },
            Candidate {
                device: device(2, "b", "Speakers", 2),
                profile: None,
            },
        ];
        let current = CurrentPosition {
            card_index: 2,
            profile_name: "analog-stereo".to_string(),
        };

        let next = advance(&candidates, &current, SCAN_LIMIT).unwrap();
        assert_eq!(next.device.card_index, 1);
    }

    #[test]
    fn advance_skips_same_card_with_different_profile() {
        // Candidate specifies hdmi on card 1; the live profile is analog.
        // "Same card, wrong profile" is not current, so the match lands on
        // the plain card-2 entry and the cycle wraps back to card 1.
        let candidates = vec![
            Candidate {
                device: device(1, "a", "Monitor", 1),
                profile: Some(profile("hdmi-stereo", "HDMI Stereo")),
            },
            Candidate {
                device: device(2, "b", "Speakers", 2),
                profile: None,
            },
        ];
        let current = CurrentPosition {
            card_index: 1,
            profile_name: "analog-stereo".to_string(),
        };

        let next = advance(&candidates, &current, SCAN_LIMIT).unwrap();
        assert_eq!(next.device.card_index, 1);
        assert_eq!(next.profile.as_ref().unwrap().name, "hdmi-stereo");
    }

    #[test]
    fn advance_fails_on_empty_candidates() {
        let current = CurrentPosition {
            card_index: 1,
            profile_name: "analog-stereo".to_string(),
        };
        let err = advance(&[], &current, SCAN_LIMIT).unwrap_err();
        assert_eq!(err, NoMatchError { scanned: 0 });
    }

    #[test]
    fn advance_fails_when_current_card_filtered_out() {
        // Deterministic: the bound is exhausted without a match.
        let candidates = vec![Candidate {
            device: device(2, "b", "Speakers", 2),
            profile: None,
        }];
        let current = CurrentPosition {
            card_index: 9,
            profile_name: "analog-stereo".to_string(),
        };

        let err = advance(&candidates, &current, SCAN_LIMIT).unwrap_err();
        assert_eq!(err.scanned, SCAN_LIMIT);
        assert!(err.to_string().contains("no match found"));
    }

    #[test]
    fn advance_scan_limit_is_a_real_bound() {
        let candidates = vec![
            Candidate {
                device: device(1, "a", "Headset", 1),
                profile: None,
            },
            Candidate {
                device: device(2, "b", "Speakers", 2),
                profile: None,
            },
        ];
        let current = CurrentPosition {
            card_index: 2,
            profile_name: "x".to_string(),
        };

        // Bound 1 only inspects index 0, which is not current.
        assert!(advance(&candidates, &current, 1).is_err());
        // Bound 2 reaches index 1 and wraps to index 0.
        let next = advance(&candidates, &current, 2).unwrap();
        assert_eq!(next.device.card_index, 1);
        // Bound 0 never matches anything.
        assert!(advance(&candidates, &current, 0).is_err());
    }

    // End-to-end scenario A: two plain devices, no profile rules.
    #[test]
    fn scenario_headset_to_speakers_without_profiles() {
        let devices = vec![
            device(1, "alsa_output.headset", "Headset", 1),
            device(2, "alsa_output.speakers", "Speakers", 2),
        ];
        let profiles = HashMap::new();
        let pattern = Regex::new("").unwrap();

        let candidates = build_candidates(&devices, &profiles, &pattern, &any_rule());
        assert_eq!(
            candidates
                .iter()
                .map(|c| (c.device.description.as_str(), c.profile.is_none()))
                .collect::<Vec<_>>(),
            vec![("Headset", true), ("Speakers", true)]
        );

        let current = CurrentPosition {
            card_index: 1,
            profile_name: "profile-x".to_string(),
        };
        let next = advance(&candidates, &current, SCAN_LIMIT).unwrap();
        assert_eq!(next.device.description, "Speakers");
        assert_eq!(next.profile, None);
    }

    // End-to-end scenario B: a profile rule match suppresses the None entry.
    #[test]
    fn scenario_monitor_rule_selects_profile_without_fallback() {
        let devices = vec![device(3, "alsa_output.monitor", "Monitor", 3)];
        let mut profiles = HashMap::new();
        profiles.insert(
            3,
            vec![profile("hdmi-stereo-1", "HDMI1"), profile("hdmi-stereo-2", "HDMI2")],
        );
        let pattern = Regex::new("").unwrap();
        let rules = vec![rule("Monitor", "HDMI2")];

        let candidates = build_candidates(&devices, &profiles, &pattern, &rules);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].profile.as_ref().unwrap().name, "hdmi-stereo-2");
    }
}
