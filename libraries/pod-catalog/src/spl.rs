//! Smart playlist evaluation

use chrono::{DateTime, Duration, Utc};
use pod_core::{
    LimitKind, LimitSort, Playlist, PlaylistId, RuleAction, RuleField, SmartLimit, SmartPlaylist,
    SmartRule, Track, TrackId, ValueKind,
};
use rand::seq::SliceRandom;
use std::cmp::Reverse;
use tracing::trace;

/// Compute the members of a smart playlist
///
/// `own_id` is the playlist being evaluated; rules referencing it never match.
/// Playlist-reference rules test membership as currently recorded in `playlists`.
pub fn evaluate(
    smart: &SmartPlaylist,
    own_id: PlaylistId,
    tracks: &[Track],
    playlists: &[Playlist],
    now: DateTime<Utc>,
) -> Vec<TrackId> {
    let mut matched: Vec<&Track> = tracks
        .iter()
        .filter(|track| {
            let mut results = smart
                .rules
                .iter()
                .map(|rule| rule_matches(rule, track, own_id, playlists, now));
            if smart.prefs.match_any {
                smart.rules.is_empty() || results.any(|r| r)
            } else {
                results.all(|r| r)
            }
        })
        .collect();

    if let Some(limit) = smart.prefs.limit {
        matched = apply_limit(matched, limit);
    }

    matched.into_iter().map(|t| t.id).collect()
}

/// Whether a single rule accepts a track
pub fn rule_matches(
    rule: &SmartRule,
    track: &Track,
    own_id: PlaylistId,
    playlists: &[Playlist],
    now: DateTime<Utc>,
) -> bool {
    let (Some(field), Some(action)) = (rule.decoded_field(), rule.decoded_action()) else {
        trace!("Unknown rule field 0x{:x} / action 0x{:x}", rule.field, rule.action);
        return false;
    };
    let positive = action.positive();

    let hit = match field.kind() {
        ValueKind::String => {
            let value = string_value(field, track).to_lowercase();
            let needle = rule.string.to_lowercase();
            match positive {
                RuleAction::StringIs | RuleAction::Is => value == needle,
                RuleAction::Contains => value.contains(&needle),
                RuleAction::StartsWith => value.starts_with(&needle),
                RuleAction::EndsWith => value.ends_with(&needle),
                _ => return false,
            }
        }
        ValueKind::Int => compare(int_value(field, track), positive, rule),
        ValueKind::Timestamp => {
            let Some(stamp) = timestamp_value(field, track) else {
                return action.is_negated();
            };
            if positive == RuleAction::InTheLast {
                let span = rule.from_date.unsigned_abs().saturating_mul(rule.from_units);
                // A span reaching past the representable range covers every stamp
                i64::try_from(span)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|d| now.checked_sub_signed(d))
                    .map_or(true, |cutoff| stamp >= cutoff)
            } else {
                compare(stamp.timestamp().max(0).unsigned_abs(), positive, rule)
            }
        }
        ValueKind::Playlist => {
            let target = PlaylistId::new(rule.from_value);
            if target == own_id {
                return false;
            }
            playlists
                .iter()
                .find(|p| p.id == target)
                .is_some_and(|p| p.contains(track.id))
        }
    };

    hit != action.is_negated()
}

fn compare(value: u64, action: RuleAction, rule: &SmartRule) -> bool {
    match action {
        RuleAction::Is => value == rule.from_value,
        RuleAction::GreaterThan => value > rule.from_value,
        RuleAction::LessThan => value < rule.from_value,
        RuleAction::InRange => {
            let (lo, hi) = if rule.from_value <= rule.to_value {
                (rule.from_value, rule.to_value)
            } else {
                (rule.to_value, rule.from_value)
            };
            (lo..=hi).contains(&value)
        }
        _ => false,
    }
}

fn string_value(field: RuleField, track: &Track) -> String {
    match field {
        RuleField::Title => track.title.clone(),
        RuleField::Album => track.album.clone().unwrap_or_default(),
        RuleField::Artist => track.artist.clone().unwrap_or_default(),
        RuleField::Genre => track.genre.clone().unwrap_or_default(),
        RuleField::Kind => track
            .path
            .as_deref()
            .and_then(|p| p.rsplit_once('.'))
            .map(|(_, ext)| format!("{} audio file", ext.to_uppercase()))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

fn int_value(field: RuleField, track: &Track) -> u64 {
    match field {
        RuleField::Bitrate => track.bitrate.into(),
        RuleField::Year => track.year.unwrap_or(0).into(),
        RuleField::TrackNumber => track.track_number.unwrap_or(0).into(),
        RuleField::Size => track.size,
        RuleField::Time => u64::from(track.duration_ms) / 1000,
        RuleField::PlayCount => track.play_count.into(),
        RuleField::Rating => track.rating.into(),
        _ => 0,
    }
}

fn timestamp_value(field: RuleField, track: &Track) -> Option<DateTime<Utc>> {
    match field {
        RuleField::DateAdded | RuleField::DateModified => Some(track.added_at),
        RuleField::LastPlayed => track.last_played,
        _ => None,
    }
}

fn apply_limit(mut tracks: Vec<&Track>, limit: SmartLimit) -> Vec<&Track> {
    match limit.sort {
        LimitSort::Random => tracks.shuffle(&mut rand::thread_rng()),
        LimitSort::SongName => tracks.sort_by(|a, b| a.title.cmp(&b.title)),
        LimitSort::Album => tracks.sort_by(|a, b| a.album.cmp(&b.album)),
        LimitSort::Artist => tracks.sort_by(|a, b| a.artist.cmp(&b.artist)),
        LimitSort::Genre => tracks.sort_by(|a, b| a.genre.cmp(&b.genre)),
        LimitSort::MostRecentlyAdded => tracks.sort_by_key(|t| Reverse(t.added_at)),
        LimitSort::LeastRecentlyAdded => tracks.sort_by_key(|t| t.added_at),
        LimitSort::MostOftenPlayed => tracks.sort_by_key(|t| Reverse(t.play_count)),
        LimitSort::LeastOftenPlayed => tracks.sort_by_key(|t| t.play_count),
        LimitSort::MostRecentlyPlayed => tracks.sort_by_key(|t| Reverse(t.last_played)),
        LimitSort::LeastRecentlyPlayed => tracks.sort_by_key(|t| t.last_played),
        LimitSort::HighestRating => tracks.sort_by_key(|t| Reverse(t.rating)),
        LimitSort::LowestRating => tracks.sort_by_key(|t| t.rating),
    }

    let cap = u64::from(limit.value);
    let cap = match limit.kind {
        LimitKind::Songs => cap,
        LimitKind::Minutes => cap * 60_000,
        LimitKind::Hours => cap * 3_600_000,
        LimitKind::Megabytes => cap * 1024 * 1024,
        LimitKind::Gigabytes => cap * 1024 * 1024 * 1024,
    };

    let mut used = 0u64;
    tracks
        .into_iter()
        .take_while(|t| {
            used += match limit.kind {
                LimitKind::Songs => 1,
                LimitKind::Minutes | LimitKind::Hours => u64::from(t.duration_ms),
                LimitKind::Megabytes | LimitKind::Gigabytes => t.size,
            };
            used <= cap
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pod_core::{SmartPrefs, UNITS_DAY};

    fn track(id: u32, title: &str, artist: &str, rating: u8) -> Track {
        let mut t = Track::new(title, format!("/music/{title}.mp3"));
        t.id = TrackId::new(id);
        t.artist = Some(artist.to_string());
        t.rating = rating;
        t
    }

    fn smart(rules: Vec<SmartRule>, match_any: bool) -> SmartPlaylist {
        SmartPlaylist {
            prefs: SmartPrefs {
                match_any,
                ..SmartPrefs::default()
            },
            rules,
        }
    }

    fn string_rule(field: RuleField, action: RuleAction, s: &str) -> SmartRule {
        SmartRule {
            string: s.to_string(),
            ..SmartRule::new(field, action)
        }
    }

    #[test]
    fn string_contains_is_case_insensitive() {
        let tracks = vec![track(1, "Alpha", "The Band", 0), track(2, "Beta", "Other", 0)];
        let spl = smart(
            vec![string_rule(RuleField::Artist, RuleAction::Contains, "band")],
            false,
        );
        let ids = evaluate(&spl, PlaylistId::new(99), &tracks, &[], Utc::now());
        assert_eq!(ids, vec![TrackId::new(1)]);
    }

    #[test]
    fn negated_rule() {
        let tracks = vec![track(1, "Alpha", "X", 0), track(2, "Beta", "Y", 0)];
        let spl = smart(
            vec![string_rule(RuleField::Title, RuleAction::NotStartsWith, "al")],
            false,
        );
        let ids = evaluate(&spl, PlaylistId::new(99), &tracks, &[], Utc::now());
        assert_eq!(ids, vec![TrackId::new(2)]);
    }

    #[test]
    fn match_any_versus_all() {
        let tracks = vec![track(1, "Alpha", "X", 100), track(2, "Beta", "Y", 20)];
        let mut high = SmartRule::new(RuleField::Rating, RuleAction::GreaterThan);
        high.from_value = 60;
        let beta = string_rule(RuleField::Title, RuleAction::StringIs, "beta");

        let any = smart(vec![high.clone(), beta.clone()], true);
        assert_eq!(
            evaluate(&any, PlaylistId::new(99), &tracks, &[], Utc::now()).len(),
            2
        );
        let all = smart(vec![high, beta], false);
        assert!(evaluate(&all, PlaylistId::new(99), &tracks, &[], Utc::now()).is_empty());
    }

    #[test]
    fn playlist_reference_rule() {
        let tracks = vec![track(1, "Alpha", "X", 0), track(2, "Beta", "Y", 0)];
        let mut favourites = Playlist::standard("Favourites");
        favourites.id = PlaylistId::new(5);
        favourites.tracks = vec![TrackId::new(2)];

        let spl = smart(
            vec![SmartRule::playlist_ref(PlaylistId::new(5), RuleAction::Is)],
            false,
        );
        let ids = evaluate(&spl, PlaylistId::new(99), &tracks, &[favourites], Utc::now());
        assert_eq!(ids, vec![TrackId::new(2)]);
    }

    #[test]
    fn in_the_last_days() {
        let now = Utc::now();
        let mut recent = track(1, "Recent", "X", 0);
        recent.last_played = Some(now - Duration::days(2));
        let mut old = track(2, "Old", "X", 0);
        old.last_played = Some(now - Duration::days(30));
        let never = track(3, "Never", "X", 0);

        let mut rule = SmartRule::new(RuleField::LastPlayed, RuleAction::InTheLast);
        rule.from_date = -7;
        rule.from_units = UNITS_DAY;
        let ids = evaluate(
            &smart(vec![rule], false),
            PlaylistId::new(99),
            &[recent, old, never],
            &[],
            now,
        );
        assert_eq!(ids, vec![TrackId::new(1)]);
    }

    #[test]
    fn in_the_last_beyond_the_calendar_matches_everything() {
        let now = Utc::now();
        let mut played = track(1, "Played", "X", 0);
        played.last_played = Some(now);
        let mut ancient = track(2, "Ancient", "X", 0);
        ancient.last_played = DateTime::from_timestamp(0, 0);
        let never = track(3, "Never", "X", 0);

        let mut rule = SmartRule::new(RuleField::LastPlayed, RuleAction::InTheLast);
        rule.from_date = -1_000_000_000;
        rule.from_units = UNITS_DAY;
        let ids = evaluate(
            &smart(vec![rule], false),
            PlaylistId::new(99),
            &[played, ancient, never],
            &[],
            now,
        );
        assert_eq!(ids, vec![TrackId::new(1), TrackId::new(2)]);
    }

    #[test]
    fn limit_by_song_count_sorted_by_rating() {
        let tracks = vec![
            track(1, "A", "X", 20),
            track(2, "B", "X", 100),
            track(3, "C", "X", 60),
        ];
        let mut spl = smart(Vec::new(), false);
        spl.prefs.limit = Some(SmartLimit {
            kind: LimitKind::Songs,
            value: 2,
            sort: LimitSort::HighestRating,
        });
        let ids = evaluate(&spl, PlaylistId::new(99), &tracks, &[], Utc::now());
        assert_eq!(ids, vec![TrackId::new(2), TrackId::new(3)]);
    }

    #[test]
    fn unknown_codes_never_match() {
        let tracks = vec![track(1, "A", "X", 0)];
        let rule = SmartRule {
            field: 0x99,
            action: 0x1,
            ..SmartRule::default()
        };
        let ids = evaluate(&smart(vec![rule], false), PlaylistId::new(99), &tracks, &[], Utc::now());
        assert!(ids.is_empty());
    }
}
