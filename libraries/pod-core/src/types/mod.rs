mod catalog;
mod ids;
mod playlist;
mod rules;
mod tags;
mod track;

pub use catalog::{CatalogKind, DiskSpace};
pub use ids::{PlaylistId, TrackId};
pub use playlist::{Playlist, PlaylistKind, SmartLimit, SmartPlaylist, SmartPrefs, SmartRule};
pub use rules::{
    in_the_last, pretty_time, LimitKind, LimitSort, RuleAction, RuleField, ValueKind, UNITS_DAY,
    UNITS_MONTH, UNITS_WEEK,
};
pub use tags::AudioTags;
pub use track::{Track, MARK_UNPLAYED_PENDING, MARK_UNPLAYED_UNKNOWN};
