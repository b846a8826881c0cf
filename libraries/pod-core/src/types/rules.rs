//! Decode tables for smart-playlist rule codes.
//!
//! Rule field and action codes are stored raw in the catalog; these closed
//! enums map each known code to its display label, value kind and unit.

use serde::{Deserialize, Serialize};

/// Seconds per unit of an "in the last" rule
pub const UNITS_DAY: u64 = 86_400;
pub const UNITS_WEEK: u64 = 604_800;
pub const UNITS_MONTH: u64 = 2_628_000;

/// How a rule's value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Int,
    Timestamp,
    Playlist,
}

/// Track attribute a smart rule tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleField {
    Title,
    Album,
    Artist,
    Bitrate,
    SampleRate,
    Year,
    Genre,
    Kind,
    DateModified,
    TrackNumber,
    Size,
    Time,
    Comment,
    DateAdded,
    Composer,
    PlayCount,
    LastPlayed,
    DiscNumber,
    Rating,
    Compilation,
    Bpm,
    Grouping,
    Playlist,
}

impl RuleField {
    pub const ALL: [RuleField; 23] = [
        Self::Title,
        Self::Album,
        Self::Artist,
        Self::Bitrate,
        Self::SampleRate,
        Self::Year,
        Self::Genre,
        Self::Kind,
        Self::DateModified,
        Self::TrackNumber,
        Self::Size,
        Self::Time,
        Self::Comment,
        Self::DateAdded,
        Self::Composer,
        Self::PlayCount,
        Self::LastPlayed,
        Self::DiscNumber,
        Self::Rating,
        Self::Compilation,
        Self::Bpm,
        Self::Grouping,
        Self::Playlist,
    ];

    pub const fn code(self) -> u32 {
        match self {
            Self::Title => 0x02,
            Self::Album => 0x03,
            Self::Artist => 0x04,
            Self::Bitrate => 0x05,
            Self::SampleRate => 0x06,
            Self::Year => 0x07,
            Self::Genre => 0x08,
            Self::Kind => 0x09,
            Self::DateModified => 0x0a,
            Self::TrackNumber => 0x0b,
            Self::Size => 0x0c,
            Self::Time => 0x0d,
            Self::Comment => 0x0e,
            Self::DateAdded => 0x10,
            Self::Composer => 0x12,
            Self::PlayCount => 0x16,
            Self::LastPlayed => 0x17,
            Self::DiscNumber => 0x18,
            Self::Rating => 0x19,
            Self::Compilation => 0x1f,
            Self::Bpm => 0x23,
            Self::Grouping => 0x27,
            Self::Playlist => 0x28,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Track title",
            Self::Album => "Album",
            Self::Artist => "Artist",
            Self::Bitrate => "Bitrate",
            Self::SampleRate => "Sample rate",
            Self::Year => "Year",
            Self::Genre => "Genre",
            Self::Kind => "Kind",
            Self::DateModified => "Date modified",
            Self::TrackNumber => "Track number",
            Self::Size => "Size",
            Self::Time => "Time",
            Self::Comment => "Comment",
            Self::DateAdded => "Date added",
            Self::Composer => "Composer",
            Self::PlayCount => "Playcount",
            Self::LastPlayed => "Last played",
            Self::DiscNumber => "Disc number",
            Self::Rating => "Rating",
            Self::Compilation => "Compilation",
            Self::Bpm => "BPM",
            Self::Grouping => "Grouping",
            Self::Playlist => "Playlist",
        }
    }

    pub const fn kind(self) -> ValueKind {
        match self {
            Self::Title
            | Self::Album
            | Self::Artist
            | Self::Genre
            | Self::Kind
            | Self::Comment
            | Self::Composer
            | Self::Grouping => ValueKind::String,
            Self::DateModified | Self::DateAdded | Self::LastPlayed => ValueKind::Timestamp,
            Self::Playlist => ValueKind::Playlist,
            _ => ValueKind::Int,
        }
    }

    /// Unit appended to displayed values
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Bitrate => "Kbps",
            Self::SampleRate => "Hz",
            Self::Size => " Bytes",
            _ => "",
        }
    }
}

/// Comparison a smart rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleAction {
    Is,
    GreaterThan,
    LessThan,
    InRange,
    InTheLast,
    StringIs,
    Contains,
    StartsWith,
    EndsWith,
    IsNot,
    NotGreaterThan,
    NotLessThan,
    NotInRange,
    NotInTheLast,
    StringIsNot,
    NotContains,
    NotStartsWith,
    NotEndsWith,
}

impl RuleAction {
    pub const ALL: [RuleAction; 18] = [
        Self::Is,
        Self::GreaterThan,
        Self::LessThan,
        Self::InRange,
        Self::InTheLast,
        Self::StringIs,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::IsNot,
        Self::NotGreaterThan,
        Self::NotLessThan,
        Self::NotInRange,
        Self::NotInTheLast,
        Self::StringIsNot,
        Self::NotContains,
        Self::NotStartsWith,
        Self::NotEndsWith,
    ];

    pub const fn code(self) -> u32 {
        match self {
            Self::Is => 0x1,
            Self::GreaterThan => 0x10,
            Self::LessThan => 0x40,
            Self::InRange => 0x100,
            Self::InTheLast => 0x200,
            Self::StringIs => 0x0100_0001,
            Self::Contains => 0x0100_0002,
            Self::StartsWith => 0x0100_0004,
            Self::EndsWith => 0x0100_0008,
            Self::IsNot => 0x0200_0001,
            Self::NotGreaterThan => 0x0200_0010,
            Self::NotLessThan => 0x0200_0040,
            Self::NotInRange => 0x0200_0100,
            Self::NotInTheLast => 0x0200_0200,
            Self::StringIsNot => 0x0300_0001,
            Self::NotContains => 0x0300_0002,
            Self::NotStartsWith => 0x0300_0004,
            Self::NotEndsWith => 0x0300_0008,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.code() == code)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Is | Self::StringIs => "is",
            Self::GreaterThan => "is greater than",
            Self::LessThan => "is less than",
            Self::InRange => "is in the range",
            Self::InTheLast => "is in the last",
            Self::Contains => "contains",
            Self::StartsWith => "starts with",
            Self::EndsWith => "ends with",
            Self::IsNot | Self::StringIsNot => "is not",
            Self::NotGreaterThan => "is not greater than",
            Self::NotLessThan => "is not less than",
            Self::NotInRange => "is not in the range",
            Self::NotInTheLast => "is not in the last",
            Self::NotContains => "does not contain",
            Self::NotStartsWith => "does not start with",
            Self::NotEndsWith => "does not end with",
        }
    }

    pub const fn is_negated(self) -> bool {
        self.code() & 0x0200_0000 != 0
    }

    /// The non-negated form of this action
    pub fn positive(self) -> Self {
        match self {
            Self::IsNot => Self::Is,
            Self::NotGreaterThan => Self::GreaterThan,
            Self::NotLessThan => Self::LessThan,
            Self::NotInRange => Self::InRange,
            Self::NotInTheLast => Self::InTheLast,
            Self::StringIsNot => Self::StringIs,
            Self::NotContains => Self::Contains,
            Self::NotStartsWith => Self::StartsWith,
            Self::NotEndsWith => Self::EndsWith,
            other => other,
        }
    }
}

/// Unit of a smart playlist limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    Minutes,
    Megabytes,
    Songs,
    Hours,
    Gigabytes,
}

impl LimitKind {
    pub const fn code(self) -> u32 {
        match self {
            Self::Minutes => 0x01,
            Self::Megabytes => 0x02,
            Self::Songs => 0x03,
            Self::Hours => 0x04,
            Self::Gigabytes => 0x05,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        [
            Self::Minutes,
            Self::Megabytes,
            Self::Songs,
            Self::Hours,
            Self::Gigabytes,
        ]
        .into_iter()
        .find(|k| k.code() == code)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Megabytes => "Mb",
            Self::Songs => "songs",
            Self::Hours => "hours",
            Self::Gigabytes => "Gb",
        }
    }
}

/// Ordering used to pick tracks when a limit applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSort {
    Random,
    SongName,
    Album,
    Artist,
    Genre,
    MostRecentlyAdded,
    LeastRecentlyAdded,
    MostOftenPlayed,
    LeastOftenPlayed,
    MostRecentlyPlayed,
    LeastRecentlyPlayed,
    HighestRating,
    LowestRating,
}

impl LimitSort {
    const ALL: [LimitSort; 13] = [
        Self::Random,
        Self::SongName,
        Self::Album,
        Self::Artist,
        Self::Genre,
        Self::MostRecentlyAdded,
        Self::LeastRecentlyAdded,
        Self::MostOftenPlayed,
        Self::LeastOftenPlayed,
        Self::MostRecentlyPlayed,
        Self::LeastRecentlyPlayed,
        Self::HighestRating,
        Self::LowestRating,
    ];

    pub const fn code(self) -> u32 {
        match self {
            Self::Random => 0x02,
            Self::SongName => 0x03,
            Self::Album => 0x04,
            Self::Artist => 0x05,
            Self::Genre => 0x07,
            Self::MostRecentlyAdded => 0x10,
            Self::LeastRecentlyAdded => 0x8000_0010,
            Self::MostOftenPlayed => 0x14,
            Self::LeastOftenPlayed => 0x8000_0014,
            Self::MostRecentlyPlayed => 0x15,
            Self::LeastRecentlyPlayed => 0x8000_0015,
            Self::HighestRating => 0x17,
            Self::LowestRating => 0x8000_0017,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::SongName => "song name",
            Self::Album => "album",
            Self::Artist => "artist",
            Self::Genre => "genre",
            Self::MostRecentlyAdded => "most recently added",
            Self::LeastRecentlyAdded => "least recently added",
            Self::MostOftenPlayed => "most often played",
            Self::LeastOftenPlayed => "least often played",
            Self::MostRecentlyPlayed => "most recently played",
            Self::LeastRecentlyPlayed => "least recently played",
            Self::HighestRating => "highest rating",
            Self::LowestRating => "lowest rating",
        }
    }
}

/// Render milliseconds as `[h:]mm:ss`
pub fn pretty_time(ms: u64) -> String {
    let secs = ms / 1000;
    let (m, s) = (secs / 60, secs % 60);
    let (h, m) = (m / 60, m % 60);
    let h = h % 24;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Render the span of an "in the last" rule
pub fn in_the_last(from_date: i64, from_units: u64) -> String {
    let n = from_date.unsigned_abs();
    match from_units {
        UNITS_DAY => format!("{n} days"),
        UNITS_WEEK => format!("{n} weeks"),
        UNITS_MONTH => format!("{n} months"),
        other => format!("{n} x {other}s"),
    }
}
