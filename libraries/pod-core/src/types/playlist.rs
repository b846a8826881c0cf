/// Playlist domain types
use crate::types::rules::{in_the_last, pretty_time, LimitKind, LimitSort, RuleAction, RuleField};
use crate::types::{PlaylistId, TrackId, ValueKind};
use serde::{Deserialize, Serialize};

/// Role of a playlist within its catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistKind {
    /// Master playlist holding every track of the catalog
    Master,
    /// Podcast playlist
    Podcasts,
    /// Any other playlist, ordinary or smart
    Standard,
}

/// Playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Catalog-local identifier
    pub id: PlaylistId,

    /// Playlist name
    pub name: String,

    /// Playlist role
    pub kind: PlaylistKind,

    /// Rules, for smart playlists
    #[serde(default)]
    pub smart: Option<SmartPlaylist>,

    /// Member tracks in playlist order
    #[serde(default)]
    pub tracks: Vec<TrackId>,
}

impl Playlist {
    /// Create an ordinary playlist
    pub fn standard(name: impl Into<String>) -> Self {
        Self::with_kind(name, PlaylistKind::Standard)
    }

    /// Create a playlist of the given kind
    pub fn with_kind(name: impl Into<String>, kind: PlaylistKind) -> Self {
        Self {
            id: PlaylistId::UNASSIGNED,
            name: name.into(),
            kind,
            smart: None,
            tracks: Vec::new(),
        }
    }

    /// Create a smart playlist
    pub fn smart(name: impl Into<String>, smart: SmartPlaylist) -> Self {
        Self {
            smart: Some(smart),
            ..Self::standard(name)
        }
    }

    pub fn is_smart(&self) -> bool {
        self.smart.is_some()
    }

    pub fn is_master(&self) -> bool {
        self.kind == PlaylistKind::Master
    }

    pub fn is_podcasts(&self) -> bool {
        self.kind == PlaylistKind::Podcasts
    }

    pub fn contains(&self, id: TrackId) -> bool {
        self.tracks.contains(&id)
    }

    /// Copy of this playlist with the id reset, for adding to another catalog
    pub fn duplicate(&self) -> Self {
        Self {
            id: PlaylistId::UNASSIGNED,
            ..self.clone()
        }
    }
}

/// Smart playlist definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmartPlaylist {
    #[serde(default)]
    pub prefs: SmartPrefs,
    #[serde(default)]
    pub rules: Vec<SmartRule>,
}

/// Smart playlist preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmartPrefs {
    /// Re-evaluate whenever the catalog changes
    #[serde(default = "default_true")]
    pub live_update: bool,

    /// Match any rule instead of all of them
    #[serde(default)]
    pub match_any: bool,

    /// Optional size limit
    #[serde(default)]
    pub limit: Option<SmartLimit>,

    /// Only consider checked tracks
    #[serde(default)]
    pub match_checked_only: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SmartPrefs {
    fn default() -> Self {
        Self {
            live_update: true,
            match_any: false,
            limit: None,
            match_checked_only: false,
        }
    }
}

/// Limit applied after rule matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartLimit {
    pub kind: LimitKind,
    pub value: u32,
    pub sort: LimitSort,
}

/// A single smart playlist rule, stored with its raw codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartRule {
    pub field: u32,
    pub action: u32,
    #[serde(default)]
    pub string: String,
    #[serde(default)]
    pub from_value: u64,
    #[serde(default)]
    pub to_value: u64,
    #[serde(default)]
    pub from_date: i64,
    #[serde(default)]
    pub from_units: u64,
}

impl SmartRule {
    pub fn new(field: RuleField, action: RuleAction) -> Self {
        Self {
            field: field.code(),
            action: action.code(),
            ..Self::default()
        }
    }

    /// Rule referencing another playlist
    pub fn playlist_ref(id: PlaylistId, action: RuleAction) -> Self {
        Self {
            from_value: id.get(),
            to_value: id.get(),
            ..Self::new(RuleField::Playlist, action)
        }
    }

    pub fn decoded_field(&self) -> Option<RuleField> {
        RuleField::from_code(self.field)
    }

    pub fn decoded_action(&self) -> Option<RuleAction> {
        RuleAction::from_code(self.action)
    }

    /// Playlist this rule references, if it is a playlist rule
    pub fn playlist_reference(&self) -> Option<PlaylistId> {
        (self.field == RuleField::Playlist.code()).then(|| PlaylistId::new(self.from_value))
    }

    /// Human-readable rendering; `playlist_name` resolves playlist references
    pub fn describe(&self, playlist_name: impl Fn(PlaylistId) -> Option<String>) -> String {
        let field = self.decoded_field();
        let action = self.decoded_action();

        let field_label = field
            .map(|f| f.label().to_string())
            .unwrap_or_else(|| format!("field 0x{:x}", self.field));
        let action_label = action
            .map(|a| a.label().to_string())
            .unwrap_or_else(|| format!("action 0x{:x}", self.action));
        let head = format!("{field_label:<15.15} {action_label:<20.20}");
        let head = head.trim_end();

        let suffix = field.map_or("", RuleField::suffix);
        let (from, to) = if field == Some(RuleField::Rating) {
            (self.from_value / 20, self.to_value / 20)
        } else {
            (self.from_value, self.to_value)
        };

        let value = match (field, action.map(RuleAction::positive)) {
            (_, Some(RuleAction::InRange)) => format!("{from}{suffix} and {to}{suffix}."),
            (_, Some(RuleAction::InTheLast)) => in_the_last(self.from_date, self.from_units),
            (Some(RuleField::Time), _) => pretty_time(from * 1000),
            (Some(f), _) if f.kind() == ValueKind::Playlist => {
                let id = PlaylistId::new(self.from_value);
                playlist_name(id).unwrap_or_else(|| format!("<unknown playlist {id}>"))
            }
            (Some(f), _) if f.kind() == ValueKind::String => format!("\"{}\"", self.string),
            _ => format!("{from}{suffix}"),
        };

        format!("{head} {value}")
    }
}
