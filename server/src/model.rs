use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geom::LonLat;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserID(pub u64);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserID,
    pub name: String,
    pub pw_salt: String,
    pub pw_hash: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: Uuid,
    pub user: UserID,
    pub expiry: DateTime<Utc>,
}

/// Phases only ever advance, in declaration order. `Invalid` is a sink for lobbies that broke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GamePhase {
    BeforeStart,
    Run,
    LocationNarrowing,
    Endgame,
    Finished,
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Hider,
    Seeker,
}

/// An armed thermometer: where the seeker started, and how far they promised to move before
/// reading it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Thermometer {
    pub start: LonLat,
    pub distance_meters: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CardKind {
    TimeBonus,
    Curse,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub title: String,
    pub description: String,
    pub kind: CardKind,
    /// Extra time added to the end-of-run countdown, in seconds.
    pub bonus_secs: u64,
    /// How long a curse stays in force once activated, in seconds. Zero means no limit.
    pub expiration_secs: u64,
    pub activated: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentDraw {
    pub cards: Vec<Card>,
    pub to_pick: u32,
}

impl CurrentDraw {
    pub fn empty() -> CurrentDraw {
        CurrentDraw {
            cards: Vec::new(),
            to_pick: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOpportunity {
    #[serde(rename = "drawID")]
    pub draw_id: u64,
    pub cards_to_draw: u32,
    pub cards_to_pick: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lobby {
    pub code: String,
    pub creator: UserID,
    pub hider: Option<UserID>,
    pub seeker: Option<UserID>,
    pub phase: GamePhase,
    pub hider_ready: bool,
    pub seeker_ready: bool,
    pub run_start: Option<DateTime<Utc>>,
    pub hider_pt: Option<LonLat>,
    pub seeker_pt: Option<LonLat>,
    pub zone_center: Option<LonLat>,
    pub thermometer: Option<Thermometer>,
    /// The accumulated exclusion mask, as serialized GeoJSON.
    pub mask: String,
    pub remaining_cards: Vec<Card>,
    pub hider_deck: Vec<Card>,
    pub current_draw: Option<CurrentDraw>,
    pub draw_opportunities: Vec<DrawOpportunity>,
    pub history: Vec<HistoryItem>,
}

impl Lobby {
    pub fn new(code: String, creator: UserID, mask: String) -> Lobby {
        Lobby {
            code,
            creator,
            hider: None,
            seeker: None,
            phase: GamePhase::BeforeStart,
            hider_ready: false,
            seeker_ready: false,
            run_start: None,
            hider_pt: None,
            seeker_pt: None,
            zone_center: None,
            thermometer: None,
            mask,
            remaining_cards: Vec::new(),
            hider_deck: Vec::new(),
            current_draw: None,
            draw_opportunities: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn role_of(&self, user: UserID) -> Option<Role> {
        if self.hider == Some(user) {
            Some(Role::Hider)
        } else if self.seeker == Some(user) {
            Some(Role::Seeker)
        } else {
            None
        }
    }

    /// Phases never regress.
    pub fn advance(&mut self, to: GamePhase) {
        if to < self.phase {
            warn!(
                "lobby {} refusing to regress from {:?} to {:?}",
                self.code, self.phase, to
            );
            return;
        }
        self.phase = to;
    }

    pub fn record(&mut self, title: &str, description: String) {
        self.history.push(HistoryItem {
            title: title.to_string(),
            description,
        });
    }
}
