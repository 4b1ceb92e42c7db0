use std::fmt;

use chrono::{DateTime, Utc};

use super::ids::{ChampionId, MatchId, Puuid};

#[derive(Debug, Clone)]
pub struct Match {
    pub match_id: MatchId,
    pub game_creation: DateTime<Utc>,
    /// Game length in seconds.
    pub game_duration: u64,
    pub game_version: String,
    pub queue_id: u16,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub puuid: Puuid,
    pub riot_id: String,
    pub champ_id: ChampionId,
    pub champion_name: String,
    pub team_id: u16,
    pub role: Role,
    pub win: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub gold_earned: u32,
    pub total_minions_killed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Top,
    Jungle,
    Middle,
    Bottom,
    Utility,
    Unknown,
}

impl Match {
    pub fn participant(&self, puuid: &Puuid) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.puuid == puuid)
    }
}

impl Participant {
    pub fn kda(&self) -> f64 {
        f64::from(self.kills + self.assists) / f64::from(self.deaths.max(1))
    }
}

impl Role {
    /// Maps the `teamPosition` value of match-v5. Remakes and some game modes
    /// report an empty position.
    pub fn from_team_position(position: &str) -> Self {
        match position {
            "TOP" => Role::Top,
            "JUNGLE" => Role::Jungle,
            "MIDDLE" => Role::Middle,
            "BOTTOM" => Role::Bottom,
            "UTILITY" => Role::Utility,
            _ => Role::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Top => write!(f, "Top"),
            Role::Jungle => write!(f, "Jungle"),
            Role::Middle => write!(f, "Middle"),
            Role::Bottom => write!(f, "Bottom"),
            Role::Utility => write!(f, "Support"),
            Role::Unknown => write!(f, "Unknown"),
        }
    }
}
