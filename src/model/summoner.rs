use chrono::{DateTime, Utc};

use super::ids::Puuid;

/// Riot account, resolved from a Riot id (`name#tag`).
#[derive(Debug, Clone)]
pub struct Account {
    pub puuid: Puuid,
    pub game_name: String,
    pub tag_line: String,
}

#[derive(Debug, Clone)]
pub struct Summoner {
    pub puuid: Puuid,
    pub profile_icon_id: u32,
    pub level: u32,
    pub revision_date: DateTime<Utc>,
}

impl Account {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}
