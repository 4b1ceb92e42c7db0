use chrono::{DateTime, Utc};

use super::ids::{ChampionId, Puuid};

#[derive(Debug, Clone)]
pub struct ActiveGame {
    pub game_id: u64,
    pub game_mode: String,
    pub game_start_time: DateTime<Utc>,
    pub participants: Vec<ActiveGameParticipant>,
}

#[derive(Debug, Clone)]
pub struct ActiveGameParticipant {
    pub puuid: Option<Puuid>,
    pub riot_id: String,
    pub champ_id: ChampionId,
    pub team_id: u16,
}
