use chrono::{DateTime, Utc};

use super::ids::ChampionId;

#[derive(Debug, Clone)]
pub struct ChampionMastery {
    pub champ_id: ChampionId,
    pub level: u16,
    pub points: u32,
    pub last_play_time: DateTime<Utc>,
}
