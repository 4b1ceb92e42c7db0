use std::collections::BTreeMap;

use super::{ids::ChampionId, matches::Role};

#[derive(Debug, Clone, PartialEq)]
pub struct ChampionStats {
    pub champ_id: ChampionId,
    pub champion_name: String,
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub pick_rate: f64,
    pub average_kda: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleStats {
    pub role: Role,
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    pub games: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub mean_kills: f64,
    pub mean_deaths: f64,
    pub mean_assists: f64,
    /// Median game length in seconds.
    pub median_game_duration: f64,
    pub games_per_role: BTreeMap<Role, u32>,
}
