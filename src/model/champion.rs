use super::ids::ChampionId;

/// Static champion data from Data Dragon. `key` is the numeric id the match
/// endpoints report, `id` is the Data Dragon name key (e.g. `MonkeyKing`).
#[derive(Debug, Clone)]
pub struct Champion {
    pub id: String,
    pub key: ChampionId,
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ChampionRotation {
    pub free_champion_ids: Vec<ChampionId>,
    pub free_champion_ids_for_new_players: Vec<ChampionId>,
    pub max_new_player_level: u32,
}

impl Champion {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
