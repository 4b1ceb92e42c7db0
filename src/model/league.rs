#[derive(Debug, Clone)]
pub struct LeagueEntry {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
    pub hot_streak: bool,
}

impl LeagueEntry {
    pub fn win_rate(&self) -> f64 {
        let games = self.wins + self.losses;
        if games == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(games)
    }
}
