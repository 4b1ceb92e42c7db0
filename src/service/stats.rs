use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;

use crate::model::{
    ids::{ChampionId, Puuid},
    matches::{Match, Participant},
    stats::{ChampionStats, PlayerSummary, RoleStats},
};

/// Aggregates over a set of matches, optionally restricted to one player.
pub struct StatsService {
    matches: Vec<Match>,
    player: Option<Puuid>,
}

impl StatsService {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches, player: None }
    }

    pub fn for_player(matches: Vec<Match>, puuid: Puuid) -> Self {
        Self {
            matches,
            player: Some(puuid),
        }
    }

    /// Matches that count towards the totals.
    fn considered_matches(&self) -> impl Iterator<Item = &Match> + '_ {
        self.matches.iter().filter(move |m| match &self.player {
            Some(puuid) => m.participant(puuid).is_some(),
            None => true,
        })
    }

    fn participants(&self) -> Vec<&Participant> {
        self.considered_matches()
            .flat_map(|m| m.participants.iter())
            .filter(|p| self.player.as_ref().map_or(true, |puuid| &p.puuid == puuid))
            .collect()
    }

    /// Sorted by games played, most first.
    pub fn champion_stats(&self) -> Vec<ChampionStats> {
        let total_matches = self.considered_matches().count();
        let mut picked_in: BTreeMap<&ChampionId, HashSet<&str>> = BTreeMap::new();
        for m in self.considered_matches() {
            for p in &m.participants {
                if self.player.as_ref().map_or(true, |puuid| &p.puuid == puuid) {
                    picked_in.entry(&p.champ_id).or_default().insert(m.match_id.0.as_str());
                }
            }
        }

        self.participants()
            .into_iter()
            .into_group_map_by(|p| p.champ_id.clone())
            .into_iter()
            .map(|(champ_id, rows)| {
                let games = rows.len() as u32;
                let wins = rows.iter().filter(|p| p.win).count() as u32;
                let picks = picked_in.get(&champ_id).map_or(0, |ids| ids.len());
                ChampionStats {
                    champ_id,
                    champion_name: rows[0].champion_name.clone(),
                    games,
                    wins,
                    win_rate: ratio(wins as f64, games as f64),
                    pick_rate: ratio(picks as f64, total_matches as f64),
                    average_kda: mean(rows.iter().map(|p| p.kda())),
                }
            })
            .sorted_by(|a, b| b.games.cmp(&a.games).then_with(|| a.champion_name.cmp(&b.champion_name)))
            .collect()
    }

    pub fn role_breakdown(&self) -> Vec<RoleStats> {
        self.participants()
            .into_iter()
            .into_group_map_by(|p| p.role)
            .into_iter()
            .map(|(role, rows)| {
                let games = rows.len() as u32;
                let wins = rows.iter().filter(|p| p.win).count() as u32;
                RoleStats {
                    role,
                    games,
                    wins,
                    win_rate: ratio(wins as f64, games as f64),
                }
            })
            .sorted_by_key(|stats| stats.role)
            .collect()
    }

    pub fn player_summary(&self, puuid: &Puuid) -> PlayerSummary {
        let games: Vec<(&Match, &Participant)> = self
            .matches
            .iter()
            .filter_map(|m| m.participant(puuid).map(|p| (m, p)))
            .collect();

        let wins = games.iter().filter(|(_, p)| p.win).count() as u32;
        let durations = games.iter().map(|(m, _)| m.game_duration).sorted().collect::<Vec<_>>();
        let games_per_role = games
            .iter()
            .map(|(_, p)| p.role)
            .counts()
            .into_iter()
            .map(|(role, n)| (role, n as u32))
            .collect();

        PlayerSummary {
            games: games.len() as u32,
            wins,
            win_rate: ratio(wins as f64, games.len() as f64),
            mean_kills: mean(games.iter().map(|(_, p)| f64::from(p.kills))),
            mean_deaths: mean(games.iter().map(|(_, p)| f64::from(p.deaths))),
            mean_assists: mean(games.iter().map(|(_, p)| f64::from(p.assists))),
            median_game_duration: median(&durations),
            games_per_role,
        }
    }
}

fn ratio(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    ratio(sum, count as f64)
}

/// Expects sorted input.
fn median(sorted: &[u64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}
