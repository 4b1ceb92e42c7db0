use std::{collections::HashMap, path::PathBuf, process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use riftwatch::{
    config::{RiotClientConfig, DEFAULT_STORAGE_DIR},
    model::{ids::Puuid, matches::Match},
    service::{
        data_manager::{DataManager, DataManagerInitError, DataRetrievalError},
        stats::StatsService,
    },
};

/// League of Legends API client with local caching and match statistics
#[derive(Parser, Debug)]
#[command(name = "riftwatch")]
#[command(version, about, long_about = None)]
struct Args {
    /// Riot developer API key
    #[arg(long, env = "RIOT_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Platform to query, e.g. euw1, na1, kr
    #[arg(short, long, env = "RIOT_REGION", default_value = "")]
    region: String,

    /// Data Dragon version for static data, or "latest"
    #[arg(long, env = "RIOT_VERSION", default_value = "latest")]
    version: String,

    /// Directory for stored responses
    #[arg(long, env = "RIFTWATCH_STORAGE_DIR", default_value = DEFAULT_STORAGE_DIR)]
    storage_dir: PathBuf,

    /// Seconds to wait for a single API call, including rate limit waits
    #[arg(long, env = "RIFTWATCH_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Random spread (0 to 1) added to rate limit waits
    #[arg(long, env = "RIFTWATCH_JITTER", default_value_t = 0.0)]
    jitter: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up an account by Riot id
    Account { name: String, tag: String },
    /// Show summoner profile
    Summoner { name: String, tag: String },
    /// Show ranked entries
    League { name: String, tag: String },
    /// Show the champions with the most mastery points
    Mastery {
        name: String,
        tag: String,
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },
    /// Fetch and store the most recent matches
    Matches {
        name: String,
        tag: String,
        #[arg(short, long, default_value_t = 20)]
        count: u32,
    },
    /// Statistics over stored matches, optionally for one player
    Stats { name: Option<String>, tag: Option<String> },
    /// Current free champion rotation
    Rotation,
    /// Show the player's live game
    Live { name: String, tag: String },
    /// List champions of the configured version
    Champions,
    /// List purchasable items of the configured version
    Items,
}

impl Args {
    fn config(&self) -> RiotClientConfig {
        let mut config = RiotClientConfig::new(&self.api_key, &self.region, &self.version);
        config.call_timeout = Duration::from_secs(self.timeout);
        config.jitter = self.jitter;
        config.storage_dir = self.storage_dir.clone();
        config
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Error occured while initializing:\n{0}")]
    Init(#[from] DataManagerInitError),
    #[error("Error occured while fetching data:\n{0}")]
    Retrieval(#[from] DataRetrievalError),
    #[error("A riot id needs both a name and a tag")]
    IncompleteRiotId,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let manager = DataManager::new(&args.config())?;

    match args.command {
        Command::Account { name, tag } => {
            let account = manager.get_account(&name, &tag)?;
            println!("{}  {}", account.riot_id(), account.puuid);
        }
        Command::Summoner { name, tag } => {
            let account = manager.get_account(&name, &tag)?;
            let summoner = manager.get_summoner(&account.puuid)?;
            println!("{}", account.riot_id());
            println!("  Level:        {}", summoner.level);
            println!("  Profile icon: {}", summoner.profile_icon_id);
            println!("  Last update:  {}", summoner.revision_date.format("%Y-%m-%d %H:%M"));
        }
        Command::League { name, tag } => {
            let account = manager.get_account(&name, &tag)?;
            let entries = manager.get_league_entries(&account.puuid)?;
            if entries.is_empty() {
                println!("{} is unranked", account.riot_id());
            }
            for entry in entries {
                println!(
                    "{:<20} {} {} {} LP  {}W {}L ({:.1}%){}",
                    entry.queue_type,
                    entry.tier,
                    entry.rank,
                    entry.league_points,
                    entry.wins,
                    entry.losses,
                    entry.win_rate() * 100.0,
                    if entry.hot_streak { "  on a streak" } else { "" }
                );
            }
        }
        Command::Mastery { name, tag, top } => {
            let account = manager.get_account(&name, &tag)?;
            let mut masteries = manager.get_masteries(&account.puuid)?;
            masteries.sort_by(|a, b| b.points.cmp(&a.points));
            let names = manager
                .get_champions()?
                .iter()
                .map(|c| (c.key.clone(), c.name.as_str()))
                .collect::<HashMap<_, _>>();
            for mastery in masteries.iter().take(top) {
                let champion = names.get(&mastery.champ_id).copied().unwrap_or(mastery.champ_id.0.as_str());
                println!(
                    "{:<16} level {:>2} {:>9} pts  last played {}",
                    champion,
                    mastery.level,
                    mastery.points,
                    mastery.last_play_time.format("%Y-%m-%d")
                );
            }
        }
        Command::Matches { name, tag, count } => {
            let account = manager.get_account(&name, &tag)?;
            let matches = manager.fetch_recent_matches(&account.puuid, count)?;
            for game in &matches {
                print_match_line(game, &account.puuid);
            }
            info!(stored = matches.len(), "matches up to date");
        }
        Command::Stats { name, tag } => {
            let matches = manager.stored_matches()?;
            match (name, tag) {
                (Some(name), Some(tag)) => {
                    let account = manager.get_account(&name, &tag)?;
                    let service = StatsService::for_player(matches, account.puuid.clone());
                    print_player_summary(&service, &account.puuid);
                    print_champion_stats(&service);
                }
                (None, None) => print_champion_stats(&StatsService::new(matches)),
                _ => return Err(CliError::IncompleteRiotId),
            }
        }
        Command::Rotation => {
            let rotation = manager.get_rotation()?;
            let names = manager
                .get_champions()?
                .iter()
                .map(|c| (c.key.clone(), c.name.as_str()))
                .collect::<HashMap<_, _>>();
            println!("Free champions:");
            for id in &rotation.free_champion_ids {
                println!("  {}", names.get(id).copied().unwrap_or(id.0.as_str()));
            }
            println!("New players up to level {}:", rotation.max_new_player_level);
            for id in &rotation.free_champion_ids_for_new_players {
                println!("  {}", names.get(id).copied().unwrap_or(id.0.as_str()));
            }
        }
        Command::Live { name, tag } => {
            let account = manager.get_account(&name, &tag)?;
            match manager.get_active_game(&account.puuid)? {
                Some(game) => {
                    let names = manager
                        .get_champions()?
                        .iter()
                        .map(|c| (c.key.clone(), c.name.as_str()))
                        .collect::<HashMap<_, _>>();
                    println!("{} game {} started {}", game.game_mode, game.game_id, game.game_start_time);
                    for player in &game.participants {
                        let champion = names.get(&player.champ_id).copied().unwrap_or(player.champ_id.0.as_str());
                        let riot_id = if player.riot_id.is_empty() { "<hidden>" } else { player.riot_id.as_str() };
                        println!("  [{}] {:<24} {}", player.team_id, riot_id, champion);
                    }
                }
                None => println!("{} is not in a game", account.riot_id()),
            }
        }
        Command::Champions => {
            let mut champions = manager.get_champions()?.iter().collect::<Vec<_>>();
            champions.sort_by(|a, b| a.name.cmp(&b.name));
            for champ in champions {
                println!("{:<16} {:<28} {}", champ.name, champ.title, champ.tags.join(", "));
            }
        }
        Command::Items => {
            let mut items = manager.get_items()?.iter().filter(|i| i.purchasable).collect::<Vec<_>>();
            items.sort_by(|a, b| a.name.cmp(&b.name));
            for item in items {
                println!("{:>6} {:<40} {}g", item.id.0, item.name, item.gold_total);
            }
        }
    }

    manager.client().stop();
    Ok(())
}

fn print_match_line(game: &Match, puuid: &Puuid) {
    let Some(player) = game.participant(puuid) else {
        return;
    };
    println!(
        "{}  {}  {:<12} {:<8} {}/{}/{}  {}:{:02}  {}",
        game.game_creation.format("%Y-%m-%d"),
        game.match_id,
        player.champion_name,
        player.role.to_string(),
        player.kills,
        player.deaths,
        player.assists,
        game.game_duration / 60,
        game.game_duration % 60,
        if player.win { "Win" } else { "Loss" }
    );
}

fn print_player_summary(service: &StatsService, puuid: &Puuid) {
    let summary = service.player_summary(puuid);
    println!(
        "{} games, {} wins ({:.1}%)",
        summary.games,
        summary.wins,
        summary.win_rate * 100.0
    );
    println!(
        "Average {:.1} / {:.1} / {:.1}, median game {:.0} min",
        summary.mean_kills,
        summary.mean_deaths,
        summary.mean_assists,
        summary.median_game_duration / 60.0
    );
    for (role, games) in &summary.games_per_role {
        println!("  {:<8} {}", role.to_string(), games);
    }
    println!();
}

fn print_champion_stats(service: &StatsService) {
    println!("{:<14} {:>5} {:>7} {:>7} {:>6}", "Champion", "Games", "Win %", "Pick %", "KDA");
    for stats in service.champion_stats() {
        println!(
            "{:<14} {:>5} {:>6.1}% {:>6.1}% {:>6.2}",
            stats.champion_name,
            stats.games,
            stats.win_rate * 100.0,
            stats.pick_rate * 100.0,
            stats.average_kda
        );
    }

    let roles = service.role_breakdown();
    if !roles.is_empty() {
        println!();
        for role in roles {
            println!("{:<8} {:>4} games {:>6.1}%", role.role.to_string(), role.games, role.win_rate * 100.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mastery_command() {
        let args = Args::try_parse_from(["riftwatch", "--region", "euw1", "mastery", "Alpha", "EUW", "--top", "3"]).unwrap();
        match args.command {
            Command::Mastery { ref name, ref tag, top } => {
                assert_eq!((name.as_str(), tag.as_str(), top), ("Alpha", "EUW", 3));
            }
            ref other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(args.config().region, "euw1");
    }
}
