use json::JsonValue;

use crate::model::livegame::{ActiveGame, ActiveGameParticipant};

use super::{str_field, timestamp_millis, ParsingError};

pub fn parse_active_game(json: &JsonValue) -> Result<ActiveGame, ParsingError> {
    if let JsonValue::Object(obj) = json {
        let game_id = obj["gameId"].as_u64().ok_or(ParsingError::InvalidType("gameId".into()))?;
        let game_mode = str_field(&obj["gameMode"], "gameMode")?;
        // Zero while players are still loading in
        let game_start_time = timestamp_millis(&obj["gameStartTime"], "gameStartTime")?;

        let mut participants = Vec::new();
        for player in obj["participants"].members() {
            // Puuid is omitted for players hidden by streamer mode
            let puuid = player["puuid"].as_str().map(Into::into);
            let riot_id = player["riotId"].as_str().unwrap_or_default().to_string();
            let champ_id = player["championId"]
                .as_i64()
                .ok_or(ParsingError::InvalidType("championId".into()))?;
            let team_id = player["teamId"].as_u16().ok_or(ParsingError::InvalidType("teamId".into()))?;

            participants.push(ActiveGameParticipant {
                puuid,
                riot_id,
                champ_id: champ_id.into(),
                team_id,
            });
        }

        return Ok(ActiveGame {
            game_id,
            game_mode,
            game_start_time,
            participants,
        });
    }

    Err(ParsingError::InvalidType("root".into()))
}
