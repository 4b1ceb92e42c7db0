use json::JsonValue;

use crate::model::league::LeagueEntry;

use super::{str_field, ParsingError};

pub fn parse_league_entries(json: &JsonValue) -> Result<Vec<LeagueEntry>, ParsingError> {
    if let JsonValue::Array(array) = json {
        let mut entries = Vec::new();

        for entry in array {
            if let JsonValue::Object(obj) = entry {
                let queue_type = str_field(&obj["queueType"], "queueType")?;

                // Skip non-SR queues
                if queue_type.contains("TFT") {
                    continue;
                }

                let tier = str_field(&obj["tier"], "tier")?;
                let rank = str_field(&obj["rank"], "rank")?;
                let league_points = obj["leaguePoints"]
                    .as_u32()
                    .ok_or(ParsingError::InvalidType("leaguePoints".into()))?;
                let wins = obj["wins"].as_u32().ok_or(ParsingError::InvalidType("wins".into()))?;
                let losses = obj["losses"].as_u32().ok_or(ParsingError::InvalidType("losses".into()))?;
                let hot_streak = obj["hotStreak"].as_bool().unwrap_or(false);

                entries.push(LeagueEntry {
                    queue_type,
                    tier,
                    rank,
                    league_points,
                    wins,
                    losses,
                    hot_streak,
                });
            } else {
                return Err(ParsingError::InvalidType("league entry".into()));
            }
        }

        return Ok(entries);
    }

    Err(ParsingError::InvalidType("root".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_and_skips_tft() {
        let json = json::parse(
            r#"[
                {"queueType":"RANKED_SOLO_5x5","tier":"GOLD","rank":"II","leaguePoints":57,"wins":30,"losses":10,"hotStreak":true},
                {"queueType":"RANKED_TFT","tier":"IRON","rank":"IV","leaguePoints":0,"wins":1,"losses":9}
            ]"#,
        )
        .unwrap();

        let entries = parse_league_entries(&json).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tier, "GOLD");
        assert!((entries[0].win_rate() - 0.75).abs() < f64::EPSILON);
    }
}
