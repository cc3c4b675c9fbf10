use std::fmt::{self, Display, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::http::Request;
use crate::{Client, Error, Result};

/// A single snapshot of the scoreboard as broadcast by the server.
///
/// Every field is optional on the wire. Values of an unexpected type fall back to the default
/// of the field rather than rejecting the whole snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(rename = "team1Name", default, deserialize_with = "lenient::name")]
    pub team1_name: Option<String>,
    #[serde(rename = "team2Name", default, deserialize_with = "lenient::name")]
    pub team2_name: Option<String>,
    #[serde(rename = "team1Score", default, deserialize_with = "lenient::or_default")]
    pub team1_score: Option<Score>,
    #[serde(rename = "team2Score", default, deserialize_with = "lenient::or_default")]
    pub team2_score: Option<Score>,
    #[serde(rename = "activeTeam", default)]
    pub active_team: ActiveTeam,

    #[serde(default, deserialize_with = "lenient::or_default")]
    pub question: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub answers: Vec<Answer>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub last_selected: Option<Answer>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub strikes: u8,
    #[serde(rename = "roundScore", default, deserialize_with = "lenient::or_default")]
    pub round_score: Option<Score>,
}

impl GameState {
    /// Returns the display name of the given team.
    pub fn team_name(&self, team: ActiveTeam) -> String {
        let name = match team {
            ActiveTeam::Team1 => &self.team1_name,
            ActiveTeam::Team2 => &self.team2_name,
        };

        match name {
            Some(name) => name.clone(),
            None => team.default_name().to_owned(),
        }
    }

    /// Returns the score of the given team. A missing score is `0`.
    pub fn team_score(&self, team: ActiveTeam) -> Score {
        let score = match team {
            ActiveTeam::Team1 => &self.team1_score,
            ActiveTeam::Team2 => &self.team2_score,
        };

        score.clone().unwrap_or_default()
    }

    /// Returns `true` if the given team is the active team.
    #[inline]
    pub fn is_active(&self, team: ActiveTeam) -> bool {
        self.active_team == team
    }
}

/// The team currently holding the turn.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum ActiveTeam {
    #[default]
    Team1,
    Team2,
}

impl ActiveTeam {
    pub const ALL: [Self; 2] = [Self::Team1, Self::Team2];

    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Team1 => 1,
            Self::Team2 => 2,
        }
    }

    /// Only `2` selects the second team. Everything else selects the first.
    pub fn from_value(value: &Value) -> Self {
        match value.as_f64() {
            Some(n) if n == 2.0 => Self::Team2,
            _ => Self::Team1,
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            Self::Team1 => "Team 1",
            Self::Team2 => "Team 2",
        }
    }
}

impl From<ActiveTeam> for u8 {
    #[inline]
    fn from(team: ActiveTeam) -> Self {
        team.to_u8()
    }
}

impl<'de> Deserialize<'de> for ActiveTeam {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// A numeric score.
///
/// Integral values are displayed without a fractional part.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(Number);

impl Score {
    pub fn new<T>(value: T) -> Self
    where
        T: Into<Number>,
    {
        Self(value.into())
    }
}

impl Default for Score {
    #[inline]
    fn default() -> Self {
        Self(Number::from(0))
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_f64() {
            if let Some(n) = self.0.as_f64() {
                // Below 2^53 every integral f64 is exact.
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    return write!(f, "{}", n as i64);
                }
            }
        }

        Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub points: u64,
    #[serde(default)]
    pub revealed: bool,
}

/// Response of [`StateClient::select`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SelectResponse {
    pub ok: bool,
    pub selected: Answer,
    /// Only reported by servers that keep a round score.
    #[serde(rename = "roundScore", default)]
    pub round_score: Option<Score>,
}

/// Response of [`StateClient::set_active`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ActiveResponse {
    pub ok: bool,
    pub active: ActiveTeam,
}

/// Response of [`StateClient::strike`] and [`StateClient::clear_strikes`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StrikesResponse {
    pub ok: bool,
    pub strikes: u8,
}

/// Response of [`StateClient::set_score`].
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ScoreResponse {
    pub ok: bool,
    #[serde(rename = "team1Score", default)]
    pub team1_score: Score,
    #[serde(rename = "team2Score", default)]
    pub team2_score: Score,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Body of a rejected request.
#[derive(Clone, Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct SelectRequest {
    id: u64,
}

#[derive(Serialize)]
struct ActiveRequest {
    team: ActiveTeam,
}

#[derive(Serialize)]
struct SetScoreRequest {
    team: ActiveTeam,
    score: i64,
}

#[derive(Copy, Clone, Debug)]
pub struct StateClient<'a> {
    client: &'a Client,
}

impl<'a> StateClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Fetches the current state as raw json.
    pub async fn get_raw(&self) -> Result<Value> {
        let req = self.client.request().uri("/api/state").get().json().build();
        self.send(req).await
    }

    /// Fetches the current state.
    pub async fn get(&self) -> Result<GameState> {
        let value = self.get_raw().await?;
        Ok(GameState::deserialize(value)?)
    }

    /// Reveals the answer with the given `id`.
    pub async fn select(&self, id: u64) -> Result<SelectResponse> {
        let req = self.post("/api/select").body(&SelectRequest { id })?.build();
        self.send(req).await
    }

    /// Hides all answers again.
    pub async fn reset(&self) -> Result<OkResponse> {
        let req = self.post("/api/reset").build();
        self.send(req).await
    }

    pub async fn set_active(&self, team: ActiveTeam) -> Result<ActiveResponse> {
        let req = self.post("/api/active").body(&ActiveRequest { team })?.build();
        self.send(req).await
    }

    /// Adds a strike. The server stops counting at 3.
    pub async fn strike(&self) -> Result<StrikesResponse> {
        let req = self.post("/api/strike").build();
        self.send(req).await
    }

    pub async fn clear_strikes(&self) -> Result<StrikesResponse> {
        let req = self.post("/api/clear_strikes").build();
        self.send(req).await
    }

    pub async fn set_score(&self, team: ActiveTeam, score: i64) -> Result<ScoreResponse> {
        let req = self
            .post("/api/set_score")
            .body(&SetScoreRequest { team, score })?
            .build();
        self.send(req).await
    }

    fn post(&self, uri: &str) -> crate::http::RequestBuilder {
        self.client.request().uri(uri).post().json()
    }

    async fn send<T>(&self, req: Request) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = self.client.send(req).await?;
        if resp.is_success() {
            return resp.json().await;
        }

        let status = resp.status();
        match resp.json::<ErrorResponse>().await {
            Ok(body) => Err(Error::Rejected {
                status,
                message: body.error,
            }),
            Err(_) => Err(Error::Status(status)),
        }
    }
}

mod lenient {
    use super::*;

    /// Accepts any value, using the default of `T` when it does not fit.
    pub fn or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(T::deserialize(value).unwrap_or_default())
    }

    /// Empty strings and zero count as missing. Other numbers and `true` use their json text.
    pub fn name<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => Some(Score(n).to_string()),
            Value::Bool(true) => Some(String::from("true")),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use super::{
        ActiveResponse, ActiveTeam, GameState, Score, ScoreResponse, SelectResponse,
        StrikesResponse,
    };
    use crate::{Client, Error};

    fn decode(value: serde_json::Value) -> GameState {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_game_state_defaults() {
        let state = decode(json!({}));

        assert_eq!(state.team_name(ActiveTeam::Team1), "Team 1");
        assert_eq!(state.team_name(ActiveTeam::Team2), "Team 2");
        assert_eq!(state.team_score(ActiveTeam::Team1).to_string(), "0");
        assert_eq!(state.team_score(ActiveTeam::Team2).to_string(), "0");
        assert_eq!(state.active_team, ActiveTeam::Team1);
    }

    #[test]
    fn test_game_state_null_fields() {
        let state = decode(json!({
            "team1Name": null,
            "team2Name": "",
            "team1Score": null,
            "team2Score": null,
            "activeTeam": null,
        }));

        assert_eq!(state.team_name(ActiveTeam::Team1), "Team 1");
        assert_eq!(state.team_name(ActiveTeam::Team2), "Team 2");
        assert_eq!(state.team_score(ActiveTeam::Team1).to_string(), "0");
        assert_eq!(state.team_score(ActiveTeam::Team2).to_string(), "0");
        assert!(state.is_active(ActiveTeam::Team1));
    }

    #[test]
    fn test_game_state_full() {
        let state = decode(json!({
            "team1Name": "Red",
            "team1Score": 3,
            "team2Name": "Blue",
            "team2Score": 5,
            "activeTeam": 2,
        }));

        assert_eq!(state.team_name(ActiveTeam::Team1), "Red");
        assert_eq!(state.team_name(ActiveTeam::Team2), "Blue");
        assert_eq!(state.team_score(ActiveTeam::Team1).to_string(), "3");
        assert_eq!(state.team_score(ActiveTeam::Team2).to_string(), "5");
        assert!(state.is_active(ActiveTeam::Team2));
        assert!(!state.is_active(ActiveTeam::Team1));
    }

    #[test]
    fn test_active_team_unrecognized() {
        for value in [json!(1), json!(0), json!(3), json!("2"), json!(true), json!([2])] {
            let state = decode(json!({ "activeTeam": value.clone() }));
            assert_eq!(state.active_team, ActiveTeam::Team1, "{:?}", value);
        }

        let state = decode(json!({ "activeTeam": 2.0 }));
        assert_eq!(state.active_team, ActiveTeam::Team2);
    }

    #[test]
    fn test_game_state_wrong_types() {
        let state = decode(json!({
            "team1Name": 7,
            "team1Score": "lots",
            "answers": "none",
            "strikes": -1,
        }));

        assert_eq!(state.team_name(ActiveTeam::Team1), "7");
        assert_eq!(state.team_score(ActiveTeam::Team1).to_string(), "0");
        assert!(state.answers.is_empty());
        assert_eq!(state.strikes, 0);
    }

    #[test]
    fn test_game_state_falsy_names() {
        let state = decode(json!({ "team1Name": 0, "team2Name": false }));
        assert_eq!(state.team_name(ActiveTeam::Team1), "Team 1");
        assert_eq!(state.team_name(ActiveTeam::Team2), "Team 2");

        let state = decode(json!({ "team1Name": 0.0, "team2Name": true }));
        assert_eq!(state.team_name(ActiveTeam::Team1), "Team 1");
        assert_eq!(state.team_name(ActiveTeam::Team2), "true");
    }

    #[test]
    fn test_game_state_server_snapshot() {
        let state = decode(json!({
            "question": "Name something you take on vacation",
            "answers": [
                {"id": 1, "text": "Toothbrush", "points": 30, "revealed": true},
                {"id": 2, "text": "Sunscreen", "points": 25, "revealed": false},
            ],
            "last_selected": {"id": 1, "text": "Toothbrush", "points": 30, "revealed": true},
            "strikes": 2,
            "roundScore": 30,
            "team1Name": "Team 1",
            "team2Name": "Team 2",
            "team1Score": 0,
            "team2Score": 0,
            "activeTeam": 1,
        }));

        assert_eq!(
            state.question.as_deref(),
            Some("Name something you take on vacation")
        );
        assert_eq!(state.answers.len(), 2);
        assert!(state.answers[0].revealed);
        assert_eq!(state.last_selected.map(|a| a.id), Some(1));
        assert_eq!(state.strikes, 2);
        assert_eq!(state.round_score, Some(Score::new(30)));
    }

    #[test]
    fn test_score_display() {
        assert_eq!(Score::default().to_string(), "0");
        assert_eq!(Score::new(-4).to_string(), "-4");

        let score: Score = serde_json::from_str("3.0").unwrap();
        assert_eq!(score.to_string(), "3");

        let score: Score = serde_json::from_str("3.5").unwrap();
        assert_eq!(score.to_string(), "3.5");
    }

    #[test]
    fn test_judge_responses() {
        let resp: SelectResponse = serde_json::from_value(json!({
            "ok": true,
            "selected": {"id": 2, "text": "Sunscreen", "points": 25, "revealed": true},
            "roundScore": 55,
        }))
        .unwrap();
        assert_eq!(resp.selected.points, 25);
        assert_eq!(resp.round_score, Some(Score::new(55)));

        let resp: SelectResponse = serde_json::from_value(json!({
            "ok": true,
            "selected": {"id": 2, "text": "Sunscreen", "points": 25, "revealed": true},
        }))
        .unwrap();
        assert_eq!(resp.round_score, None);

        let resp: ActiveResponse =
            serde_json::from_value(json!({ "ok": true, "active": 2 })).unwrap();
        assert_eq!(resp.active, ActiveTeam::Team2);

        let resp: StrikesResponse =
            serde_json::from_value(json!({ "ok": true, "strikes": 3 })).unwrap();
        assert_eq!(resp.strikes, 3);

        let resp: ScoreResponse = serde_json::from_value(json!({
            "ok": true,
            "team1Score": 120,
            "team2Score": 0,
        }))
        .unwrap();
        assert_eq!(resp.team1_score.to_string(), "120");
        assert_eq!(resp.team2_score, Score::default());
    }

    #[test]
    fn test_active_team_request() {
        assert_eq!(
            serde_json::to_value(super::ActiveRequest {
                team: ActiveTeam::Team2
            })
            .unwrap(),
            json!({ "team": 2 })
        );
        assert_eq!(
            serde_json::to_value(super::SetScoreRequest {
                team: ActiveTeam::Team1,
                score: -5,
            })
            .unwrap(),
            json!({ "team": 1, "score": -5 })
        );
    }

    #[test]
    fn test_state_client_unsupported_target() {
        let client = Client::new("http://localhost:8000");
        let state = client.state();

        assert!(matches!(block_on(state.get()), Err(Error::Unsupported)));
        assert!(matches!(block_on(state.select(1)), Err(Error::Unsupported)));
        assert!(matches!(block_on(state.reset()), Err(Error::Unsupported)));
        assert!(matches!(
            block_on(state.set_active(ActiveTeam::Team2)),
            Err(Error::Unsupported)
        ));
        assert!(matches!(block_on(state.strike()), Err(Error::Unsupported)));
        assert!(matches!(
            block_on(state.clear_strikes()),
            Err(Error::Unsupported)
        ));
        assert!(matches!(
            block_on(state.set_score(ActiveTeam::Team1, 10)),
            Err(Error::Unsupported)
        ));
    }
}
