use feud_board_api::state::ActiveTeam;
use feud_board_api::GameState;
use js_sys::Function;
use serde::{de, Deserialize, Serialize};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};

use crate::dom::{Document, DomError, Element};

/// The class marking the box of the active team.
pub const ACTIVE_CLASS: &str = "active";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("hook threw: {0}")]
    Hook(String),
    #[error("cannot pass snapshot to hook: {0}")]
    Argument(String),
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// A received state payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    raw: Value,
    state: Option<GameState>,
}

impl Snapshot {
    pub fn new(raw: Value, state: Option<GameState>) -> Self {
        Self { raw, state }
    }

    pub fn from_state(state: GameState) -> Self {
        let raw = serde_json::to_value(&state).unwrap_or(Value::Null);

        Self {
            raw,
            state: Some(state),
        }
    }

    /// Decodes the [`GameState`] of a raw payload. `null` carries no state.
    pub fn parse_state(raw: &Value) -> Result<Option<GameState>, serde_json::Error> {
        let kind = match raw {
            Value::Null => return Ok(None),
            Value::Object(_) => return GameState::deserialize(raw).map(Some),
            Value::Array(_) => "an array",
            Value::String(_) => "a string",
            Value::Number(_) => "a number",
            Value::Bool(_) => "a boolean",
        };

        Err(de::Error::custom(format!("expected an object, found {}", kind)))
    }

    /// The payload exactly as received.
    #[inline]
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    #[inline]
    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }
}

/// A single step of the rendering pipeline.
pub trait Renderer {
    /// A name identifying the renderer in diagnostics.
    fn name(&self) -> &str;

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), RenderError>;
}

/// The element ids making up the widgets of one team.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WidgetIds {
    pub name: &'static str,
    pub score: &'static str,
    pub container: &'static str,
}

impl WidgetIds {
    pub const fn of(team: ActiveTeam) -> Self {
        match team {
            ActiveTeam::Team1 => Self {
                name: "team1Name",
                score: "team1Score",
                container: "team1Box",
            },
            ActiveTeam::Team2 => Self {
                name: "team2Name",
                score: "team2Score",
                container: "team2Box",
            },
        }
    }
}

/// The built-in renderer for team names, scores and the active team highlight.
#[derive(Clone, Debug)]
pub struct TeamWidgets<D> {
    document: D,
}

impl<D> TeamWidgets<D>
where
    D: Document,
{
    pub fn new(document: D) -> Self {
        Self { document }
    }

    fn render_team(&self, state: &GameState, team: ActiveTeam) -> Result<(), DomError> {
        let ids = WidgetIds::of(team);

        if let Some(elem) = self.document.element_by_id(ids.name) {
            elem.set_text(&state.team_name(team));
        }

        if let Some(elem) = self.document.element_by_id(ids.score) {
            elem.set_text(&state.team_score(team).to_string());
        }

        match self.document.element_by_id(ids.container) {
            Some(elem) => elem.set_class(ACTIVE_CLASS, state.is_active(team)),
            None => Ok(()),
        }
    }
}

impl<D> Renderer for TeamWidgets<D>
where
    D: Document,
{
    fn name(&self) -> &str {
        "teams"
    }

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), RenderError> {
        let state = match snapshot.state() {
            Some(state) => state,
            None => return Ok(()),
        };

        // Both teams are always rendered, the first failure is returned.
        let mut res = Ok(());
        for team in ActiveTeam::ALL {
            if let Err(err) = self.render_team(state, team) {
                if res.is_ok() {
                    res = Err(err.into());
                }
            }
        }

        res
    }
}

/// A JavaScript function supplied by the host page, called with the raw payload.
#[derive(Clone, Debug)]
pub struct JsHook {
    name: String,
    function: Function,
}

impl JsHook {
    pub fn new<T>(name: T, function: Function) -> Self
    where
        T: Into<String>,
    {
        Self {
            name: name.into(),
            function,
        }
    }
}

impl Renderer for JsHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&mut self, snapshot: &Snapshot) -> Result<(), RenderError> {
        // Hooks expect plain objects, not `Map`s.
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let arg = snapshot
            .raw()
            .serialize(&serializer)
            .map_err(|err| RenderError::Argument(err.to_string()))?;

        match self.function.call1(&JsValue::NULL, &arg) {
            Ok(_) => Ok(()),
            Err(err) => Err(RenderError::Hook(describe(&err))),
        }
    }
}

fn describe(err: &JsValue) -> String {
    if let Some(err) = err.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }

    match err.as_string() {
        Some(msg) => msg,
        None => format!("{:?}", err),
    }
}

#[cfg(test)]
mod tests {
    use feud_board_api::GameState;
    use serde_json::json;

    use super::{Renderer, Snapshot, TeamWidgets, ACTIVE_CLASS};
    use crate::dom::testing::MemoryDocument;

    const ALL: [&str; 6] = [
        "team1Name",
        "team2Name",
        "team1Score",
        "team2Score",
        "team1Box",
        "team2Box",
    ];

    fn snapshot(raw: serde_json::Value) -> Snapshot {
        let state = Snapshot::parse_state(&raw).unwrap();
        Snapshot::new(raw, state)
    }

    #[test]
    fn test_team_widgets_render() {
        let document = MemoryDocument::new(ALL);
        let mut widgets = TeamWidgets::new(document.clone());

        widgets
            .render(&snapshot(json!({
                "team1Name": "Red",
                "team1Score": 3,
                "team2Name": "Blue",
                "team2Score": 5,
                "activeTeam": 2,
            })))
            .unwrap();

        assert_eq!(document.text("team1Name").unwrap(), "Red");
        assert_eq!(document.text("team1Score").unwrap(), "3");
        assert_eq!(document.text("team2Name").unwrap(), "Blue");
        assert_eq!(document.text("team2Score").unwrap(), "5");
        assert!(document.has_class("team2Box", ACTIVE_CLASS));
        assert!(!document.has_class("team1Box", ACTIVE_CLASS));
    }

    #[test]
    fn test_team_widgets_defaults() {
        let document = MemoryDocument::new(ALL);
        let mut widgets = TeamWidgets::new(document.clone());

        widgets
            .render(&snapshot(json!({ "team1Score": null, "team2Score": null })))
            .unwrap();

        assert_eq!(document.text("team1Name").unwrap(), "Team 1");
        assert_eq!(document.text("team2Name").unwrap(), "Team 2");
        assert_eq!(document.text("team1Score").unwrap(), "0");
        assert_eq!(document.text("team2Score").unwrap(), "0");
        assert!(document.has_class("team1Box", ACTIVE_CLASS));
        assert!(!document.has_class("team2Box", ACTIVE_CLASS));
    }

    #[test]
    fn test_team_widgets_active_toggles() {
        let document = MemoryDocument::new(ALL);
        let mut widgets = TeamWidgets::new(document.clone());

        widgets.render(&snapshot(json!({ "activeTeam": 2 }))).unwrap();
        assert!(document.has_class("team2Box", ACTIVE_CLASS));
        assert!(!document.has_class("team1Box", ACTIVE_CLASS));

        for value in [json!(1), json!(7), json!(null), json!("2")] {
            widgets
                .render(&snapshot(json!({ "activeTeam": value })))
                .unwrap();
            assert!(document.has_class("team1Box", ACTIVE_CLASS));
            assert!(!document.has_class("team2Box", ACTIVE_CLASS));
        }
    }

    #[test]
    fn test_team_widgets_missing_elements() {
        let document = MemoryDocument::new(["team2Name", "team1Score", "team2Box"]);
        let mut widgets = TeamWidgets::new(document.clone());

        widgets
            .render(&snapshot(json!({
                "team1Name": "Red",
                "team1Score": 3,
                "team2Name": "Blue",
                "activeTeam": 2,
            })))
            .unwrap();

        assert_eq!(document.text("team1Name"), None);
        assert_eq!(document.text("team2Name").unwrap(), "Blue");
        assert_eq!(document.text("team1Score").unwrap(), "3");
        assert!(document.has_class("team2Box", ACTIVE_CLASS));
    }

    #[test]
    fn test_team_widgets_no_state() {
        let document = MemoryDocument::new(ALL);
        let mut widgets = TeamWidgets::new(document.clone());

        widgets
            .render(&Snapshot::from_state(GameState {
                team1_name: Some(String::from("Red")),
                ..Default::default()
            }))
            .unwrap();

        widgets.render(&snapshot(json!(null))).unwrap();
        assert_eq!(document.text("team1Name").unwrap(), "Red");
        assert_eq!(document.text("team1Score").unwrap(), "0");
    }

    #[test]
    fn test_team_widgets_dom_error() {
        let document = MemoryDocument::new(ALL);
        document.break_element("team1Box");
        let mut widgets = TeamWidgets::new(document.clone());

        let res = widgets.render(&snapshot(json!({ "team2Name": "Blue", "activeTeam": 2 })));
        assert!(res.is_err());

        // The second team still renders.
        assert_eq!(document.text("team2Name").unwrap(), "Blue");
        assert!(document.has_class("team2Box", ACTIVE_CLASS));
    }
}
