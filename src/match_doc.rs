use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Synthesized match identifiers are a truncated SHA-256 hex digest.
pub const MATCH_ID_LEN: usize = 20;

/// One cricsheet-style match document: a metadata block, an info block and
/// the ball-by-ball innings tree. Unknown fields are ignored so newer
/// document revisions still load.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchDocument {
    #[serde(default)]
    pub meta: Meta,
    pub info: MatchInfo,
    #[serde(default)]
    pub innings: Vec<InningRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default, deserialize_with = "string_or_number")]
    pub data_version: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub revision: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub balls_per_over: Option<i64>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub event: Option<EventInfo>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub match_type: Option<String>,
    #[serde(default)]
    pub match_type_number: Option<i64>,
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub toss: Option<Toss>,
    #[serde(default)]
    pub venue: Option<String>,
    // Season flips between "2020/21" and a bare year depending on vintage.
    #[serde(default, deserialize_with = "string_or_number")]
    pub season: Option<String>,
    #[serde(default)]
    pub team_type: Option<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub players: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub registry: PlayerRegistry,
    #[serde(default)]
    pub officials: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub player_of_match: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub match_number: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub by: Option<OutcomeBy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutcomeBy {
    #[serde(default)]
    pub wickets: Option<i64>,
    #[serde(default)]
    pub runs: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Toss {
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub winner: Option<String>,
}

/// The document's embedded name-to-identifier roster. Scoped to one
/// document: it is rebuilt per file and never merged across documents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerRegistry {
    #[serde(default)]
    pub people: BTreeMap<String, String>,
}

impl PlayerRegistry {
    /// Identifier for a display name, or `None` when the name is not in
    /// this document's roster. Absence is not an error; callers skip the
    /// reference and log a warning.
    pub fn player_id(&self, name: &str) -> Option<&str> {
        self.people.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.people.iter().map(|(name, id)| (name.as_str(), id.as_str()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InningRecord {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub overs: Vec<OverRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverRecord {
    pub over: i64,
    #[serde(default)]
    pub deliveries: Vec<DeliveryRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryRecord {
    #[serde(default)]
    pub batter: Option<String>,
    #[serde(default)]
    pub bowler: Option<String>,
    #[serde(default)]
    pub non_striker: Option<String>,
    #[serde(default)]
    pub runs: DeliveryRuns,
    #[serde(default)]
    pub extras: DeliveryExtras,
    #[serde(default)]
    pub wicket: Option<WicketEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryRuns {
    #[serde(default)]
    pub batter: i64,
    #[serde(default)]
    pub extras: i64,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryExtras {
    #[serde(default)]
    pub wides: i64,
    #[serde(default)]
    pub noballs: i64,
    #[serde(default)]
    pub byes: i64,
    #[serde(default)]
    pub legbyes: i64,
    #[serde(default)]
    pub penalty: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WicketEvent {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub player_out: Option<String>,
    #[serde(default)]
    pub fielders: Option<Value>,
}

impl WicketEvent {
    /// Fielder lists keep whatever shape the document used; they are
    /// stored as an opaque JSON string and never queried relationally.
    pub fn fielders_json(&self) -> Option<String> {
        self.fielders
            .as_ref()
            .and_then(|v| serde_json::to_string(v).ok())
    }
}

impl MatchInfo {
    pub fn first_date(&self) -> Option<&str> {
        self.dates.first().map(String::as_str)
    }

    pub fn last_date(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }
}

impl MatchDocument {
    pub fn match_id(&self) -> String {
        synthesize_match_id(
            self.info.match_type_number,
            self.info.first_date(),
            self.info.teams.first().map(String::as_str),
            self.info.teams.get(1).map(String::as_str),
        )
    }
}

pub fn parse_match_document(raw: &str) -> Result<MatchDocument> {
    serde_json::from_str(raw.trim()).context("invalid match document json")
}

/// Deterministic identifier for a match that has no natural key in the
/// source data: SHA-256 over the (type sequence number, first date, team
/// pair) tuple, truncated. Absent inputs hash as empty strings, so two
/// documents agree on the id exactly when they agree on the tuple.
pub fn synthesize_match_id(
    match_type_number: Option<i64>,
    first_date: Option<&str>,
    team_a: Option<&str>,
    team_b: Option<&str>,
) -> String {
    let seq = match_type_number.map(|n| n.to_string()).unwrap_or_default();
    let key = format!(
        "{}-{}-{}-{}",
        seq,
        first_date.unwrap_or(""),
        team_a.unwrap_or(""),
        team_b.unwrap_or("")
    );
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(MATCH_ID_LEN);
    hex
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::{MATCH_ID_LEN, parse_match_document, synthesize_match_id};

    #[test]
    fn match_id_is_deterministic() {
        let a = synthesize_match_id(Some(4421), Some("2023-03-17"), Some("Australia"), Some("India"));
        let b = synthesize_match_id(Some(4421), Some("2023-03-17"), Some("Australia"), Some("India"));
        assert_eq!(a, b);
        assert_eq!(a.len(), MATCH_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn match_id_changes_with_any_input() {
        let base = synthesize_match_id(Some(1), Some("2023-03-17"), Some("Australia"), Some("India"));
        assert_ne!(
            base,
            synthesize_match_id(Some(2), Some("2023-03-17"), Some("Australia"), Some("India"))
        );
        assert_ne!(
            base,
            synthesize_match_id(Some(1), Some("2023-03-18"), Some("Australia"), Some("India"))
        );
        assert_ne!(
            base,
            synthesize_match_id(Some(1), Some("2023-03-17"), Some("England"), Some("India"))
        );
        assert_ne!(
            base,
            synthesize_match_id(Some(1), Some("2023-03-17"), Some("Australia"), Some("Pakistan"))
        );
    }

    #[test]
    fn absent_inputs_hash_as_empty() {
        let a = synthesize_match_id(None, None, None, None);
        let b = synthesize_match_id(None, None, None, None);
        assert_eq!(a, b);
        assert_eq!(a.len(), MATCH_ID_LEN);
    }

    #[test]
    fn parses_minimal_document() {
        let raw = r#"{
            "meta": {"data_version": 1.1, "created": "2024-01-02", "revision": 1},
            "info": {
                "dates": ["2024-01-01"],
                "teams": ["A", "B"],
                "season": 2024,
                "registry": {"people": {"P One": "p1"}},
                "players": {"A": ["P One"]}
            },
            "innings": []
        }"#;
        let doc = parse_match_document(raw).expect("document should parse");
        assert_eq!(doc.meta.data_version.as_deref(), Some("1.1"));
        assert_eq!(doc.info.season.as_deref(), Some("2024"));
        assert_eq!(doc.info.registry.player_id("P One"), Some("p1"));
        assert_eq!(doc.info.registry.player_id("Nobody"), None);
        assert_eq!(doc.match_id().len(), MATCH_ID_LEN);
    }

    #[test]
    fn delivery_defaults_are_zero() {
        let raw = r#"{
            "info": {"teams": ["A", "B"], "registry": {"people": {}}},
            "innings": [
                {"team": "A", "overs": [{"over": 0, "deliveries": [{"batter": "X"}]}]}
            ]
        }"#;
        let doc = parse_match_document(raw).expect("document should parse");
        let delivery = &doc.innings[0].overs[0].deliveries[0];
        assert_eq!(delivery.runs.total, 0);
        assert_eq!(delivery.extras.wides, 0);
        assert!(delivery.wicket.is_none());
    }
}
