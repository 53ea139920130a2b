use crate::error::LoadError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Field weights: field_name -> weight
pub type FieldWeights = HashMap<String, f32>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    /// Run English stemming on every token at build and query time.
    pub stemming: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Entries read from JSON override the default table one field at a time.
    #[serde(deserialize_with = "merge_onto_default_weights")]
    pub weights: FieldWeights,
    /// Weight for fields missing from `weights`.
    pub default_weight: f32,
    /// Lower bound on idf so terms present in every document still count.
    pub idf_floor: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let weights = [
            ("code", 3.0),
            ("title", 3.0),
            ("name", 3.0),
            ("subject", 2.0),
            ("number", 2.0),
            ("instructor", 1.5),
            ("email", 1.5),
            ("description", 1.0),
            ("department", 1.0),
            ("location", 1.0),
            ("keywords", 0.5),
        ]
        .into_iter()
        .map(|(f, w)| (f.to_string(), w))
        .collect();
        Self { weights, default_weight: 1.0, idf_floor: 0.05 }
    }
}

fn merge_onto_default_weights<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldWeights, D::Error> {
    let overrides = FieldWeights::deserialize(deserializer)?;
    let mut weights = ScoringConfig::default().weights;
    weights.extend(overrides);
    Ok(weights)
}

impl ScoringConfig {
    pub fn weight(&self, field: &str) -> f32 {
        self.weights.get(field).copied().unwrap_or(self.default_weight)
    }

    pub fn with_weight(mut self, field: &str, weight: f32) -> Self {
        self.weights.insert(field.to_string(), weight);
        self
    }

    pub fn with_idf_floor(mut self, idf_floor: f32) -> Self {
        self.idf_floor = idf_floor;
        self
    }
}

impl EngineConfig {
    /// Load overrides from a JSON file. Keys the file omits keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&text).map_err(|source| LoadError::Parse { path: path.to_path_buf(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_outweighs_description() {
        let cfg = ScoringConfig::default();
        assert!(cfg.weight("title") > cfg.weight("description"));
        assert!(cfg.weight("name") > cfg.weight("department"));
        assert_eq!(cfg.weight("unheard_of"), cfg.default_weight);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"scoring": {"idf_floor": 0.5}}"#).unwrap();
        assert_eq!(cfg.scoring.idf_floor, 0.5);
        assert_eq!(cfg.scoring.weight("title"), 3.0);
        assert!(!cfg.stemming);
    }

    #[test]
    fn weight_overrides_merge_onto_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"scoring": {"weights": {"title": 5.0, "room": 0.25}}}"#).unwrap();
        assert_eq!(cfg.scoring.weight("title"), 5.0);
        assert_eq!(cfg.scoring.weight("room"), 0.25);
        assert_eq!(cfg.scoring.weight("name"), 3.0);
        assert_eq!(cfg.scoring.weight("subject"), 2.0);
        assert_eq!(cfg.scoring.weight("keywords"), 0.5);
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(EngineConfig::from_file(&path), Err(LoadError::Parse { .. })));

        std::fs::write(&path, r#"{"stemming": true}"#).unwrap();
        assert!(EngineConfig::from_file(&path).unwrap().stemming);
    }
}
