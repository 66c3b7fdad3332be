use serde::{Deserialize, Serialize};

use crate::columns::{FEATURE_COLUMNS, Position, column_index};

/// One player's per-game line as submitted, after validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawStatInput {
    #[serde(rename = "Age")]
    pub age: u8,
    #[serde(rename = "Pos")]
    pub pos: Position,
    #[serde(rename = "G")]
    pub games: u8,
    #[serde(rename = "MP")]
    pub minutes: f64,
    #[serde(rename = "2P")]
    pub two_made: f64,
    #[serde(rename = "2PA")]
    pub two_attempted: f64,
    #[serde(rename = "3P")]
    pub three_made: f64,
    #[serde(rename = "3PA")]
    pub three_attempted: f64,
    #[serde(rename = "FT")]
    pub ft_made: f64,
    #[serde(rename = "FTA")]
    pub ft_attempted: f64,
    #[serde(rename = "ORB")]
    pub off_rebounds: f64,
    #[serde(rename = "DRB")]
    pub def_rebounds: f64,
    #[serde(rename = "AST")]
    pub assists: f64,
    #[serde(rename = "STL")]
    pub steals: f64,
    #[serde(rename = "BLK")]
    pub blocks: f64,
    #[serde(rename = "TOV")]
    pub turnovers: f64,
    #[serde(rename = "PF")]
    pub fouls: f64,
}

impl RawStatInput {
    /// Raises each attempted count to at least its made count. Idempotent.
    pub fn repair_attempts(&mut self) {
        self.two_attempted = self.two_attempted.max(self.two_made);
        self.three_attempted = self.three_attempted.max(self.three_made);
        self.ft_attempted = self.ft_attempted.max(self.ft_made);
    }

    pub fn with_repaired_attempts(mut self) -> Self {
        self.repair_attempts();
        self
    }

    /// Counting stat by its submission label (`MP`, `2P`, ...).
    pub fn counting_stat(&self, label: &str) -> Option<f64> {
        let value = match label {
            "MP" => self.minutes,
            "2P" => self.two_made,
            "2PA" => self.two_attempted,
            "3P" => self.three_made,
            "3PA" => self.three_attempted,
            "FT" => self.ft_made,
            "FTA" => self.ft_attempted,
            "ORB" => self.off_rebounds,
            "DRB" => self.def_rebounds,
            "AST" => self.assists,
            "STL" => self.steals,
            "BLK" => self.blocks,
            "TOV" => self.turnovers,
            "PF" => self.fouls,
            _ => return None,
        };
        Some(value)
    }
}

/// Raw line plus every field the models need. Built by [`crate::derive::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedStatRecord {
    #[serde(flatten)]
    pub raw: RawStatInput,
    #[serde(rename = "FG")]
    pub fg: f64,
    #[serde(rename = "FGA")]
    pub fga: f64,
    #[serde(rename = "FG%")]
    pub fg_pct: f64,
    #[serde(rename = "2P%")]
    pub two_pct: f64,
    #[serde(rename = "3P%")]
    pub three_pct: f64,
    #[serde(rename = "FT%")]
    pub ft_pct: f64,
    #[serde(rename = "eFG%")]
    pub efg_pct: f64,
    #[serde(rename = "TRB")]
    pub trb: f64,
}

impl DerivedStatRecord {
    pub fn value(&self, column: &str) -> Option<f64> {
        let r = &self.raw;
        let value = match column {
            "Age" => f64::from(r.age),
            "Pos" => f64::from(r.pos.code()),
            "G" => f64::from(r.games),
            "FG" => self.fg,
            "FGA" => self.fga,
            "FG%" => self.fg_pct,
            "2P%" => self.two_pct,
            "3P%" => self.three_pct,
            "FT%" => self.ft_pct,
            "eFG%" => self.efg_pct,
            "TRB" => self.trb,
            other => return r.counting_stat(other),
        };
        Some(value)
    }

    /// Model input in [`FEATURE_COLUMNS`] order.
    pub fn features(&self) -> FeatureVector {
        let r = &self.raw;
        let values = vec![
            f64::from(r.age),
            f64::from(r.pos.code()),
            f64::from(r.games),
            r.minutes,
            self.fg,
            self.fga,
            self.fg_pct,
            r.three_made,
            r.three_attempted,
            self.three_pct,
            r.two_made,
            r.two_attempted,
            self.two_pct,
            self.efg_pct,
            r.ft_made,
            r.ft_attempted,
            self.ft_pct,
            r.off_rebounds,
            r.def_rebounds,
            self.trb,
            r.assists,
            r.steals,
            r.blocks,
            r.turnovers,
            r.fouls,
        ];
        FeatureVector::new(FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(), values)
    }

    pub fn shooting(&self) -> ShootingSummary {
        ShootingSummary {
            fg: self.fg_pct,
            two: self.two_pct,
            three: self.three_pct,
            ft: self.ft_pct,
            efg: self.efg_pct,
        }
    }
}

/// Flattened percentage summary echoed next to the predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShootingSummary {
    #[serde(rename = "FGP")]
    pub fg: f64,
    #[serde(rename = "P2P")]
    pub two: f64,
    #[serde(rename = "P3P")]
    pub three: f64,
    #[serde(rename = "FTP")]
    pub ft: f64,
    #[serde(rename = "eFGP")]
    pub efg: f64,
}

/// Ordered, labelled model input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(columns: Vec<String>, values: Vec<f64>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.values.get(idx).copied()
    }

    /// First position where this vector disagrees with `expected`, if any.
    pub fn mismatch_against(&self, expected: &[String]) -> Option<String> {
        if self.columns.len() != self.values.len() {
            return Some(format!(
                "{} column labels for {} values",
                self.columns.len(),
                self.values.len()
            ));
        }
        if self.len() != expected.len() {
            return Some(format!(
                "expected {} features, got {}",
                expected.len(),
                self.len()
            ));
        }
        self.columns
            .iter()
            .zip(expected)
            .enumerate()
            .find(|(_, (got, want))| got != want)
            .map(|(idx, (got, want))| {
                format!("feature {idx} is {got:?}, model expects {want:?}")
            })
    }

    pub fn matches_model_columns(&self) -> bool {
        self.columns.len() == FEATURE_COLUMNS.len()
            && self
                .columns
                .iter()
                .enumerate()
                .all(|(idx, c)| column_index(c) == Some(idx))
    }
}
