//! Fixed reference tables shared by validation, derivation and the models.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Feature order the trained models expect. Labels are case and punctuation sensitive.
pub const FEATURE_COLUMNS: [&str; 25] = [
    "Age", "Pos", "G", "MP", "FG", "FGA", "FG%", "3P", "3PA", "3P%", "2P", "2PA", "2P%", "eFG%",
    "FT", "FTA", "FT%", "ORB", "DRB", "TRB", "AST", "STL", "BLK", "TOV", "PF",
];

pub const FEATURE_COUNT: usize = FEATURE_COLUMNS.len();

/// Per-game counting stats a submission must carry, in form order.
pub const COUNTING_STATS: [&str; 14] = [
    "MP", "2P", "2PA", "3P", "3PA", "FT", "FTA", "ORB", "DRB", "AST", "STL", "BLK", "TOV", "PF",
];

pub const AGE_RANGE: (i64, i64) = (18, 40);
pub const GAMES_RANGE: (i64, i64) = (60, 82);
pub const MINUTES_RANGE: (f64, f64) = (10.0, 48.0);
pub const FOULS_RANGE: (f64, f64) = (0.1, 6.0);

pub fn column_index(label: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|c| *c == label)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Decade {
    #[serde(rename = "80s")]
    Eighties,
    #[serde(rename = "90s")]
    Nineties,
    #[serde(rename = "00s")]
    Noughties,
    #[serde(rename = "10s")]
    Tens,
    #[serde(rename = "20s")]
    Twenties,
}

impl Decade {
    /// Chronological order; reports keep it row by row.
    pub const ALL: [Decade; 5] = [
        Decade::Eighties,
        Decade::Nineties,
        Decade::Noughties,
        Decade::Tens,
        Decade::Twenties,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Decade::Eighties => "80s",
            Decade::Nineties => "90s",
            Decade::Noughties => "00s",
            Decade::Tens => "10s",
            Decade::Twenties => "20s",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Decade::ALL.into_iter().find(|d| d.label() == label)
    }
}

impl fmt::Display for Decade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Regression,
    Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Metric {
    Ppg,
    AllStar,
    MvpTop5,
    AllNba,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Ppg, Metric::AllStar, Metric::MvpTop5, Metric::AllNba];

    /// Prefix used in model artifact names.
    pub fn prefix(self) -> &'static str {
        match self {
            Metric::Ppg => "PPG",
            Metric::AllStar => "ASG",
            Metric::MvpTop5 => "MVP5_",
            Metric::AllNba => "ANT",
        }
    }

    /// Key used in the prediction report.
    pub fn report_label(self) -> &'static str {
        match self {
            Metric::Ppg => "PuntosPorPartido",
            Metric::AllStar => "AllStar",
            Metric::MvpTop5 => "MVPTop5",
            Metric::AllNba => "AllNBA",
        }
    }

    pub fn kind(self) -> ModelKind {
        match self {
            Metric::Ppg => ModelKind::Regression,
            Metric::AllStar | Metric::MvpTop5 | Metric::AllNba => ModelKind::Classification,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::PointGuard,
        Position::ShootingGuard,
        Position::SmallForward,
        Position::PowerForward,
        Position::Center,
    ];

    pub fn code(self) -> u8 {
        match self {
            Position::PointGuard => 1,
            Position::ShootingGuard => 2,
            Position::SmallForward => 3,
            Position::PowerForward => 4,
            Position::Center => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Position::ALL.into_iter().find(|p| i64::from(p.code()) == code)
    }

    pub fn abbr(self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }
}

impl TryFrom<u8> for Position {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Position::from_code(i64::from(code)).ok_or_else(|| format!("unknown position code {code}"))
    }
}

impl From<Position> for u8 {
    fn from(pos: Position) -> Self {
        pos.code()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbr())
    }
}
