//! Problem files: one goal per line as `label x y`
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use crate::common::{DtspnError, DtspnResult, Goal, TourRequest};

/// Goals read from a problem file, with their labels
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub labels: Vec<String>,
    pub goals: Vec<Goal>,
}

impl Problem {
    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn to_request(&self, sensing_radius: f64, turning_radius: f64) -> TourRequest {
        TourRequest::new(self.goals.clone(), sensing_radius, turning_radius)
    }
}

pub fn parse_problem(text: &str) -> DtspnResult<Problem> {
    let mut labels = Vec::new();
    let mut goals = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(DtspnError::ParseError(format!(
                "line {}: expected `label x y`, got {} fields",
                idx + 1,
                fields.len()
            )));
        }
        let coord = |s: &str| {
            s.parse::<f64>().map_err(|e| {
                DtspnError::ParseError(format!("line {}: bad coordinate `{}`: {}", idx + 1, s, e))
            })
        };
        let x = coord(fields[1])?;
        let y = coord(fields[2])?;

        labels.push(fields[0].to_string());
        goals.push(Goal::new(x, y));
    }

    Ok(Problem { labels, goals })
}

pub fn load_problem<P: AsRef<Path>>(path: P) -> DtspnResult<Problem> {
    let text = fs::read_to_string(path)?;
    parse_problem(&text)
}
