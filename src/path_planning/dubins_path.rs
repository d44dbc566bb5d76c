//! Dubins path planner
//!
//! Shortest forward-only path between two oriented configurations for a
//! vehicle with a minimum turning radius. The path is one of six words made
//! of circular arcs (L, R) and a straight segment (S).
//!
//! Reference: Shkel, A. M., & Lumelsky, V. (2001).
//! "Classification of the Dubins set"

use std::f64::consts::TAU;

use ordered_float::OrderedFloat;

use crate::common::{normalize_heading, validate_turning_radius, Configuration, DtspnError, DtspnResult};

const COINCIDENT_EPS: f64 = 1e-12;

fn mod2pi(x: f64) -> f64 {
    normalize_heading(x)
}

/// Motion primitive of a Dubins segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Left,
    Straight,
    Right,
}

/// The six candidate Dubins words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DubinsWord {
    LSL,
    LSR,
    RSL,
    RSR,
    RLR,
    LRL,
}

impl DubinsWord {
    pub const ALL: [DubinsWord; 6] = [
        DubinsWord::LSL,
        DubinsWord::LSR,
        DubinsWord::RSL,
        DubinsWord::RSR,
        DubinsWord::RLR,
        DubinsWord::LRL,
    ];

    pub fn segments(&self) -> [SegmentType; 3] {
        use SegmentType::*;
        match self {
            DubinsWord::LSL => [Left, Straight, Left],
            DubinsWord::LSR => [Left, Straight, Right],
            DubinsWord::RSL => [Right, Straight, Left],
            DubinsWord::RSR => [Right, Straight, Right],
            DubinsWord::RLR => [Right, Left, Right],
            DubinsWord::LRL => [Left, Right, Left],
        }
    }

    /// Normalized segment lengths for this word, if it is feasible
    fn solve(&self, alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
        match self {
            DubinsWord::LSL => left_straight_left(alpha, beta, d),
            DubinsWord::LSR => left_straight_right(alpha, beta, d),
            DubinsWord::RSL => right_straight_left(alpha, beta, d),
            DubinsWord::RSR => right_straight_right(alpha, beta, d),
            DubinsWord::RLR => right_left_right(alpha, beta, d),
            DubinsWord::LRL => left_right_left(alpha, beta, d),
        }
    }
}

fn left_straight_left(alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
    let (sa, sb, ca, cb) = (alpha.sin(), beta.sin(), alpha.cos(), beta.cos());
    let p_sq = 2.0 + d * d - 2.0 * (alpha - beta).cos() + 2.0 * d * (sa - sb);
    if p_sq < 0.0 {
        return None;
    }
    let tmp = (cb - ca).atan2(d + sa - sb);
    Some([mod2pi(tmp - alpha), p_sq.sqrt(), mod2pi(beta - tmp)])
}

fn right_straight_right(alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
    let (sa, sb, ca, cb) = (alpha.sin(), beta.sin(), alpha.cos(), beta.cos());
    let p_sq = 2.0 + d * d - 2.0 * (alpha - beta).cos() + 2.0 * d * (sb - sa);
    if p_sq < 0.0 {
        return None;
    }
    let tmp = (ca - cb).atan2(d - sa + sb);
    Some([mod2pi(alpha - tmp), p_sq.sqrt(), mod2pi(tmp - beta)])
}

fn left_straight_right(alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
    let (sa, sb, ca, cb) = (alpha.sin(), beta.sin(), alpha.cos(), beta.cos());
    let p_sq = -2.0 + d * d + 2.0 * (alpha - beta).cos() + 2.0 * d * (sa + sb);
    if p_sq < 0.0 {
        return None;
    }
    let p = p_sq.sqrt();
    let tmp = (-ca - cb).atan2(d + sa + sb) - (-2.0_f64).atan2(p);
    Some([mod2pi(tmp - alpha), p, mod2pi(tmp - beta)])
}

fn right_straight_left(alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
    let (sa, sb, ca, cb) = (alpha.sin(), beta.sin(), alpha.cos(), beta.cos());
    let p_sq = -2.0 + d * d + 2.0 * (alpha - beta).cos() - 2.0 * d * (sa + sb);
    if p_sq < 0.0 {
        return None;
    }
    let p = p_sq.sqrt();
    let tmp = (ca + cb).atan2(d - sa - sb) - (2.0_f64).atan2(p);
    Some([mod2pi(alpha - tmp), p, mod2pi(beta - tmp)])
}

fn right_left_right(alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
    let (sa, sb, ca, cb) = (alpha.sin(), beta.sin(), alpha.cos(), beta.cos());
    let tmp = (6.0 - d * d + 2.0 * (alpha - beta).cos() + 2.0 * d * (sa - sb)) / 8.0;
    if tmp.abs() > 1.0 {
        return None;
    }
    let phi = (ca - cb).atan2(d - sa + sb);
    let p = mod2pi(TAU - tmp.acos());
    let t = mod2pi(alpha - phi + mod2pi(p / 2.0));
    Some([t, p, mod2pi(alpha - beta - t + p)])
}

fn left_right_left(alpha: f64, beta: f64, d: f64) -> Option<[f64; 3]> {
    let (sa, sb, ca, cb) = (alpha.sin(), beta.sin(), alpha.cos(), beta.cos());
    let tmp = (6.0 - d * d + 2.0 * (alpha - beta).cos() + 2.0 * d * (sb - sa)) / 8.0;
    if tmp.abs() > 1.0 {
        return None;
    }
    let phi = (ca - cb).atan2(d + sa - sb);
    let p = mod2pi(TAU - tmp.acos());
    let t = mod2pi(-alpha - phi + p / 2.0);
    Some([t, p, mod2pi(beta - alpha - t + p)])
}

/// Advance `origin` along one segment by the normalized length `param`
fn interpolate(origin: &Configuration, segment: SegmentType, param: f64, turning_radius: f64) -> Configuration {
    let r = turning_radius;
    let th = origin.heading;
    match segment {
        SegmentType::Straight => Configuration::new(
            origin.x + r * param * th.cos(),
            origin.y + r * param * th.sin(),
            th,
        ),
        SegmentType::Left => Configuration::new(
            origin.x + r * ((th + param).sin() - th.sin()),
            origin.y + r * (th.cos() - (th + param).cos()),
            th + param,
        ),
        SegmentType::Right => Configuration::new(
            origin.x + r * (th.sin() - (th - param).sin()),
            origin.y + r * ((th - param).cos() - th.cos()),
            th - param,
        ),
    }
}

fn is_coincident(a: &Configuration, b: &Configuration) -> bool {
    let dh = normalize_heading(a.heading - b.heading);
    a.position().distance(&b.position()) < COINCIDENT_EPS
        && (dh < COINCIDENT_EPS || TAU - dh < COINCIDENT_EPS)
}

/// Minimal-length Dubins path between two configurations
#[derive(Debug, Clone)]
pub struct DubinsPath {
    start: Configuration,
    turning_radius: f64,
    word: DubinsWord,
    /// Segment lengths normalized by the turning radius
    params: [f64; 3],
}

impl DubinsPath {
    /// Shortest of the six Dubins words from `start` to `end`
    pub fn shortest(start: Configuration, end: Configuration, turning_radius: f64) -> DtspnResult<Self> {
        validate_turning_radius(turning_radius)?;

        if is_coincident(&start, &end) {
            return Ok(DubinsPath {
                start,
                turning_radius,
                word: DubinsWord::LSL,
                params: [0.0; 3],
            });
        }

        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let d = (dx * dx + dy * dy).sqrt() / turning_radius;
        let theta = mod2pi(dy.atan2(dx));
        let alpha = mod2pi(start.heading - theta);
        let beta = mod2pi(end.heading - theta);

        let (word, params) = DubinsWord::ALL
            .iter()
            .filter_map(|word| word.solve(alpha, beta, d).map(|params| (*word, params)))
            .min_by_key(|(_, params)| OrderedFloat(params.iter().sum::<f64>()))
            .ok_or_else(|| {
                DtspnError::PlanningError(format!(
                    "no Dubins word connects {:?} and {:?}",
                    start, end
                ))
            })?;

        Ok(DubinsPath {
            start,
            turning_radius,
            word,
            params,
        })
    }

    /// Total path length in world units
    pub fn length(&self) -> f64 {
        self.params.iter().sum::<f64>() * self.turning_radius
    }

    pub fn word(&self) -> DubinsWord {
        self.word
    }

    pub fn turning_radius(&self) -> f64 {
        self.turning_radius
    }

    /// Segment lengths in world units
    pub fn segment_lengths(&self) -> [f64; 3] {
        let r = self.turning_radius;
        [self.params[0] * r, self.params[1] * r, self.params[2] * r]
    }

    pub fn start(&self) -> Configuration {
        self.start
    }

    pub fn end(&self) -> Configuration {
        self.configuration_at(self.length())
    }

    /// Configuration at arc-length `s`, clamped to [0, length]
    pub fn configuration_at(&self, s: f64) -> Configuration {
        let mut remaining = s.max(0.0).min(self.length()) / self.turning_radius;
        let mut origin = self.start;

        for (segment, &param) in self.word.segments().iter().zip(self.params.iter()) {
            if remaining <= param {
                return interpolate(&origin, *segment, remaining, self.turning_radius);
            }
            origin = interpolate(&origin, *segment, param, self.turning_radius);
            remaining -= param;
        }
        origin
    }

    /// Configurations at arc-lengths 0, step, 2*step, ... strictly below the
    /// length. A zero-length path yields its start once.
    pub fn sample(&self, step: f64) -> DtspnResult<Vec<Configuration>> {
        if !(step > 0.0) || !step.is_finite() {
            return Err(DtspnError::ConfigurationError(format!(
                "sampling step must be positive, got {}",
                step
            )));
        }
        let count = ((self.length() / step).ceil() as usize).max(1);
        Ok((0..count)
            .map(|k| self.configuration_at(k as f64 * step))
            .collect())
    }
}
