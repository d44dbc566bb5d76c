//! Discrete TSP solver
//!
//! `LocalSearchSolver` is the default `TspSolver`: multi-start nearest
//! neighbour construction followed by local improvement. 2-opt is applied
//! only to symmetric matrices since segment reversal changes arc costs in the
//! asymmetric case; Or-opt segment relocation keeps arc directions and serves
//! both.
//!
//! With `cluster_size` set, nodes `k·m .. (k+1)·m` form cluster `k` and the
//! improvement phase works on runs of same-cluster nodes instead: a run is
//! rotated to change the node it is entered at, and up to `max_segment_len`
//! consecutive runs are relocated as a unit. Each pass then costs O(B²) in the
//! number of runs B rather than O(n²) in the number of nodes.
//!
//! Non-finite entries are forbidden arcs. They are replaced by a penalty larger
//! than any tour made of finite arcs, so a finished tour that still pays the
//! penalty proves that no feasible tour was found.

use log::debug;
use nalgebra::DMatrix;
use ordered_float::OrderedFloat;

use crate::common::{DtspnError, DtspnResult, TspSolver};

/// Configuration for the local search TSP solver
#[derive(Debug, Clone)]
pub struct LocalSearchConfig {
    /// Number of nearest-neighbour starts, spread evenly over the nodes
    pub restarts: usize,
    /// Maximum improvement passes per start
    pub max_passes: usize,
    /// Longest segment relocated by Or-opt, in nodes or in runs
    pub max_segment_len: usize,
    /// Size of the contiguous node clusters, if the matrix has them
    pub cluster_size: Option<usize>,
}

impl Default for LocalSearchConfig {
    fn default() -> Self {
        Self {
            restarts: 8,
            max_passes: 50,
            max_segment_len: 3,
            cluster_size: None,
        }
    }
}

/// Arc costs with forbidden arcs replaced by the penalty
struct CostTable {
    n: usize,
    costs: Vec<f64>,
    forbidden: Vec<bool>,
    eps: f64,
}

impl CostTable {
    fn new(distances: &DMatrix<f64>) -> Self {
        let n = distances.nrows();
        let finite_max = distances
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, &v| acc.max(v));
        let penalty = finite_max * (n as f64 + 1.0) + 1.0;

        let mut costs = vec![0.0; n * n];
        let mut forbidden = vec![false; n * n];
        for i in 0..n {
            for j in 0..n {
                let v = distances[(i, j)];
                if v.is_finite() {
                    costs[i * n + j] = v;
                } else {
                    costs[i * n + j] = penalty;
                    forbidden[i * n + j] = true;
                }
            }
        }

        CostTable {
            n,
            costs,
            forbidden,
            eps: 1e-9 * (1.0 + finite_max),
        }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.costs[i * self.n + j]
    }

    fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| {
            (i + 1..self.n).all(|j| {
                self.forbidden[i * self.n + j] == self.forbidden[j * self.n + i]
                    && (self.get(i, j) - self.get(j, i)).abs() <= self.eps
            })
        })
    }

    fn tour_cost(&self, tour: &[usize]) -> f64 {
        let n = tour.len();
        (0..n).map(|k| self.get(tour[k], tour[(k + 1) % n])).sum()
    }

    fn uses_forbidden(&self, tour: &[usize]) -> bool {
        let n = tour.len();
        (0..n).any(|k| self.forbidden[tour[k] * self.n + tour[(k + 1) % n]])
    }
}

/// Multi-start nearest neighbour + 2-opt / Or-opt solver
#[derive(Debug, Clone)]
pub struct LocalSearchSolver {
    config: LocalSearchConfig,
}

impl LocalSearchSolver {
    pub fn new(config: LocalSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalSearchConfig {
        &self.config
    }

    fn nearest_neighbor(costs: &CostTable, start: usize) -> Vec<usize> {
        let n = costs.n;
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);

        let mut current = start;
        visited[current] = true;
        order.push(current);

        for _ in 1..n {
            let next = (0..n)
                .filter(|&j| !visited[j])
                .min_by_key(|&j| OrderedFloat(costs.get(current, j)));
            match next {
                Some(j) => {
                    visited[j] = true;
                    order.push(j);
                    current = j;
                }
                None => break,
            }
        }

        order
    }

    fn two_opt(costs: &CostTable, tour: &mut [usize]) -> bool {
        let n = tour.len();
        let mut improved = false;

        for i in 0..n - 1 {
            for j in i + 2..n {
                // reversing everything but one node yields the same cycle
                if i == 0 && j == n - 1 {
                    continue;
                }
                let (a, b) = (tour[i], tour[i + 1]);
                let (c, d) = (tour[j], tour[(j + 1) % n]);
                let delta = costs.get(a, c) + costs.get(b, d) - costs.get(a, b) - costs.get(c, d);
                if delta < -costs.eps {
                    tour[i + 1..=j].reverse();
                    improved = true;
                }
            }
        }

        improved
    }

    fn or_opt(costs: &CostTable, tour: &mut Vec<usize>, max_segment_len: usize) -> bool {
        let n = tour.len();
        let mut improved = false;

        for seg_len in 1..=max_segment_len.min(n.saturating_sub(2)) {
            let mut i = 0;
            while i + seg_len <= n {
                let prev = tour[(i + n - 1) % n];
                let first = tour[i];
                let last = tour[i + seg_len - 1];
                let next = tour[(i + seg_len) % n];
                let removal_gain = costs.get(prev, first) + costs.get(last, next) - costs.get(prev, next);

                // arc j is tour[j] -> tour[j + 1]; skip the arcs touching the segment
                let best = (0..n)
                    .filter(|&j| (j + n + 1 - i) % n > seg_len)
                    .map(|j| {
                        let (a, b) = (tour[j], tour[(j + 1) % n]);
                        let delta = costs.get(a, first) + costs.get(last, b) - costs.get(a, b) - removal_gain;
                        (j, delta)
                    })
                    .min_by_key(|&(_, delta)| OrderedFloat(delta));

                match best {
                    Some((j, delta)) if delta < -costs.eps => {
                        let segment: Vec<usize> = tour.drain(i..i + seg_len).collect();
                        let anchor = if j < i { j } else { j - seg_len };
                        let tail = tour.split_off(anchor + 1);
                        tour.extend(segment);
                        tour.extend(tail);
                        improved = true;
                    }
                    _ => i += 1,
                }
            }
        }

        improved
    }

    /// Rotate each run so it is entered at its cheapest node
    fn rotate_blocks(costs: &CostTable, blocks: &mut [Vec<usize>]) -> bool {
        let b = blocks.len();
        if b < 2 {
            return false;
        }
        let mut improved = false;

        for k in 0..b {
            let len = blocks[k].len();
            if len < 2 {
                continue;
            }
            let prev = last(&blocks[(k + b - 1) % b]);
            let next = blocks[(k + 1) % b][0];
            let run = &blocks[k];

            let cyclic: f64 = (0..len).map(|i| costs.get(run[i], run[(i + 1) % len])).sum();
            let entered_at = |r: usize| {
                let exit = run[(r + len - 1) % len];
                costs.get(prev, run[r]) + cyclic - costs.get(exit, run[r]) + costs.get(exit, next)
            };

            let current = entered_at(0);
            let best = (1..len)
                .map(|r| (r, entered_at(r)))
                .min_by_key(|&(_, cost)| OrderedFloat(cost));
            if let Some((r, cost)) = best {
                if cost < current - costs.eps {
                    blocks[k].rotate_left(r);
                    improved = true;
                }
            }
        }

        improved
    }

    /// Or-opt over runs: relocate up to `max_segment_len` consecutive runs
    fn block_or_opt(costs: &CostTable, blocks: &mut Vec<Vec<usize>>, max_segment_len: usize) -> bool {
        let b = blocks.len();
        let mut improved = false;

        for seg_len in 1..=max_segment_len.min(b.saturating_sub(2)) {
            let mut i = 0;
            while i + seg_len <= b {
                let prev = last(&blocks[(i + b - 1) % b]);
                let first = blocks[i][0];
                let tail = last(&blocks[i + seg_len - 1]);
                let next = blocks[(i + seg_len) % b][0];
                let removal_gain = costs.get(prev, first) + costs.get(tail, next) - costs.get(prev, next);

                let best = (0..b)
                    .filter(|&j| (j + b + 1 - i) % b > seg_len)
                    .map(|j| {
                        let (a, c) = (last(&blocks[j]), blocks[(j + 1) % b][0]);
                        let delta = costs.get(a, first) + costs.get(tail, c) - costs.get(a, c) - removal_gain;
                        (j, delta)
                    })
                    .min_by_key(|&(_, delta)| OrderedFloat(delta));

                match best {
                    Some((j, delta)) if delta < -costs.eps => {
                        let segment: Vec<Vec<usize>> = blocks.drain(i..i + seg_len).collect();
                        let anchor = if j < i { j } else { j - seg_len };
                        let rest = blocks.split_off(anchor + 1);
                        blocks.extend(segment);
                        blocks.extend(rest);
                        improved = true;
                    }
                    _ => i += 1,
                }
            }
        }

        improved
    }
}

fn last(block: &[usize]) -> usize {
    block[block.len() - 1]
}

/// Split a tour into maximal runs of same-cluster nodes; a run that wraps
/// around the end of the tour is kept whole.
fn split_runs(tour: &[usize], cluster_size: usize) -> Vec<Vec<usize>> {
    let n = tour.len();
    let cluster = |k: usize| tour[k % n] / cluster_size;
    let start = (0..n).find(|&k| cluster(k + n - 1) != cluster(k)).unwrap_or(0);

    let mut blocks: Vec<Vec<usize>> = Vec::new();
    for k in start..start + n {
        match blocks.last_mut() {
            Some(block) if block[0] / cluster_size == cluster(k) => block.push(tour[k % n]),
            _ => blocks.push(vec![tour[k % n]]),
        }
    }
    blocks
}

impl Default for LocalSearchSolver {
    fn default() -> Self {
        Self::new(LocalSearchConfig::default())
    }
}

impl TspSolver for LocalSearchSolver {
    fn solve(&self, distances: &DMatrix<f64>) -> DtspnResult<Vec<usize>> {
        let n = distances.nrows();
        if distances.ncols() != n {
            return Err(DtspnError::PlanningError(format!(
                "distance matrix must be square, got {}x{}",
                n,
                distances.ncols()
            )));
        }
        if distances.iter().any(|v| v.is_nan() || *v < 0.0) {
            return Err(DtspnError::PlanningError(
                "distance matrix contains NaN or negative entries".to_string(),
            ));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let costs = CostTable::new(distances);
        let symmetric = costs.is_symmetric();
        let restarts = self.config.restarts.max(1).min(n);
        let clusters = self.config.cluster_size.filter(|&m| m > 1 && n % m == 0);

        let mut best_tour: Vec<usize> = Vec::new();
        let mut best_cost = f64::INFINITY;

        for k in 0..restarts {
            let start = k * n / restarts;
            let mut tour = Self::nearest_neighbor(&costs, start);

            if n > 3 {
                for _ in 0..self.config.max_passes {
                    let mut improved = false;
                    match clusters {
                        Some(m) => {
                            let mut blocks = split_runs(&tour, m);
                            improved |= Self::rotate_blocks(&costs, &mut blocks);
                            improved |= Self::block_or_opt(&costs, &mut blocks, self.config.max_segment_len);
                            tour = blocks.concat();
                        }
                        None => {
                            if symmetric {
                                improved |= Self::two_opt(&costs, &mut tour);
                            }
                            improved |= Self::or_opt(&costs, &mut tour, self.config.max_segment_len);
                        }
                    }
                    if !improved {
                        break;
                    }
                }
            }

            let cost = costs.tour_cost(&tour);
            if cost < best_cost {
                best_cost = cost;
                best_tour = tour;
            }
        }

        if costs.uses_forbidden(&best_tour) {
            return Err(DtspnError::PlanningError(format!(
                "no feasible tour found over {} nodes",
                n
            )));
        }

        // Rotate so node 0 comes first; the cycle is unchanged
        if let Some(pos) = best_tour.iter().position(|&v| v == 0) {
            best_tour.rotate_left(pos);
        }

        debug!(
            "TSP over {} nodes ({}): cost {:.3} after {} starts",
            n,
            if symmetric { "symmetric" } else { "asymmetric" },
            best_cost,
            restarts
        );

        Ok(best_tour)
    }
}

/// Fail with `PlanningError` unless `tour` is a permutation of `0..n`
pub fn validate_permutation(tour: &[usize], n: usize) -> DtspnResult<()> {
    if tour.len() != n {
        return Err(DtspnError::PlanningError(format!(
            "solver returned {} nodes, expected {}",
            tour.len(),
            n
        )));
    }
    let mut seen = vec![false; n];
    for &v in tour {
        if v >= n || seen[v] {
            return Err(DtspnError::PlanningError(format!(
                "solver result is not a permutation: node {} out of range or repeated",
                v
            )));
        }
        seen[v] = true;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn euclidean_matrix(points: &[(f64, f64)]) -> DMatrix<f64> {
        DMatrix::from_fn(points.len(), points.len(), |i, j| {
            let (dx, dy) = (points[i].0 - points[j].0, points[i].1 - points[j].1);
            (dx * dx + dy * dy).sqrt()
        })
    }

    fn cycle_cost(m: &DMatrix<f64>, tour: &[usize]) -> f64 {
        (0..tour.len()).map(|k| m[(tour[k], tour[(k + 1) % tour.len()])]).sum()
    }

    #[test]
    fn test_trivial_sizes() {
        let solver = LocalSearchSolver::default();
        assert!(solver.solve(&DMatrix::zeros(0, 0)).unwrap().is_empty());
        assert_eq!(solver.solve(&DMatrix::zeros(1, 1)).unwrap(), vec![0]);
        assert_eq!(solver.solve(&DMatrix::zeros(2, 2)).unwrap().len(), 2);
    }

    #[test]
    fn test_square_is_uncrossed() {
        // corners listed in crossing order
        let points = [(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)];
        let m = euclidean_matrix(&points);
        let tour = LocalSearchSolver::default().solve(&m).unwrap();
        validate_permutation(&tour, 4).unwrap();
        assert!((cycle_cost(&m, &tour) - 40.0).abs() < 1e-9);
        assert_eq!(tour[0], 0);
    }

    #[test]
    fn test_circle_points_optimal() {
        let n = 12;
        let points: Vec<(f64, f64)> = (0..n)
            .map(|k| {
                // interleave the visiting order to make construction harder
                let idx = (k * 5) % n;
                let a = idx as f64 * std::f64::consts::TAU / n as f64;
                (a.cos() * 10.0, a.sin() * 10.0)
            })
            .collect();
        let m = euclidean_matrix(&points);
        let tour = LocalSearchSolver::default().solve(&m).unwrap();
        let optimal = n as f64 * 2.0 * 10.0 * (std::f64::consts::PI / n as f64).sin();
        assert!((cycle_cost(&m, &tour) - optimal).abs() < 1e-6);
    }

    #[test]
    fn test_asymmetric_follows_cheap_arcs() {
        // cheap ring 0 -> 2 -> 1 -> 3 -> 0, everything else expensive
        let n = 4;
        let mut m = DMatrix::from_element(n, n, 10.0);
        for &(a, b) in &[(0, 2), (2, 1), (1, 3), (3, 0)] {
            m[(a, b)] = 1.0;
        }
        let tour = LocalSearchSolver::default().solve(&m).unwrap();
        assert_eq!(tour, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_forbidden_arcs_are_avoided() {
        let n = 5;
        let mut m = DMatrix::from_element(n, n, f64::INFINITY);
        for k in 0..n {
            m[(k, (k + 3) % n)] = 2.0;
        }
        let tour = LocalSearchSolver::default().solve(&m).unwrap();
        for k in 0..n {
            assert_eq!(tour[(k + 1) % n], (tour[k] + 3) % n);
        }
    }

    #[test]
    fn test_infeasible_matrix() {
        let mut m = DMatrix::from_element(3, 3, f64::INFINITY);
        m[(0, 1)] = 1.0;
        let result = LocalSearchSolver::default().solve(&m);
        assert!(matches!(result, Err(DtspnError::PlanningError(_))));
    }

    #[test]
    fn test_malformed_matrix() {
        let solver = LocalSearchSolver::default();
        assert!(solver.solve(&DMatrix::zeros(2, 3)).is_err());
        let mut m = DMatrix::zeros(3, 3);
        m[(0, 1)] = f64::NAN;
        assert!(solver.solve(&m).is_err());
        m[(0, 1)] = -1.0;
        assert!(solver.solve(&m).is_err());
    }

    /// Noon-Bean style matrix: zero successor arcs inside a cluster, the
    /// rest of the cluster forbidden, penalized arcs between clusters
    fn clustered_matrix(points: &[(f64, f64)], m: usize) -> DMatrix<f64> {
        let base = euclidean_matrix(points);
        DMatrix::from_fn(points.len(), points.len(), |i, j| {
            let next = i - i % m + (i % m + 1) % m;
            if i / m != j / m {
                base[(next, j)] + 1000.0
            } else if j == next {
                0.0
            } else {
                f64::INFINITY
            }
        })
    }

    fn clustered_points(clusters: usize, m: usize) -> Vec<(f64, f64)> {
        let mut points = Vec::with_capacity(clusters * m);
        for c in 0..clusters {
            let a = ((c * 5) % clusters) as f64 * std::f64::consts::TAU / clusters as f64;
            for k in 0..m {
                let b = k as f64 * std::f64::consts::TAU / m as f64;
                points.push((20.0 * a.cos() + b.cos(), 20.0 * a.sin() + b.sin()));
            }
        }
        points
    }

    #[test]
    fn test_split_runs_keeps_wrapped_run() {
        assert_eq!(split_runs(&[1, 2, 3, 0], 2), vec![vec![2, 3], vec![0, 1]]);
        assert_eq!(split_runs(&[0, 1, 2], 3), vec![vec![0, 1, 2]]);
        assert_eq!(split_runs(&[4, 0, 2], 1), vec![vec![4], vec![0], vec![2]]);
    }

    #[test]
    fn test_rotate_blocks_picks_cheaper_entry() {
        let mut m = DMatrix::from_element(4, 4, 10.0);
        for &(a, b) in &[(0, 1), (1, 0), (2, 3), (3, 2)] {
            m[(a, b)] = 0.0;
        }
        for k in 0..4 {
            m[(k, k)] = f64::INFINITY;
        }
        m[(1, 3)] = 1.0;
        m[(2, 0)] = 1.0;
        let costs = CostTable::new(&m);

        let mut blocks = vec![vec![0, 1], vec![2, 3]];
        assert!(LocalSearchSolver::rotate_blocks(&costs, &mut blocks));
        assert_eq!(blocks, vec![vec![0, 1], vec![3, 2]]);
        assert!((costs.tour_cost(&blocks.concat()) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_block_or_opt_uncrosses() {
        let points = [(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)];
        let costs = CostTable::new(&euclidean_matrix(&points));
        let mut blocks = vec![vec![0], vec![1], vec![2], vec![3]];
        assert!(LocalSearchSolver::block_or_opt(&costs, &mut blocks, 1));
        assert!((costs.tour_cost(&blocks.concat()) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_clustered_solve_keeps_clusters_whole() {
        let (clusters, m) = (12, 16);
        let matrix = clustered_matrix(&clustered_points(clusters, m), m);
        let solver = LocalSearchSolver::new(LocalSearchConfig {
            cluster_size: Some(m),
            ..LocalSearchConfig::default()
        });

        let tour = solver.solve(&matrix).unwrap();
        validate_permutation(&tour, clusters * m).unwrap();
        assert_eq!(split_runs(&tour, m).len(), clusters);

        // clusters sit on a circle of radius 20; visiting them around it costs
        // about one circumference plus the penalties
        let cost = cycle_cost(&matrix, &tour);
        assert!(cost.is_finite());
        assert!(cost - 1000.0 * (clusters as f64) < 2.0 * std::f64::consts::TAU * 20.0);
    }

    #[test]
    fn test_validate_permutation() {
        assert!(validate_permutation(&[2, 0, 1], 3).is_ok());
        assert!(validate_permutation(&[0, 0, 1], 3).is_err());
        assert!(validate_permutation(&[0, 1], 3).is_err());
        assert!(validate_permutation(&[0, 1, 3], 3).is_err());
    }
}
