//! Common types used throughout rust_dtspn

use std::f64::consts::TAU;

use nalgebra::{UnitQuaternion, Vector2, Vector3};

use crate::common::error::{DtspnError, DtspnResult};

/// Wrap an angle into [0, 2pi)
pub fn normalize_heading(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid may round a tiny negative input up to exactly 2pi
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Planar oriented configuration (x, y, heading in [0, 2pi))
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Configuration {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl Configuration {
    /// Create a configuration, wrapping the heading into [0, 2pi)
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            heading: normalize_heading(heading),
        }
    }

    pub fn from_position(position: Point2D, heading: f64) -> Self {
        Self::new(position.x, position.y, heading)
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Heading is the yaw of the orientation; z, roll and pitch are dropped.
    pub fn from_pose(pose: &Pose3D) -> Self {
        let (_, _, yaw) = pose.orientation.euler_angles();
        Self::new(pose.position.x, pose.position.y, yaw)
    }

    /// Inverse of `from_pose` with z, roll and pitch zeroed.
    pub fn to_pose(&self) -> Pose3D {
        Pose3D::new(
            Vector3::new(self.x, self.y, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, self.heading),
        )
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.heading)
    }
}

/// Oriented pose in free space: position and unit quaternion orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose3D {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose3D {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self { position, orientation }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }
}

/// Goal region: center point with an implicit circular neighborhood
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Goal {
    pub center: Point2D,
}

impl Goal {
    pub fn new(x: f64, y: f64) -> Self {
        Self { center: Point2D::new(x, y) }
    }

    /// Point on the neighborhood boundary at the given polar angle
    pub fn boundary_point(&self, radius: f64, angle: f64) -> Point2D {
        Point2D::new(
            self.center.x + radius * angle.cos(),
            self.center.y + radius * angle.sin(),
        )
    }

    /// Boundary point closest to `point`; angle 0 when `point` is the center
    pub fn closest_boundary_point(&self, radius: f64, point: &Point2D) -> Point2D {
        if radius <= 0.0 {
            return self.center;
        }
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;
        if dx == 0.0 && dy == 0.0 {
            return self.boundary_point(radius, 0.0);
        }
        self.boundary_point(radius, dy.atan2(dx))
    }
}

impl From<Point2D> for Goal {
    fn from(center: Point2D) -> Self {
        Self { center }
    }
}

/// Immutable input of a single planning call
#[derive(Debug, Clone)]
pub struct TourRequest {
    pub goals: Vec<Goal>,
    pub sensing_radius: f64,
    pub turning_radius: f64,
}

impl TourRequest {
    pub fn new(goals: Vec<Goal>, sensing_radius: f64, turning_radius: f64) -> Self {
        Self {
            goals,
            sensing_radius,
            turning_radius,
        }
    }

    pub fn centers(&self) -> Vec<Point2D> {
        self.goals.iter().map(|g| g.center).collect()
    }

    /// Check goals and sensing radius; the turning radius is checked separately
    /// since the Euclidean planner ignores it.
    pub fn validate(&self) -> DtspnResult<()> {
        if self.goals.is_empty() {
            return Err(DtspnError::ConfigurationError(
                "at least one goal is required".to_string(),
            ));
        }
        if !self.sensing_radius.is_finite() || self.sensing_radius < 0.0 {
            return Err(DtspnError::ConfigurationError(format!(
                "sensing radius must be finite and non-negative, got {}",
                self.sensing_radius
            )));
        }
        if let Some(idx) = self
            .goals
            .iter()
            .position(|g| !g.center.x.is_finite() || !g.center.y.is_finite())
        {
            return Err(DtspnError::ConfigurationError(format!(
                "goal {} has a non-finite center",
                idx
            )));
        }
        Ok(())
    }

    pub fn validate_turning_radius(&self) -> DtspnResult<()> {
        validate_turning_radius(self.turning_radius)
    }
}

pub(crate) fn validate_turning_radius(turning_radius: f64) -> DtspnResult<()> {
    if turning_radius.is_finite() && turning_radius > 0.0 {
        Ok(())
    } else {
        Err(DtspnError::ConfigurationError(format!(
            "turning radius must be positive, got {}",
            turning_radius
        )))
    }
}

/// Closed tour: densely sampled cyclic configurations plus total length
#[derive(Debug, Clone)]
pub struct TourPath {
    /// Dense samples; the last one connects back to the first
    pub configurations: Vec<Configuration>,
    pub length: f64,
    /// One selected configuration per goal, in visiting order
    pub waypoints: Vec<Configuration>,
    /// Goal index visited at each waypoint
    pub goal_order: Vec<usize>,
}

impl TourPath {
    pub fn new() -> Self {
        Self {
            configurations: Vec::new(),
            length: 0.0,
            waypoints: Vec::new(),
            goal_order: Vec::new(),
        }
    }

    pub fn with_goal_order(mut self, goal_order: Vec<usize>) -> Self {
        self.goal_order = goal_order;
        self
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.configurations.iter().map(|c| c.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.configurations.iter().map(|c| c.y).collect()
    }

    /// Dense positions with the first repeated at the end
    pub fn closed_points(&self) -> Vec<Point2D> {
        let mut points: Vec<Point2D> = self.configurations.iter().map(|c| c.position()).collect();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        points
    }
}

impl Default for TourPath {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
        assert!((p1.distance_squared(&p2) - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_heading() {
        assert!((normalize_heading(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_heading(5.0 * PI) - PI).abs() < 1e-12);
        assert_eq!(normalize_heading(TAU), 0.0);
        let tiny = normalize_heading(-1e-18);
        assert!(tiny >= 0.0 && tiny < TAU);
    }

    #[test]
    fn test_pose_conversion_keeps_planar_part() {
        let config = Configuration::new(1.5, -2.0, 1.25 * PI);
        let back = Configuration::from_pose(&config.to_pose());
        assert!((back.x - 1.5).abs() < 1e-12);
        assert!((back.y + 2.0).abs() < 1e-12);
        assert!((back.heading - 1.25 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_pose_conversion_drops_roll_pitch_and_z() {
        let pose = Pose3D::new(
            Vector3::new(2.0, 3.0, 7.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.5),
        );
        let config = Configuration::from_pose(&pose);
        assert!((config.heading - 0.5).abs() < 1e-12);
        assert_eq!(config.to_pose().position.z, 0.0);
    }

    #[test]
    fn test_closest_boundary_point() {
        let goal = Goal::new(1.0, 1.0);
        let p = goal.closest_boundary_point(2.0, &Point2D::new(1.0, 10.0));
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 3.0).abs() < 1e-12);

        // zero radius collapses to the center
        assert_eq!(goal.closest_boundary_point(0.0, &Point2D::new(5.0, 5.0)), goal.center);
        // neuron on the center picks the angle-0 point
        let p = goal.closest_boundary_point(2.0, &goal.center);
        assert!((p.x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_request_validation() {
        let ok = TourRequest::new(vec![Goal::new(0.0, 0.0)], 0.0, 1.0);
        assert!(ok.validate().is_ok());
        assert!(ok.validate_turning_radius().is_ok());

        let empty = TourRequest::new(Vec::new(), 0.0, 1.0);
        assert!(matches!(empty.validate(), Err(DtspnError::ConfigurationError(_))));

        let negative = TourRequest::new(vec![Goal::new(0.0, 0.0)], -1.0, 1.0);
        assert!(negative.validate().is_err());

        let bad_radius = TourRequest::new(vec![Goal::new(0.0, 0.0)], 0.0, 0.0);
        assert!(bad_radius.validate_turning_radius().is_err());
    }

    #[test]
    fn test_closed_points() {
        let mut tour = TourPath::new();
        assert!(tour.closed_points().is_empty());
        tour.configurations = vec![Configuration::new(0.0, 0.0, 0.0), Configuration::new(1.0, 0.0, 0.0)];
        let closed = tour.closed_points();
        assert_eq!(closed.len(), 3);
        assert_eq!(closed[2], Point2D::new(0.0, 0.0));
    }
}
