//! Visualization utilities for rust_dtspn
//!
//! Collects goal neighborhoods, tours and SOM rings as series and renders
//! them with gnuplot on a single set of axes.

use std::io;

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};
use itertools::{Itertools, MinMaxResult};

use crate::common::{DtspnError, DtspnResult, Goal, Point2D, TourPath};

/// Color palette for consistent styling
pub mod colors {
    pub const BLACK: &str = "#000000";
    pub const RED: &str = "#FF0000";
    pub const GREEN: &str = "#00FF00";
    pub const BLUE: &str = "#0000FF";
    pub const ORANGE: &str = "#FFA500";
    pub const GRAY: &str = "#808080";

    pub const GOAL: &str = RED;
    pub const NEIGHBORHOOD: &str = ORANGE;
    pub const TOUR: &str = BLUE;
    pub const WAYPOINT: &str = GREEN;
    pub const RING: &str = BLACK;
}

const CIRCLE_SEGMENTS: usize = 64;

/// Style for path rendering
#[derive(Debug, Clone)]
pub struct PathStyle {
    pub color: String,
    pub line_width: f64,
    pub caption: String,
}

impl PathStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            line_width: 2.0,
            caption: caption.to_string(),
        }
    }

    pub fn with_line_width(mut self, width: f64) -> Self {
        self.line_width = width;
        self
    }
}

impl Default for PathStyle {
    fn default() -> Self {
        Self::new(colors::TOUR, "Tour")
    }
}

/// Style for point rendering
#[derive(Debug, Clone)]
pub struct PointStyle {
    pub color: String,
    pub size: f64,
    pub symbol: char,
    pub caption: String,
}

impl PointStyle {
    pub fn new(color: &str, caption: &str) -> Self {
        Self {
            color: color.to_string(),
            size: 1.0,
            symbol: 'O',
            caption: caption.to_string(),
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_symbol(mut self, symbol: char) -> Self {
        self.symbol = symbol;
        self
    }
}

#[derive(Debug, Clone)]
enum Series {
    Lines { x: Vec<f64>, y: Vec<f64>, style: PathStyle },
    Points { x: Vec<f64>, y: Vec<f64>, style: PointStyle },
}

impl Series {
    fn coords(&self) -> (&[f64], &[f64]) {
        match self {
            Series::Lines { x, y, .. } | Series::Points { x, y, .. } => (x.as_slice(), y.as_slice()),
        }
    }
}

/// Polyline approximating a circle, closed back to its first point
pub fn circle_points(center: &Point2D, radius: f64, segments: usize) -> (Vec<f64>, Vec<f64>) {
    let segments = segments.max(3);
    (0..=segments)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * k as f64 / segments as f64;
            (center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .unzip()
}

fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}

/// Main visualizer struct
pub struct Visualizer {
    title: String,
    x_label: String,
    y_label: String,
    aspect_ratio: Option<f64>,
    series: Vec<Series>,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            x_label: "X [m]".to_string(),
            y_label: "Y [m]".to_string(),
            aspect_ratio: Some(1.0),
            series: Vec::new(),
        }
    }

    pub fn set_title(&mut self, title: &str) -> &mut Self {
        self.title = title.to_string();
        self
    }

    /// Set aspect ratio (None for auto)
    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) -> &mut Self {
        self.aspect_ratio = ratio;
        self
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Plot a path from x,y vectors
    pub fn plot_path_xy(&mut self, x: &[f64], y: &[f64], style: &PathStyle) -> &mut Self {
        self.series.push(Series::Lines {
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        self
    }

    pub fn plot_points(&mut self, points: &[Point2D], style: &PointStyle) -> &mut Self {
        self.series.push(Series::Points {
            x: points.iter().map(|p| p.x).collect(),
            y: points.iter().map(|p| p.y).collect(),
            style: style.clone(),
        });
        self
    }

    /// Goal centers with their sensing neighborhoods
    pub fn plot_goals(&mut self, goals: &[Goal], sensing_radius: f64) -> &mut Self {
        if sensing_radius > 0.0 {
            for (i, goal) in goals.iter().enumerate() {
                let (x, y) = circle_points(&goal.center, sensing_radius, CIRCLE_SEGMENTS);
                // caption once, otherwise the key repeats per goal
                let caption = if i == 0 { "Neighborhood" } else { "" };
                self.plot_path_xy(
                    &x,
                    &y,
                    &PathStyle::new(colors::NEIGHBORHOOD, caption).with_line_width(1.0),
                );
            }
        }
        let centers: Vec<Point2D> = goals.iter().map(|g| g.center).collect();
        self.plot_points(&centers, &PointStyle::new(colors::GOAL, "Goals").with_size(1.5))
    }

    /// Closed dense tour plus its selected waypoints
    pub fn plot_tour(&mut self, tour: &TourPath, style: &PathStyle) -> &mut Self {
        let points = tour.closed_points();
        let x: Vec<f64> = points.iter().map(|p| p.x).collect();
        let y: Vec<f64> = points.iter().map(|p| p.y).collect();
        self.plot_path_xy(&x, &y, style);

        let waypoints: Vec<Point2D> = tour.waypoints.iter().map(|c| c.position()).collect();
        self.plot_points(
            &waypoints,
            &PointStyle::new(colors::WAYPOINT, "Waypoints").with_symbol('x'),
        )
    }

    /// Closed neuron ring
    pub fn plot_ring(&mut self, ring: &[Point2D]) -> &mut Self {
        let mut x: Vec<f64> = ring.iter().map(|p| p.x).collect();
        let mut y: Vec<f64> = ring.iter().map(|p| p.y).collect();
        if let (Some(&x0), Some(&y0)) = (x.first(), y.first()) {
            x.push(x0);
            y.push(y0);
        }
        self.plot_path_xy(&x, &y, &PathStyle::new(colors::RING, "Ring").with_line_width(1.0));
        self.plot_points(ring, &PointStyle::new(colors::RING, "").with_symbol('x').with_size(0.7))
    }

    /// Bounding box of everything plotted so far
    pub fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let xs = span(self.series.iter().flat_map(|s| s.coords().0.iter().copied()))?;
        let ys = span(self.series.iter().flat_map(|s| s.coords().1.iter().copied()))?;
        Some((xs, ys))
    }

    pub fn show(&self) -> DtspnResult<()> {
        let mut figure = self.render();
        figure.show().map_err(plot_error).map(|_| ())
    }

    pub fn save_png(&self, path: &str, width: u32, height: u32) -> DtspnResult<()> {
        let mut figure = self.render();
        figure.save_to_png(path, width, height).map_err(plot_error)
    }

    pub fn save_svg(&self, path: &str, width: u32, height: u32) -> DtspnResult<()> {
        let mut figure = self.render();
        figure.save_to_svg(path, width, height).map_err(plot_error)
    }

    fn render(&self) -> Figure {
        let mut figure = Figure::new();
        let axes = figure.axes2d();

        for series in &self.series {
            match series {
                Series::Lines { x, y, style } => {
                    axes.lines(
                        x,
                        y,
                        &[
                            Caption(&style.caption),
                            Color(&style.color),
                            LineWidth(style.line_width),
                        ],
                    );
                }
                Series::Points { x, y, style } => {
                    axes.points(
                        x,
                        y,
                        &[
                            Caption(&style.caption),
                            Color(&style.color),
                            PointSymbol(style.symbol),
                            PointSize(style.size),
                        ],
                    );
                }
            }
        }

        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label(&self.x_label, &[]);
        axes.set_y_label(&self.y_label, &[]);
        if let Some(((x_min, x_max), (y_min, y_max))) = self.bounds() {
            let margin = 0.05 * (x_max - x_min).max(y_max - y_min).max(1.0);
            axes.set_x_range(AutoOption::Fix(x_min - margin), AutoOption::Fix(x_max + margin));
            axes.set_y_range(AutoOption::Fix(y_min - margin), AutoOption::Fix(y_max + margin));
        }
        if let Some(ratio) = self.aspect_ratio {
            axes.set_aspect_ratio(AutoOption::Fix(ratio));
        }
        figure
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

fn plot_error<E: ToString>(e: E) -> DtspnError {
    DtspnError::IoError(io::Error::new(io::ErrorKind::Other, e.to_string()))
}
