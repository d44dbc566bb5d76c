// DTSPN scenario runner
//
// usage: dtspn <problem> <decoupled|noon-bean|som> [sensing_radius] [turning_radius] [--plot file.png]
//
// Set RUST_LOG=debug for per-epoch and solver statistics.

use std::env;
use std::process;

use log::{error, info};

use rust_dtspn::common::{DtspnError, DtspnResult, Point2D, TourPath, TourPlanner};
use rust_dtspn::tour_planning::{DecoupledConfig, DecoupledPlanner, NoonBeanConfig, NoonBeanPlanner, SomPlanner};
use rust_dtspn::utils::{load_problem, PathStyle, Visualizer};

const DEFAULT_SENSING_RADIUS: f64 = 0.5;
const DEFAULT_TURNING_RADIUS: f64 = 0.5;

struct Args {
    problem: String,
    planner: String,
    sensing_radius: f64,
    turning_radius: f64,
    plot: Option<String>,
}

fn usage() -> String {
    "usage: dtspn <problem> <decoupled|noon-bean|som> [sensing_radius] [turning_radius] [--plot file.png]"
        .to_string()
}

fn parse_args(raw: &[String]) -> DtspnResult<Args> {
    let mut positional = Vec::new();
    let mut plot = None;

    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        if arg == "--plot" {
            let file = iter
                .next()
                .ok_or_else(|| DtspnError::ConfigurationError("--plot needs a file name".to_string()))?;
            plot = Some(file.clone());
        } else {
            positional.push(arg.as_str());
        }
    }

    if positional.len() < 2 || positional.len() > 4 {
        return Err(DtspnError::ConfigurationError(usage()));
    }
    let radius = |idx: usize, default: f64| -> DtspnResult<f64> {
        match positional.get(idx) {
            Some(s) => s
                .parse()
                .map_err(|_| DtspnError::ConfigurationError(format!("not a number: {}", s))),
            None => Ok(default),
        }
    };

    Ok(Args {
        problem: positional[0].to_string(),
        planner: positional[1].to_string(),
        sensing_radius: radius(2, DEFAULT_SENSING_RADIUS)?,
        turning_radius: radius(3, DEFAULT_TURNING_RADIUS)?,
        plot,
    })
}

fn run(args: &Args) -> DtspnResult<()> {
    let problem = load_problem(&args.problem)?;
    let request = problem.to_request(args.sensing_radius, args.turning_radius);
    info!(
        "{}: {} goals, sensing radius {}, turning radius {}",
        args.problem,
        problem.len(),
        args.sensing_radius,
        args.turning_radius
    );

    let mut ring: Option<Vec<Point2D>> = None;
    let tour: TourPath = match args.planner.as_str() {
        "decoupled" => DecoupledPlanner::new(DecoupledConfig::default()).plan(&request)?,
        "noon-bean" => NoonBeanPlanner::new(NoonBeanConfig::default()).plan(&request)?,
        "som" => {
            let outcome = SomPlanner::default().solve(&request)?;
            ring = Some(outcome.neurons.iter().map(|n| Point2D::from(n.position)).collect());
            outcome.tour
        }
        other => {
            return Err(DtspnError::ConfigurationError(format!(
                "unknown planner `{}`\n{}",
                other,
                usage()
            )))
        }
    };

    let labels: Vec<&str> = tour
        .goal_order
        .iter()
        .map(|&g| problem.labels[g].as_str())
        .collect();
    println!("planner: {}", args.planner);
    println!("order:   {}", labels.join(" "));
    println!("length:  {:.4}", tour.length);

    if let Some(file) = &args.plot {
        let mut vis = Visualizer::new();
        vis.set_title(&format!("{} ({}), length {:.2}", args.problem, args.planner, tour.length));
        vis.plot_goals(&request.goals, args.sensing_radius);
        if let Some(ring) = &ring {
            vis.plot_ring(ring);
        }
        vis.plot_tour(&tour, &PathStyle::default());
        vis.save_png(file, 800, 800)?;
        info!("plot saved to {}", file);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let result = parse_args(&raw).and_then(|args| run(&args));
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("{}", e);
        process::exit(1);
    }
}
