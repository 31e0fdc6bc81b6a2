use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use clap::Args;
use jiff::{SignedDuration, Timestamp};
use ruta_navigation::{
    metrics::aggregate,
    registry::{RegistryError, SessionRegistry},
    session::{
        DriverId, Guidance, NavigationSignal, PositionFix, SessionId, SessionStatus, TrackerError,
        UpdateOutcome,
    },
};
use ruta_routing::{
    geopoint::GeoPoint,
    gpx::GpxDocument,
    graph::RouteGraph,
    routing::{
        OptimizationMode, OptimizedRoute, OptimizerParams, RoutingError, reroute_from,
        reroute_through,
    },
};
use tracing::{info, warn};

use crate::{optimize::RouteArgs, route_source::import_route};

#[derive(Args)]
pub struct ReplayArgs {
    /// GPX track the route is computed from
    route: PathBuf,

    /// GPX track whose timestamped points are replayed as live positions
    fixes: PathBuf,

    #[arg(long, default_value = "replay")]
    driver: String,

    #[command(flatten)]
    route_args: RouteArgs,
}

fn read_fixes(path: &Path) -> anyhow::Result<Vec<PositionFix>> {
    let bytes = std::fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let document = GpxDocument::parse(&bytes)
        .map_err(|error| anyhow::anyhow!("{}: {error}", error.user_message()))?;

    Ok(document
        .points()
        .filter_map(|point| PositionFix::from_point(&point))
        .collect())
}

fn print_guidance(at: Timestamp, guidance: &Guidance) {
    let eta = guidance
        .estimated_time_remaining
        .map(|eta| format!("{:#}", SignedDuration::from_secs(eta.as_secs())))
        .unwrap_or_else(|| String::from("-"));

    println!(
        "{at} segment {} | next waypoint {} at {:.0}° | remaining {} | eta {eta}{}",
        guidance.segment_index,
        guidance.distance_to_next_waypoint,
        guidance.bearing_to_next_waypoint,
        guidance.distance_remaining,
        if guidance.deviation_flag {
            " | off route"
        } else {
            ""
        },
    );
}

/// New route from `origin` for a traveler on segment `segment_index` of `route`. A tour
/// keeps the stops not reached yet, a shortest path heads for its destination again.
fn recalculate(
    graph: &RouteGraph,
    route: &OptimizedRoute,
    segment_index: usize,
    origin: &GeoPoint,
    params: &OptimizerParams,
) -> Result<OptimizedRoute, RoutingError> {
    match route.mode() {
        OptimizationMode::Tour => {
            let remaining = route
                .waypoints()
                .get(segment_index + 1..)
                .unwrap_or_default();
            reroute_through(graph, origin, remaining, params)
        }
        OptimizationMode::ShortestPath { .. } => {
            let target = route.destination().ok_or(RoutingError::NoWaypoints)?;
            reroute_from(graph, origin, target, params)
        }
    }
}

/// Acts on the signals of one update, as a navigation client would.
fn handle_signals(
    registry: &SessionRegistry,
    id: SessionId,
    outcome: &UpdateOutcome,
    graph: &RouteGraph,
    route: &mut Arc<OptimizedRoute>,
    params: &OptimizerParams,
) -> Result<(), RegistryError> {
    for signal in &outcome.signals {
        match signal {
            NavigationSignal::Recalculate { origin } => {
                let segment_index = outcome
                    .guidance
                    .as_ref()
                    .map_or(0, |guidance| guidance.segment_index);

                match recalculate(graph, route, segment_index, origin, params) {
                    Ok(recalculated) => {
                        *route = Arc::new(recalculated);
                        registry.reroute(id, Arc::clone(route))?;
                    }
                    Err(error) => warn!(%error, "Recalculation failed, keeping the current route"),
                }
            }
            NavigationSignal::Arrived => {
                registry.complete(id, None)?;
            }
            NavigationSignal::SignalLost => {}
        }
    }

    Ok(())
}

pub async fn run(args: ReplayArgs) -> anyhow::Result<()> {
    let config = args.route_args.load_config()?;
    let imported = import_route(
        std::slice::from_ref(&args.route),
        &config.import,
        args.route_args.provider,
        config.osrm_profile,
    )
    .await?;

    if imported.route.destination().is_none() {
        anyhow::bail!("The route has no destination");
    }
    let mut route = Arc::new(imported.route.clone());

    let fixes = read_fixes(&args.fixes)?;
    let Some((origin, rest)) = fixes.split_first() else {
        anyhow::bail!("{} has no timestamped point", args.fixes.display());
    };

    let registry = SessionRegistry::new(config.tracker);
    let (id, guidance) = registry
        .start(DriverId::new(args.driver), Arc::clone(&route), *origin)
        .map_err(|error| anyhow::anyhow!("{}: {error}", error.user_message()))?;
    print_guidance(origin.timestamp, &guidance);

    for fix in rest {
        let outcome = match registry.update(id, *fix) {
            Ok(outcome) => outcome,
            Err(RegistryError::Tracker(
                error @ (TrackerError::OutOfOrderUpdate { .. }
                | TrackerError::InvalidPosition { .. }),
            )) => {
                warn!(%error, "Skipping position");
                continue;
            }
            Err(error) => return Err(error.into()),
        };

        if let Some(guidance) = &outcome.guidance {
            print_guidance(fix.timestamp, guidance);
        }
        for signal in &outcome.signals {
            println!("{} {}", fix.timestamp, signal.user_message());
        }

        if outcome.status.is_terminal() {
            break;
        }

        handle_signals(
            &registry,
            id,
            &outcome,
            &imported.graph,
            &mut route,
            &config.import.optimizer,
        )?;

        if registry
            .status(id)
            .is_some_and(|status| status.is_terminal())
        {
            break;
        }
    }

    if registry.status(id) == Some(SessionStatus::InProgress) {
        info!("Replay ended before arrival");
        registry.cancel(id, Some(String::from("replay ended before arrival")))?;
    }

    let summary = aggregate(&registry.drain_archived());
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
