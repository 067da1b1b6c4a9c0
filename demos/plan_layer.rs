//! Plans one sample layer: perimeters for two islands, then travel moves.
//!
//! Usage:
//! ```text
//! cargo run --example plan_layer
//! RUST_LOG=layerpath=debug cargo run --example plan_layer
//! ```

use layerpath::extrusion::ExtrusionEntity;
use layerpath::geometry::{ExPolygon, Point, Polygon};
use layerpath::math::{unscale, unscale_f};
use layerpath::motion::{MotionPlanner, MotionPlannerConfig};
use layerpath::navmesh::{NavMesh, NavMeshConfig, UNCLASSIFIED};
use layerpath::perimeter::{PerimeterConfig, PerimeterFlows, PerimeterGenerator};
use layerpath::LayerpathError;

fn islands() -> Vec<ExPolygon> {
    let framed = ExPolygon::new(
        Polygon::rectangle_mm(0.0, 0.0, 20.0, 20.0),
        vec![Polygon::rectangle_mm(8.0, 8.0, 12.0, 12.0)],
    );
    let bar = ExPolygon::new(Polygon::rectangle_mm(30.0, -10.0, 36.0, 30.0), Vec::new());
    let tab = ExPolygon::new(Polygon::rectangle_mm(45.0, 0.0, 55.0, 10.0), Vec::new());
    vec![framed, bar, tab]
}

fn main() -> Result<(), LayerpathError> {
    // Default: WARN for everything, INFO for layerpath.
    // Override with RUST_LOG (e.g. RUST_LOG=layerpath=trace).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("layerpath=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let slices = islands();

    // Perimeters
    let config = PerimeterConfig::default().with_perimeters(3).with_layer_id(1);
    config.validate()?;
    let flows = PerimeterFlows::uniform(0.45, 0.2, 0.4)?;
    let output = PerimeterGenerator::new(&slices, &config, &flows).execute()?;
    let loops = output
        .loops
        .flatten()
        .entities
        .iter()
        .filter(|e| matches!(e, ExtrusionEntity::Loop(_)))
        .count();
    println!(
        "perimeters: {loops} loops, {} gap fill paths, {} infill regions",
        output.gap_fill.items_count(),
        output.fill_surfaces.len()
    );

    // Travel between islands
    let mut planner = MotionPlanner::new(slices.clone()).with_config(MotionPlannerConfig::default())?;
    let from = Point::new_scale(2.0, 2.0);
    let to = Point::new_scale(50.0, 5.0);
    let travel = planner.shortest_path(&from, &to);
    println!("travel: {} points, {:.2} mm", travel.points.len(), unscale_f(travel.length()));
    for p in &travel.points {
        println!("  ({:.3}, {:.3})", unscale(p.x), unscale(p.y));
    }

    // Navigation mesh over the framed island, its hole marked expensive
    let mut mesh = NavMesh::new(NavMeshConfig::default());
    mesh.add_polygon(slices[0].contour.clone(), 1, UNCLASSIFIED);
    let mut hole = slices[0].holes[0].clone();
    hole.make_counter_clockwise();
    mesh.add_polygon(hole, 10, UNCLASSIFIED);
    mesh.triangulate()?;
    let nav_from = Point::new_scale(1.0, 10.0);
    let nav_to = Point::new_scale(19.0, 10.0);
    match mesh.path(&nav_from, &nav_to)? {
        Some(path) => println!(
            "navmesh: {} triangles, path of {} points, {:.2} mm",
            mesh.polygons().len(),
            path.points.len(),
            unscale_f(path.length())
        ),
        None => println!("navmesh: no path"),
    }
    Ok(())
}
