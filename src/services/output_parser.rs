//! Parser de la salida del solver
//!
//! El solver imprime su resultado como texto línea a línea:
//!
//! ```text
//! Objective: 100
//! Route for vehicle 0:
//!  0 -> 1 -> 2 -> 0
//! Distance of the route: 50m
//! Maximum of the route distances: 50m
//! ```
//!
//! Un solo recorrido, sensible al orden. Un número mal formado deja su campo en
//! `None` y el resto sigue; las líneas que no se reconocen se ignoran.

use tracing::warn;

use crate::models::RouteResult;

const OBJECTIVE_PREFIX: &str = "Objective:";
const ROUTE_PREFIX: &str = "Route for vehicle";
const DISTANCE_PREFIX: &str = "Distance of the route:";
const MAX_DISTANCE_PREFIX: &str = "Maximum of the route distances:";
const NODE_SEPARATOR: &str = "->";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverReport {
    pub objective: Option<i64>,
    pub routes: Vec<RouteResult>,
    /// Se calcula pero todavía no se guarda en la submission
    pub max_route_distance: Option<i64>,
}

/// Interpretar el stdout completo del solver
pub fn parse_solver_output(stdout: &str) -> SolverReport {
    let mut report = SolverReport::default();
    let mut current: Option<RouteResult> = None;

    for line in stdout.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix(OBJECTIVE_PREFIX) {
            report.objective = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix(ROUTE_PREFIX) {
            if let Some(route) = current.take() {
                report.routes.push(route);
            }
            let vehicle_id = parse_vehicle_id(rest).unwrap_or(report.routes.len() as i64);
            current = Some(RouteResult {
                vehicle_id,
                visited: Vec::new(),
                distance: None,
            });
        } else if let Some(rest) = line.strip_prefix(DISTANCE_PREFIX) {
            if let Some(route) = current.as_mut() {
                route.distance = parse_meters(rest);
            }
        } else if let Some(rest) = line.strip_prefix(MAX_DISTANCE_PREFIX) {
            report.max_route_distance = parse_meters(rest);
        } else if line.contains(NODE_SEPARATOR) {
            // Nodos fuera de un bloque de vehículo no tienen dueño
            if let Some(route) = current.as_mut() {
                route.visited.extend(parse_nodes(line));
            }
        }
    }

    if let Some(route) = current.take() {
        report.routes.push(route);
    }

    report
}

/// `" 3:"` -> `3`; el id va entre "vehicle" y el siguiente ':'
fn parse_vehicle_id(rest: &str) -> Option<i64> {
    let id = match rest.find(':') {
        Some(colon) => &rest[..colon],
        None => rest,
    };
    id.trim().parse().ok()
}

/// `" 50m"` -> `50`
fn parse_meters(rest: &str) -> Option<i64> {
    let value = rest.trim();
    let value = value.strip_suffix('m').unwrap_or(value);
    value.trim().parse().ok()
}

fn parse_nodes(line: &str) -> impl Iterator<Item = u32> + '_ {
    line.split(NODE_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|token| match token.parse::<u32>() {
            Ok(node) => Some(node),
            Err(_) => {
                warn!("⚠️ Nodo fuera de rango en la salida del solver: {}", token);
                None
            }
        })
}
