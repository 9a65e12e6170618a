//! Force-directed layout for adjacency-list graphs.
//!
//! Small graphs (up to [`CIRCULAR_LAYOUT_MAX_NODES`]) are placed on a circle
//! in closed form. Larger graphs run a bounded Fruchterman-Reingold
//! simulation:
//!
//! - repulsion between every pair: `k² / d`
//! - attraction along every edge: `d² / k`
//! - displacement per iteration capped by a temperature that is multiplied by
//!   the cooldown factor after each iteration
//! - positions clamped to the canvas
//!
//! The initial placement is a golden-angle spiral over node index, so no two
//! nodes (including those of disconnected components) start on the same spot
//! and repeated layouts of the same adjacency are bit-identical.

use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;

use super::{Layout, LayoutEdge, LayoutNode, Position};
use crate::config::VisualizationConfig;
use crate::trace::TraceValue;

/// Graphs with at most this many nodes are laid out on a circle
pub const CIRCULAR_LAYOUT_MAX_NODES: usize = 6;

/// Smallest distance used in force computations
const MIN_DISTANCE: f64 = 0.01;

/// One adjacency entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub to: usize,
    pub weight: Option<f64>,
}

/// Adjacency list of a graph whose nodes are identified by index
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphInput {
    pub adjacency: Vec<Vec<Neighbor>>,
}

impl GraphInput {
    pub fn new(adjacency: Vec<Vec<Neighbor>>) -> Self {
        Self { adjacency }
    }

    /// Unweighted graph from plain index lists
    pub fn from_indices(rows: &[&[usize]]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|&to| Neighbor { to, weight: None }).collect())
                .collect(),
        )
    }

    /// Read an adjacency list from an array of rows. Entries are either a
    /// neighbor index or an `[index, weight]` pair; every index must be a
    /// valid row. Returns `None` for anything else.
    pub fn from_value(value: &TraceValue) -> Option<Self> {
        let rows = value.as_array()?;
        if rows.is_empty() {
            return None;
        }
        let n = rows.len();

        let adjacency = rows
            .iter()
            .map(|row| {
                row.as_array()?
                    .iter()
                    .map(|entry| neighbor_from_value(entry, n))
                    .collect::<Option<Vec<_>>>()
            })
            .collect::<Option<Vec<_>>>()?;

        Some(Self { adjacency })
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// True when `i ∈ adj[j] ⟺ j ∈ adj[i]` for every pair
    pub fn is_undirected(&self) -> bool {
        let pairs: HashSet<(usize, usize)> = self
            .adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().map(move |nb| (i, nb.to)))
            .collect();
        pairs.iter().all(|&(i, j)| pairs.contains(&(j, i)))
    }

    /// Copy of the graph restricted to the first `max_nodes` nodes, dropping
    /// every edge that touches a clipped node
    pub fn truncated(&self, max_nodes: usize) -> Self {
        let n = self.node_count().min(max_nodes);
        Self {
            adjacency: self.adjacency[..n]
                .iter()
                .map(|row| row.iter().copied().filter(|nb| nb.to < n).collect())
                .collect(),
        }
    }
}

fn neighbor_from_value(entry: &TraceValue, n: usize) -> Option<Neighbor> {
    match entry {
        TraceValue::Array(pair) if pair.len() == 2 => {
            let to = pair[0].as_index().filter(|&i| i < n)?;
            let weight = match &pair[1] {
                TraceValue::Number { value, .. } => *value,
                _ => return None,
            };
            Some(Neighbor {
                to,
                weight: Some(weight),
            })
        }
        other => {
            let to = other.as_index().filter(|&i| i < n)?;
            Some(Neighbor { to, weight: None })
        }
    }
}

/// Parameters for [`layout_graph`]
#[derive(Debug, Clone, PartialEq)]
pub struct GraphLayoutParams {
    pub node_size: f64,
    pub width: f64,
    pub height: f64,
    pub iterations: usize,
    pub cooldown_factor: f64,
    pub max_nodes: usize,
}

impl Default for GraphLayoutParams {
    fn default() -> Self {
        Self::from_config(&VisualizationConfig::default())
    }
}

impl GraphLayoutParams {
    pub fn from_config(config: &VisualizationConfig) -> Self {
        Self {
            node_size: config.layout.node_size,
            width: config.layout.canvas_width,
            height: config.layout.canvas_height,
            iterations: config.force_layout_iterations,
            cooldown_factor: config.cooldown_factor,
            max_nodes: config.max_visualization_nodes,
        }
    }
}

/// Lay out an adjacency-list graph. Node ids are the node indices.
pub fn layout_graph(graph: &GraphInput, params: &GraphLayoutParams) -> Layout {
    let overflow = graph.node_count().saturating_sub(params.max_nodes);
    let graph = if overflow > 0 {
        tracing::debug!("Graph layout truncated: {} nodes over the cap", overflow);
        graph.truncated(params.max_nodes)
    } else {
        graph.clone()
    };
    let n = graph.node_count();

    let edges = unique_edges(&graph);
    let positions = if n <= CIRCULAR_LAYOUT_MAX_NODES {
        circular_positions(n, params)
    } else {
        let links: Vec<(usize, usize)> = edges
            .keys()
            .copied()
            .filter(|(a, b)| a != b)
            .collect();
        force_directed_positions(n, &links, params)
    };

    let directed = !graph.is_undirected();
    let ids: Vec<String> = (0..n).map(|i| i.to_string()).collect();

    Layout {
        nodes: positions
            .iter()
            .enumerate()
            .map(|(i, p)| LayoutNode::new(ids[i].clone(), p.x, p.y))
            .collect(),
        edges: edges
            .iter()
            .map(|(&(a, b), &weight)| {
                LayoutEdge::between(&ids[a], &ids[b], directed).with_weight(weight)
            })
            .collect(),
        width: params.width,
        height: params.height,
        overflow,
    }
}

/// Deduplicated edges keyed by endpoints. Undirected graphs key each edge
/// once as `(min, max)`; directed graphs keep one entry per direction. The
/// first weight seen for a key wins.
fn unique_edges(graph: &GraphInput) -> BTreeMap<(usize, usize), Option<f64>> {
    let undirected = graph.is_undirected();
    let mut edges = BTreeMap::new();
    for (from, row) in graph.adjacency.iter().enumerate() {
        for nb in row {
            let key = if undirected {
                (from.min(nb.to), from.max(nb.to))
            } else {
                (from, nb.to)
            };
            edges.entry(key).or_insert(nb.weight);
        }
    }
    edges
}

fn center(params: &GraphLayoutParams) -> Position {
    Position::new(params.width / 2.0, params.height / 2.0)
}

fn placement_radius(params: &GraphLayoutParams) -> f64 {
    (params.width.min(params.height) / 2.0 - params.node_size).max(params.node_size)
}

fn circular_positions(n: usize, params: &GraphLayoutParams) -> Vec<Position> {
    let c = center(params);
    if n == 1 {
        return vec![c];
    }
    let radius = placement_radius(params);
    (0..n)
        .map(|i| {
            let angle = -PI / 2.0 + 2.0 * PI * i as f64 / n as f64;
            Position::new(c.x + radius * angle.cos(), c.y + radius * angle.sin())
        })
        .collect()
}

fn spiral_positions(n: usize, params: &GraphLayoutParams) -> Vec<Position> {
    let c = center(params);
    let radius = placement_radius(params);
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let r = radius * ((i as f64 + 0.5) / n as f64).sqrt();
            let theta = i as f64 * golden_angle;
            Position::new(c.x + r * theta.cos(), c.y + r * theta.sin())
        })
        .collect()
}

fn force_directed_positions(
    n: usize,
    links: &[(usize, usize)],
    params: &GraphLayoutParams,
) -> Vec<Position> {
    let mut pos = spiral_positions(n, params);
    let k = (params.width * params.height / n as f64).sqrt();
    let margin = params.node_size / 2.0;
    let mut temperature = params.width.min(params.height) / 10.0;

    for _ in 0..params.iterations {
        let mut disp = vec![Position::default(); n];

        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy, dist) = separation(&pos, i, j);
                let force = k * k / dist;
                let (fx, fy) = (dx / dist * force, dy / dist * force);
                disp[i].x += fx;
                disp[i].y += fy;
                disp[j].x -= fx;
                disp[j].y -= fy;
            }
        }

        for &(a, b) in links {
            let (dx, dy, dist) = separation(&pos, a, b);
            let force = dist * dist / k;
            let (fx, fy) = (dx / dist * force, dy / dist * force);
            disp[a].x -= fx;
            disp[a].y -= fy;
            disp[b].x += fx;
            disp[b].y += fy;
        }

        for (p, d) in pos.iter_mut().zip(&disp) {
            let len = (d.x * d.x + d.y * d.y).sqrt();
            if len > 0.0 {
                let step = len.min(temperature);
                p.x += d.x / len * step;
                p.y += d.y / len * step;
            }
            p.x = p.x.clamp(margin, params.width - margin);
            p.y = p.y.clamp(margin, params.height - margin);
        }

        temperature *= params.cooldown_factor;
    }

    pos
}

/// Vector from `j` to `i` and its length. Coincident nodes are pushed apart
/// along a direction derived from their indices.
fn separation(pos: &[Position], i: usize, j: usize) -> (f64, f64, f64) {
    let dx = pos[i].x - pos[j].x;
    let dy = pos[i].y - pos[j].y;
    let dist = (dx * dx + dy * dy).sqrt();
    if dist >= MIN_DISTANCE {
        return (dx, dy, dist);
    }
    let angle = (i * 31 + j * 17) as f64;
    (
        angle.cos() * MIN_DISTANCE,
        angle.sin() * MIN_DISTANCE,
        MIN_DISTANCE,
    )
}
