//! CPU force simulation for the graph layout
//!
//! Combines many-body repulsion, link springs, weak x/y centering and a collision
//! force. The simulation is advanced a fixed number of steps and then frozen; there
//! is no live physics after the initial layout.

use crate::config::{GraphConfig, Viewport};

/// A node with position and velocity for simulation
#[derive(Debug, Clone)]
pub struct SimNode {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Collision radius (visual radius, padding is added by the force)
    pub radius: f64,
}

impl SimNode {
    /// Place node `index` on a phyllotaxis spiral around `(cx, cy)`
    pub fn seeded(index: usize, cx: f64, cy: f64, radius: f64) -> Self {
        let initial_radius = 10.0;
        let initial_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        let r = initial_radius * (0.5 + index as f64).sqrt();
        let angle = index as f64 * initial_angle;

        Self {
            x: cx + r * angle.cos(),
            y: cy + r * angle.sin(),
            vx: 0.0,
            vy: 0.0,
            radius,
        }
    }
}

/// An edge for simulation (indices into node array)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimEdge {
    pub source: usize,
    pub target: usize,
}

/// Configuration for the force simulation
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Many-body strength (negative = repulsion)
    pub charge: f64,
    /// Link distance (rest length)
    pub link_distance: f64,
    /// Center of the x/y positioning forces
    pub center_x: f64,
    pub center_y: f64,
    /// Strength of the x/y positioning forces
    pub center_strength: f64,
    /// Separation added on top of both radii by the collision force
    pub collision_padding: f64,
    pub collision_strength: f64,
    /// Velocity decay (friction)
    pub velocity_decay: f64,
    /// Current alpha (simulation temperature)
    pub alpha: f64,
    pub alpha_min: f64,
    pub alpha_decay: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            charge: -30.0,
            link_distance: 30.0,
            center_x: 0.0,
            center_y: 0.0,
            center_strength: 0.1,
            collision_padding: 0.0,
            collision_strength: 0.7,
            velocity_decay: 0.4,
            alpha: 1.0,
            alpha_min: 0.001,
            alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
        }
    }
}

impl SimulationConfig {
    /// Simulation settings for the graph view, centered in the viewport
    pub fn for_graph(graph: &GraphConfig, viewport: &Viewport) -> Self {
        Self {
            charge: graph.charge,
            link_distance: graph.link_distance,
            center_x: viewport.width / 2.0,
            center_y: viewport.height / 2.0,
            center_strength: graph.center_strength,
            collision_padding: graph.collision_padding,
            ..Default::default()
        }
    }
}

/// CPU force simulation
pub struct CpuSimulation {
    pub nodes: Vec<SimNode>,
    pub edges: Vec<SimEdge>,
    pub config: SimulationConfig,
    /// Per-edge spring strength, `1 / min(degree(source), degree(target))`
    link_strengths: Vec<f64>,
}

impl CpuSimulation {
    /// Create a simulation for nodes with the given radii
    pub fn new(radii: &[f64], edges: Vec<SimEdge>, config: SimulationConfig) -> Self {
        let nodes: Vec<SimNode> = radii
            .iter()
            .enumerate()
            .map(|(i, &r)| SimNode::seeded(i, config.center_x, config.center_y, r))
            .collect();

        let mut degree = vec![0usize; nodes.len()];
        for edge in &edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }
        let link_strengths = edges
            .iter()
            .map(|e| 1.0 / degree[e.source].min(degree[e.target]).max(1) as f64)
            .collect();

        Self {
            nodes,
            edges,
            config,
            link_strengths,
        }
    }

    /// Run one simulation tick
    pub fn tick(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        self.config.alpha += (0.0 - self.config.alpha) * self.config.alpha_decay;
        let alpha = self.config.alpha;

        self.apply_link_force(alpha);
        self.apply_many_body_force(alpha);
        self.apply_center_force(alpha);
        self.apply_collision_force();

        let keep = 1.0 - self.config.velocity_decay;
        for node in &mut self.nodes {
            node.vx *= keep;
            node.vy *= keep;
            node.x += node.vx;
            node.y += node.vy;
        }
    }

    /// Advance exactly `ticks` steps, regardless of alpha
    pub fn run(&mut self, ticks: usize) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Whether alpha is still above its minimum
    pub fn is_running(&self) -> bool {
        self.config.alpha > self.config.alpha_min
    }

    /// Final positions, in node order
    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.nodes.iter().map(|n| (n.x, n.y)).collect()
    }

    /// Apply repulsion between all node pairs
    fn apply_many_body_force(&mut self, alpha: f64) {
        let n = self.nodes.len();

        for i in 0..n {
            for j in (i + 1)..n {
                let (dx, dy) = separation(&self.nodes[i], &self.nodes[j], i, j);
                let dist_sq = (dx * dx + dy * dy).max(1.0);

                // Inverse-square falloff; negative charge pushes the pair apart
                let w = self.config.charge * alpha / dist_sq;

                self.nodes[i].vx += dx * w;
                self.nodes[i].vy += dy * w;
                self.nodes[j].vx -= dx * w;
                self.nodes[j].vy -= dy * w;
            }
        }
    }

    /// Apply spring force between connected nodes
    fn apply_link_force(&mut self, alpha: f64) {
        for (edge, strength) in self.edges.iter().zip(&self.link_strengths) {
            let (s, t) = (edge.source, edge.target);
            if s == t {
                continue;
            }

            let dx = self.nodes[t].x + self.nodes[t].vx - self.nodes[s].x - self.nodes[s].vx;
            let dy = self.nodes[t].y + self.nodes[t].vy - self.nodes[s].y - self.nodes[s].vy;
            let dist = (dx * dx + dy * dy).sqrt().max(1e-6);

            // Hooke's law toward the rest length, split evenly between both ends
            let k = (dist - self.config.link_distance) / dist * alpha * strength;
            let (fx, fy) = (dx * k * 0.5, dy * k * 0.5);

            self.nodes[t].vx -= fx;
            self.nodes[t].vy -= fy;
            self.nodes[s].vx += fx;
            self.nodes[s].vy += fy;
        }
    }

    /// Pull every node weakly toward the center on both axes
    fn apply_center_force(&mut self, alpha: f64) {
        let (cx, cy) = (self.config.center_x, self.config.center_y);
        let k = self.config.center_strength * alpha;
        for node in &mut self.nodes {
            node.vx += (cx - node.x) * k;
            node.vy += (cy - node.y) * k;
        }
    }

    /// Keep node centers at least `r_i + r_j + padding` apart
    fn apply_collision_force(&mut self) {
        let n = self.nodes.len();
        let padding = self.config.collision_padding;
        let strength = self.config.collision_strength;

        for i in 0..n {
            for j in (i + 1)..n {
                let min_dist = self.nodes[i].radius + self.nodes[j].radius + padding;
                let ax = self.nodes[i].x + self.nodes[i].vx;
                let ay = self.nodes[i].y + self.nodes[i].vy;
                let bx = self.nodes[j].x + self.nodes[j].vx;
                let by = self.nodes[j].y + self.nodes[j].vy;
                let (mut dx, mut dy) = (bx - ax, by - ay);
                if dx == 0.0 && dy == 0.0 {
                    (dx, dy) = jiggle(i, j);
                }
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= min_dist {
                    continue;
                }

                let push = (min_dist - dist) / dist * strength * 0.5;
                self.nodes[i].vx -= dx * push;
                self.nodes[i].vy -= dy * push;
                self.nodes[j].vx += dx * push;
                self.nodes[j].vy += dy * push;
            }
        }
    }
}

/// Vector from node `i` to node `j`, nudged apart when they coincide
fn separation(a: &SimNode, b: &SimNode, i: usize, j: usize) -> (f64, f64) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    if dx == 0.0 && dy == 0.0 {
        jiggle(i, j)
    } else {
        (dx, dy)
    }
}

/// Deterministic tiny offset for coincident nodes
fn jiggle(i: usize, j: usize) -> (f64, f64) {
    let angle = ((i * 31 + j * 17) % 360) as f64 * std::f64::consts::PI / 180.0;
    (angle.cos() * 1e-3, angle.sin() * 1e-3)
}
