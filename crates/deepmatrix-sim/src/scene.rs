//! Static lattice layout: token positions per stack/layer and the randomized
//! connection graph, flattened into line-segment vertex and color buffers.
//!
//! Edge targets are sampled with replacement. Duplicate edges are kept.

use deepmatrix_core::config::LatticeConfig;
use deepmatrix_core::constants::MAX_CONNECTIONS;
use deepmatrix_core::types::{ClusterId, ConnectionKind, TokenCoord};
use glam::Vec3;
use rand::Rng;

/// One rendered edge between two token positions.
#[derive(Debug, Clone)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub from: TokenCoord,
    pub to: TokenCoord,
    /// Index of the first endpoint vertex in the shared line buffers.
    pub buffer_index: usize,
    /// Midpoint of the two endpoints (group-local space).
    pub center: Vec3,
    /// Current activation, 0 = rest, 1 = fully lit.
    pub activation: f32,
    /// Setpoint the activation eases toward: 0 or 1.
    pub target: f32,
}

/// Rows and columns of the per-layer token grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    pub fn for_tokens(token_count: u32) -> Self {
        let rows = ((token_count as f64).sqrt().floor() as u32).max(1);
        let cols = token_count.div_ceil(rows).max(1);
        Self { rows, cols }
    }
}

/// Geometry produced once per structural configuration.
pub struct LatticeScene {
    pub grid: GridShape,
    /// `positions[stack][layer][token]`
    pub positions: Vec<Vec<Vec<Vec3>>>,
    pub connections: Vec<Connection>,
    /// Two vertices per connection, in connection order.
    pub line_positions: Vec<[f32; 3]>,
    /// RGBA per line vertex, mutated in place by the activation engine.
    pub line_colors: Vec<[f32; 4]>,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
}

impl LatticeScene {
    /// Lay out tokens and sample the connection graph. Every line vertex starts at `rest`.
    pub fn build<R: Rng + ?Sized>(config: &LatticeConfig, rest: [f32; 4], rng: &mut R) -> Self {
        let grid = GridShape::for_tokens(config.token_count);
        let positions = layout_tokens(config, grid);

        let (bounds_min, bounds_max) = positions
            .iter()
            .flatten()
            .flatten()
            .fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), p| {
                (lo.min(*p), hi.max(*p))
            });
        let (bounds_min, bounds_max) = if bounds_min.x > bounds_max.x {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            (bounds_min, bounds_max)
        };

        let per_token = config.max_connections_per_token as usize;
        let estimate = estimated_connections(config);
        let mut scene = Self {
            grid,
            positions,
            connections: Vec::with_capacity(estimate),
            line_positions: Vec::with_capacity(estimate * 2),
            line_colors: Vec::with_capacity(estimate * 2),
            bounds_min,
            bounds_max,
        };

        for stack in 0..scene.positions.len() {
            let layers = scene.positions[stack].len();
            for layer in 0..layers {
                let tokens = scene.positions[stack][layer].len();

                // Intra-layer: targets drawn from the other tokens of this layer
                if tokens > 1 {
                    for token in 0..tokens {
                        for _ in 0..per_token {
                            let k = rng.random_range(0..tokens - 1);
                            let other = if k >= token { k + 1 } else { k };
                            scene.push_connection(
                                ConnectionKind::IntraLayer,
                                TokenCoord::new(stack as u32, layer as u32, token as u32),
                                TokenCoord::new(stack as u32, layer as u32, other as u32),
                                rest,
                            );
                        }
                    }
                }

                // Inter-layer: targets drawn from the next layer
                if layer + 1 < layers {
                    let next_tokens = scene.positions[stack][layer + 1].len();
                    if next_tokens == 0 {
                        continue;
                    }
                    for token in 0..tokens {
                        for _ in 0..per_token {
                            let other = rng.random_range(0..next_tokens);
                            scene.push_connection(
                                ConnectionKind::InterLayer,
                                TokenCoord::new(stack as u32, layer as u32, token as u32),
                                TokenCoord::new(stack as u32, layer as u32 + 1, other as u32),
                                rest,
                            );
                        }
                    }
                }
            }
        }

        log::debug!(
            "Lattice built: {} tokens in {}x{} grids, {} connections",
            config.total_tokens(),
            grid.rows,
            grid.cols,
            scene.connections.len()
        );
        scene
    }

    fn push_connection(
        &mut self,
        kind: ConnectionKind,
        from: TokenCoord,
        to: TokenCoord,
        rest: [f32; 4],
    ) {
        let start = self.position(from);
        let end = self.position(to);
        let buffer_index = self.line_positions.len();
        self.line_positions.push(start.to_array());
        self.line_positions.push(end.to_array());
        self.line_colors.push(rest);
        self.line_colors.push(rest);
        self.connections.push(Connection {
            kind,
            from,
            to,
            buffer_index,
            center: (start + end) * 0.5,
            activation: 0.0,
            target: 0.0,
        });
    }

    pub fn position(&self, coord: TokenCoord) -> Vec3 {
        self.positions[coord.stack as usize][coord.layer as usize][coord.token as usize]
    }

    /// Radius of the sphere enclosing every token, centered on the bounding box center.
    /// Never zero, so a single-token lattice is still hoverable.
    pub fn bounding_radius(&self) -> f32 {
        ((self.bounds_max - self.bounds_min).length() * 0.5).max(1.0)
    }

    pub fn bounding_center(&self) -> Vec3 {
        (self.bounds_min + self.bounds_max) * 0.5
    }

    /// Number of point clusters (one per stack/layer pair).
    pub fn cluster_count(&self) -> usize {
        self.positions.iter().map(Vec::len).sum()
    }

    /// Every token position tagged with its cluster, in stack-major order.
    pub fn points(&self) -> impl Iterator<Item = (ClusterId, Vec3)> + '_ {
        self.positions
            .iter()
            .flatten()
            .enumerate()
            .flat_map(|(cluster, layer)| {
                layer
                    .iter()
                    .map(move |p| (ClusterId(cluster as u32), *p))
            })
    }

    pub fn count_of(&self, kind: ConnectionKind) -> usize {
        self.connections.iter().filter(|c| c.kind == kind).count()
    }
}

fn estimated_connections(config: &LatticeConfig) -> usize {
    config.max_connections().unwrap_or(0).min(MAX_CONNECTIONS)
}

/// Centered grid per layer; layers step along -Z, stacks along +Y, both centered on the origin.
fn layout_tokens(config: &LatticeConfig, grid: GridShape) -> Vec<Vec<Vec<Vec3>>> {
    let offset_y = (config.stack_count.saturating_sub(1)) as f32 * config.stack_spacing / 2.0;
    let offset_z = (config.layer_count.saturating_sub(1)) as f32 * config.layer_spacing / 2.0;
    let col_center = (grid.cols - 1) as f32 / 2.0;
    let row_center = (grid.rows - 1) as f32 / 2.0;

    (0..config.stack_count)
        .map(|stack| {
            let stack_y = stack as f32 * config.stack_spacing - offset_y;
            (0..config.layer_count)
                .map(|layer| {
                    let layer_z = -(layer as f32) * config.layer_spacing + offset_z;
                    (0..config.token_count)
                        .map(|t| {
                            let row = t / grid.cols;
                            let col = t % grid.cols;
                            let x = (col as f32 - col_center) * config.horizontal_spacing;
                            let y = (row as f32 - row_center) * config.vertical_spacing + stack_y;
                            Vec3::new(x, y, layer_z)
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}
