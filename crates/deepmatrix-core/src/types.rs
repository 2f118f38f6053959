/// Identifies one token in the lattice by its stack, layer and index within the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TokenCoord {
    pub stack: u32,
    pub layer: u32,
    pub token: u32,
}

impl TokenCoord {
    pub fn new(stack: u32, layer: u32, token: u32) -> Self {
        Self {
            stack,
            layer,
            token,
        }
    }
}

/// Which part of the graph an edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Both endpoints in the same layer.
    IntraLayer,
    /// Source in layer L, target in layer L + 1 of the same stack.
    InterLayer,
}

/// Index of a point cluster (one per stack/layer pair), in stack-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClusterId(pub u32);
