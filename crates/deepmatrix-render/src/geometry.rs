use deepmatrix_sim::LatticeScene;

/// One token point. Instanced over a six-vertex quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    /// Index into the cluster size storage buffer.
    pub cluster: u32,
}

pub fn point_instances(scene: &LatticeScene) -> Vec<PointInstance> {
    scene
        .points()
        .map(|(cluster, p)| PointInstance {
            position: p.to_array(),
            cluster: cluster.0,
        })
        .collect()
}

/// Byte contents for a GPU buffer. Empty slices become a single zeroed word
/// so the buffer is never zero-sized.
pub fn padded_bytes<T: bytemuck::Pod>(items: &[T]) -> Vec<u8> {
    let bytes: &[u8] = bytemuck::cast_slice(items);
    if bytes.is_empty() {
        vec![0u8; wgpu::COPY_BUFFER_ALIGNMENT as usize]
    } else {
        bytes.to_vec()
    }
}
