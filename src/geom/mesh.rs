use super::{BBox, Point3, Vec3};

/// Indexed triangle mesh with one RGBA color per vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub indices: Vec<u32>,
    pub colors: Vec<[f64; 4]>,
}

impl GeomMesh {
    /// Create a mesh with every vertex colored opaque white.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        let colors = vec![[1.0, 1.0, 1.0, 1.0]; positions.len()];
        Self {
            positions,
            indices,
            colors,
        }
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if any vertex position contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len() as u32;
        self.indices.len() % 3 == 0 && self.indices.iter().all(|&i| i < n)
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox> {
        let points: Vec<Point3> = self.positions.iter().copied().map(Point3::from).collect();
        BBox::from_points(&points)
    }

    /// Copy of this mesh with every position moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Vec3) -> Self {
        let positions = self
            .positions
            .iter()
            .map(|p| [p[0] + offset.x, p[1] + offset.y, p[2] + offset.z])
            .collect();
        Self {
            positions,
            indices: self.indices.clone(),
            colors: self.colors.clone(),
        }
    }

    /// Flat `xyz` buffer for GPU upload.
    #[must_use]
    pub fn positions_f32(&self) -> Vec<f32> {
        self.positions
            .iter()
            .flat_map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
            .collect()
    }

    /// Flat `rgba` buffer for GPU upload.
    #[must_use]
    pub fn colors_f32(&self) -> Vec<f32> {
        self.colors
            .iter()
            .flat_map(|c| [c[0] as f32, c[1] as f32, c[2] as f32, c[3] as f32])
            .collect()
    }
}
