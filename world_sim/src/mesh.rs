/*!
Static mesh collision data and merging into a single kernel triangle mesh.

A mesh asset carries one collision body made of any number of triangle sub-meshes, each
with its own vertex buffer and either 16- or 32-bit indices. Loading merges them into
one buffer in kernel space:

- vertices go through the caller-to-kernel axis mapping
- indices are offset by the vertex count of the preceding sub-meshes
- winding is reversed, since the axis swap flips handedness
*/

use shared::{CallerVec3, KernelVec3, to_kernel_coordinates};

/// Triangle index buffer, either width.
#[derive(Clone, Debug, PartialEq)]
pub enum TriangleIndices {
    Small(Vec<[u16; 3]>),
    Large(Vec<[u32; 3]>),
}

impl TriangleIndices {
    pub fn len(&self) -> usize {
        match self {
            TriangleIndices::Small(t) => t.len(),
            TriangleIndices::Large(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn widened(&self) -> Box<dyn Iterator<Item = [u32; 3]> + '_> {
        match self {
            TriangleIndices::Small(t) => Box::new(t.iter().map(|t| t.map(u32::from))),
            TriangleIndices::Large(t) => Box::new(t.iter().copied()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CollisionTriMesh {
    pub vertices: Vec<CallerVec3>,
    pub indices: TriangleIndices,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionBody {
    pub tri_meshes: Vec<CollisionTriMesh>,
}

/// A content mesh as handed to the loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaticMeshAsset {
    pub name: String,
    /// The asset is still being built by the content pipeline.
    pub is_compiling: bool,
    pub has_render_data: bool,
    pub collision: Option<CollisionBody>,
}

impl StaticMeshAsset {
    /// Collision data if the asset is ready to load.
    pub fn ready_collision(&self) -> Option<&CollisionBody> {
        if self.is_compiling || !self.has_render_data {
            return None;
        }
        self.collision.as_ref().filter(|c| !c.tri_meshes.is_empty())
    }
}

/// Merged kernel-space triangle soup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedTriMesh {
    pub vertices: Vec<KernelVec3>,
    pub triangles: Vec<[u32; 3]>,
}

/// Merge every sub-mesh of `body`.
///
/// Returns `None` when there is nothing to merge, when an index points outside its
/// sub-mesh, or when the merged vertex count overflows 32-bit indices.
pub fn merge_collision_meshes(body: &CollisionBody) -> Option<MergedTriMesh> {
    let mut merged = MergedTriMesh::default();

    for (i, sub) in body.tri_meshes.iter().enumerate() {
        let base = u32::try_from(merged.vertices.len()).ok()?;
        let count = u32::try_from(sub.vertices.len()).ok()?;
        base.checked_add(count)?;

        for [a, b, c] in sub.indices.widened() {
            if a >= count || b >= count || c >= count {
                log::warn!("collision sub-mesh {i}: triangle ({a}, {b}, {c}) out of range for {count} vertices");
                return None;
            }
            merged.triangles.push([base + c, base + b, base + a]);
        }
        merged
            .vertices
            .extend(sub.vertices.iter().map(|v| to_kernel_coordinates(*v)));
    }

    if merged.triangles.is_empty() {
        return None;
    }
    Some(merged)
}
