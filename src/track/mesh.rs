use super::Waypoint;
use nalgebra::Vector2;

/// Identity of one generated mesh. A new id is issued on every rebuild so a
/// renderer can tell when its uploaded copy is out of date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u64);

/// Flat road ribbon: two vertices (left and right edge) per waypoint, closed
/// into a loop with two triangles per gap.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackMesh {
    pub id: MeshId,
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl TrackMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Build the road mesh for a cyclic waypoint list. Fewer than two waypoints
/// yields no mesh.
pub fn build_track_mesh(waypoints: &[Waypoint], id: MeshId) -> Option<TrackMesh> {
    let count = waypoints.len();
    if count < 2 {
        return None;
    }

    let mut vertices = Vec::with_capacity(count * 2);
    let mut indices = Vec::with_capacity(count * 6);
    let mut last_normal = Vector2::new(1.0, 0.0);

    for i in 0..count {
        let prev = waypoints[(i + count - 1) % count].position();
        let current = waypoints[i].position();
        let next = waypoints[(i + 1) % count].position();

        // Central difference, falling back to the forward difference and then
        // to the previous normal when points coincide.
        let mut tangent = next - prev;
        if tangent.norm() <= f32::EPSILON {
            tangent = next - current;
        }
        let normal = if tangent.norm() > f32::EPSILON {
            let t = tangent.normalize();
            Vector2::new(-t.y, t.x)
        } else {
            last_normal
        };
        last_normal = normal;

        let half_width = waypoints[i].width * 0.5;
        let left = current + normal * half_width;
        let right = current - normal * half_width;

        vertices.push([left.x, 0.0, left.y]);
        vertices.push([right.x, 0.0, right.y]);
    }

    for i in 0..count {
        let base = (i * 2) as u32;
        let next_base = ((i + 1) % count * 2) as u32;

        indices.push(base);
        indices.push(next_base);
        indices.push(base + 1);

        indices.push(base + 1);
        indices.push(next_base);
        indices.push(next_base + 1);
    }

    Some(TrackMesh {
        id,
        vertices,
        indices,
    })
}
