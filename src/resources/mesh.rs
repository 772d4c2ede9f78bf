use std::collections::HashMap;

use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::{data_structures::model, raycast::Aabb};

/**
 * Geometry that is generated instead of loaded doesn't come with tangents and bitangents so
 * they have to be calculated for normal maps to work correctly.
 */
pub fn compute_tangents(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    let mut triangles_included = vec![0; vertices.len()];

    // Calculate tangents and bitangets. We're going to
    // use the triangles, so we need to loop through the
    // indices in chunks of 3
    for c in indices.chunks_exact(3) {
        let (Some(v0), Some(v1), Some(v2)) = (
            vertices.get(c[0] as usize).copied(),
            vertices.get(c[1] as usize).copied(),
            vertices.get(c[2] as usize).copied(),
        ) else {
            continue;
        };

        let pos0: cgmath::Vector3<_> = v0.position.into();
        let pos1: cgmath::Vector3<_> = v1.position.into();
        let pos2: cgmath::Vector3<_> = v2.position.into();

        let uv0: cgmath::Vector2<_> = v0.tex_coords.into();
        let uv1: cgmath::Vector2<_> = v1.tex_coords.into();
        let uv2: cgmath::Vector2<_> = v2.tex_coords.into();

        // Calculate the edges of the triangle
        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;

        // This will give us a direction to calculate the
        // tangent and bitangent
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // Solving the following system of equations will
        // give us the tangent and bitangent.
        //     delta_pos1 = delta_uv1.x * T + delta_u.y * B
        //     delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let r = 1.0 / det;
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) * r;
        // We flip the bitangent to enable right-handed normal
        // maps with wgpu texture coordinate system
        let bitangent = (delta_pos2 * delta_uv1.x - delta_pos1 * delta_uv2.x) * -r;

        // We'll use the same tangent/bitangent for each vertex in the triangle
        for &i in c {
            let v = &mut vertices[i as usize];
            v.tangent = (tangent + cgmath::Vector3::from(v.tangent)).into();
            v.bitangent = (bitangent + cgmath::Vector3::from(v.bitangent)).into();
            // Used to average the tangents/bitangents
            triangles_included[i as usize] += 1;
        }
    }

    // Average the tangents/bitangents
    for (i, n) in triangles_included.into_iter().enumerate() {
        if n == 0 {
            continue;
        }
        let denom = 1.0 / n as f32;
        let v = &mut vertices[i];
        v.tangent = (cgmath::Vector3::from(v.tangent) * denom).into();
        v.bitangent = (cgmath::Vector3::from(v.bitangent) * denom).into();
    }
}

/// A unit icosahedron subdivided `detail` times and scaled to `radius`.
pub fn icosphere(radius: f32, detail: u32) -> (Vec<model::ModelVertex>, Vec<u32>) {
    let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let mut positions: Vec<cgmath::Vector3<f32>> = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]
    .into_iter()
    .map(|p| cgmath::Vector3::from(p).normalize())
    .collect();

    #[rustfmt::skip]
    let mut faces: Vec<[u32; 3]> = vec![
        [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
        [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
        [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
        [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
    ];

    for _ in 0..detail {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
        let mut midpoint = |a: u32, b: u32, positions: &mut Vec<cgmath::Vector3<f32>>| {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                let mid = (positions[a as usize] + positions[b as usize]) * 0.5;
                positions.push(mid.normalize());
                positions.len() as u32 - 1
            })
        };
        faces = faces
            .iter()
            .flat_map(|&[a, b, c]| {
                let ab = midpoint(a, b, &mut positions);
                let bc = midpoint(b, c, &mut positions);
                let ca = midpoint(c, a, &mut positions);
                [[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]
            })
            .collect();
    }

    let mut vertices: Vec<model::ModelVertex> = positions
        .iter()
        .map(|n| {
            let u = 0.5 + n.z.atan2(n.x) / (2.0 * std::f32::consts::PI);
            let v = 0.5 - n.y.clamp(-1.0, 1.0).asin() / std::f32::consts::PI;
            model::ModelVertex {
                position: (n * radius).into(),
                tex_coords: [u, v],
                normal: (*n).into(),
                ..Default::default()
            }
        })
        .collect();
    let indices: Vec<u32> = faces.into_iter().flatten().collect();
    compute_tangents(&mut vertices, &indices);
    (vertices, indices)
}

pub fn upload_mesh(
    name: &str,
    vertices: &[model::ModelVertex],
    indices: &[u32],
    material: usize,
    device: &wgpu::Device,
) -> model::Mesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Vertex Buffer", name)),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{:?} Index Buffer", name)),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    model::Mesh {
        name: name.to_string(),
        vertex_buffer,
        index_buffer,
        num_elements: indices.len() as u32,
        material,
        bounds: Aabb::from_points(vertices.iter().map(|v| v.position)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icosphere_vertices_lie_on_the_radius() {
        let (vertices, indices) = icosphere(0.2, 2);
        // 20 faces quadrupled per subdivision
        assert_eq!(indices.len(), 20 * 16 * 3);
        // V = 10 * 4^detail + 2
        assert_eq!(vertices.len(), 162);
        for v in &vertices {
            let length = cgmath::Vector3::from(v.position).magnitude();
            assert!((length - 0.2).abs() < 1e-5);
        }
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }
}
