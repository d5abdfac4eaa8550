//! Basic procedural mesh generation routines.
use crate::mesh::{Hex8Connectivity, HexMesh};
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;
use std::f64::consts::FRAC_PI_4;

/// Creates a uniform hexahedral mesh of the axis-aligned box `[min, max]`.
///
/// Returns an empty mesh if any axis has zero cells.
pub fn create_box_mesh(min: &Point3<f64>, max: &Point3<f64>, cells_per_axis: [usize; 3]) -> HexMesh {
    let [nx, ny, nz] = cells_per_axis;
    if nx == 0 || ny == 0 || nz == 0 {
        return HexMesh::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let (vx, vy, vz) = (nx + 1, ny + 1, nz + 1);
    let h = Vector3::new(
        (max.x - min.x) / nx as f64,
        (max.y - min.y) / ny as f64,
        (max.z - min.z) / nz as f64,
    );
    let idx = |i: usize, j: usize, k: usize| (vx * vy) * k + vx * j + i;

    let mut vertices = Vec::with_capacity(vx * vy * vz);
    for k in 0..vz {
        for j in 0..vy {
            for i in 0..vx {
                vertices.push(Point3::new(
                    min.x + i as f64 * h.x,
                    min.y + j as f64 * h.y,
                    min.z + k as f64 * h.z,
                ));
            }
        }
    }

    let mut cells = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                cells.push(Hex8Connectivity([
                    idx(i, j, k),
                    idx(i + 1, j, k),
                    idx(i + 1, j + 1, k),
                    idx(i, j + 1, k),
                    idx(i, j, k + 1),
                    idx(i + 1, j, k + 1),
                    idx(i + 1, j + 1, k + 1),
                    idx(i, j + 1, k + 1),
                ]));
            }
        }
    }

    HexMesh::from_vertices_and_connectivity(vertices, cells)
}

/// Cube faces as `(normal axis, sign, first tangent axis, second tangent axis)`, with the
/// tangents ordered so that their cross product points outwards.
#[rustfmt::skip]
const CUBE_PATCHES: [(usize, i64, usize, usize); 6] = [
    (0,  1, 1, 2),
    (0, -1, 2, 1),
    (1,  1, 2, 0),
    (1, -1, 0, 2),
    (2,  1, 0, 1),
    (2, -1, 1, 0),
];

/// Creates a hexahedral mesh of the spherical shell `inner <= |x - center| <= outer`.
///
/// The shell is made of six patches, one per face of a cube projected onto the sphere. Each
/// patch has `2^refinement` cells along both angular directions and `2^refinement` radial
/// layers. Angular nodes are equally spaced in angle and radial nodes equally spaced in radius.
pub fn create_shell_mesh(center: &Point3<f64>, inner: f64, outer: f64, refinement: u32) -> HexMesh {
    let n = 1usize << refinement;
    let n_i64 = n as i64;

    // Vertices on patch seams are shared, so they are keyed by an integer lattice point on the
    // surface of the cube [-n, n]³ together with the radial layer.
    let mut vertex_map: FxHashMap<(usize, [i64; 3]), usize> = FxHashMap::default();
    let mut vertices = Vec::new();
    let mut cells = Vec::with_capacity(6 * n * n * n);

    let mut vertex_index = |layer: usize, lattice: [i64; 3]| -> usize {
        *vertex_map.entry((layer, lattice)).or_insert_with(|| {
            let direction = Vector3::from_fn(|d, _| {
                let s = lattice[d] as f64 / n_i64 as f64;
                if lattice[d].abs() == n_i64 {
                    s
                } else {
                    (FRAC_PI_4 * s).tan()
                }
            })
            .normalize();
            let radius = inner + (outer - inner) * layer as f64 / n as f64;
            vertices.push(center + direction * radius);
            vertices.len() - 1
        })
    };

    for &(axis, sign, u_axis, v_axis) in &CUBE_PATCHES {
        let lattice = |i: usize, j: usize| {
            let mut point = [0i64; 3];
            point[axis] = sign * n_i64;
            point[u_axis] = 2 * i as i64 - n_i64;
            point[v_axis] = 2 * j as i64 - n_i64;
            point
        };

        for k in 0..n {
            for j in 0..n {
                for i in 0..n {
                    cells.push(Hex8Connectivity([
                        vertex_index(k, lattice(i, j)),
                        vertex_index(k, lattice(i + 1, j)),
                        vertex_index(k, lattice(i + 1, j + 1)),
                        vertex_index(k, lattice(i, j + 1)),
                        vertex_index(k + 1, lattice(i, j)),
                        vertex_index(k + 1, lattice(i + 1, j)),
                        vertex_index(k + 1, lattice(i + 1, j + 1)),
                        vertex_index(k + 1, lattice(i, j + 1)),
                    ]));
                }
            }
        }
    }

    HexMesh::from_vertices_and_connectivity(vertices, cells)
}
