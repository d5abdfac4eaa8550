use matrixcompare::assert_scalar_eq;
use nalgebra::Point3;
use spacetime::config::{CubeGrid, GridDescriptor, ShellGrid};
use spacetime::mesh::procedural::{create_box_mesh, create_shell_mesh};
use spacetime::mesh::{Hex8Connectivity, HexMesh};

fn single_hex() -> HexMesh {
    create_box_mesh(&Point3::origin(), &Point3::new(1.0, 1.0, 1.0), [1, 1, 1])
}

#[test]
fn box_mesh_counts() {
    let mesh = create_box_mesh(&Point3::new(-1.0, 0.0, 0.0), &Point3::new(1.0, 2.0, 3.0), [2, 3, 4]);
    assert_eq!(mesh.num_cells(), 24);
    assert_eq!(mesh.vertices().len(), 3 * 4 * 5);

    let min = mesh.vertices().iter().fold(f64::MAX, |acc, v| acc.min(v.x));
    let max = mesh.vertices().iter().fold(f64::MIN, |acc, v| acc.max(v.z));
    assert_eq!(min, -1.0);
    assert_eq!(max, 3.0);
}

#[test]
fn box_mesh_with_zero_cells_is_empty() {
    let mesh = create_box_mesh(&Point3::origin(), &Point3::new(1.0, 1.0, 1.0), [2, 0, 2]);
    assert_eq!(mesh.num_cells(), 0);
    assert!(mesh.vertices().is_empty());
}

#[test]
fn single_hex_boundary() {
    let mesh = single_hex();
    let faces = mesh.find_boundary_faces();
    assert_eq!(faces.len(), 6);
    assert!(faces.iter().all(|face| face.cell == 0));

    let mut local_faces: Vec<_> = faces.iter().map(|face| face.local_face).collect();
    local_faces.sort_unstable();
    assert_eq!(local_faces, [0, 1, 2, 3, 4, 5]);
    assert_eq!(mesh.find_boundary_vertices(), (0..8).collect::<Vec<_>>());
}

#[test]
fn interior_vertex_of_box_is_not_on_boundary() {
    let mesh = create_box_mesh(&Point3::origin(), &Point3::new(2.0, 2.0, 2.0), [2, 2, 2]);
    // 4 boundary faces per side of the cube
    assert_eq!(mesh.find_boundary_faces().len(), 24);

    let boundary = mesh.find_boundary_vertices();
    assert_eq!(boundary.len(), 26);
    let center = mesh
        .vertices()
        .iter()
        .position(|v| *v == Point3::new(1.0, 1.0, 1.0))
        .unwrap();
    assert!(!boundary.contains(&center));
}

#[test]
fn two_cells_share_a_face() {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
        Point3::new(0.0, 0.0, 2.0),
        Point3::new(1.0, 0.0, 2.0),
        Point3::new(1.0, 1.0, 2.0),
        Point3::new(0.0, 1.0, 2.0),
    ];
    let cells = vec![
        Hex8Connectivity([0, 1, 2, 3, 4, 5, 6, 7]),
        Hex8Connectivity([4, 5, 6, 7, 8, 9, 10, 11]),
    ];
    let mesh = HexMesh::from_vertices_and_connectivity(vertices, cells);
    let faces = mesh.find_boundary_faces();
    assert_eq!(faces.len(), 10);
    assert!(faces.iter().all(|face| {
        let mut sorted = face.vertices;
        sorted.sort_unstable();
        sorted != [4, 5, 6, 7]
    }));
    assert_eq!(mesh.find_boundary_vertices().len(), 12);
}

#[test]
#[should_panic]
fn out_of_bounds_connectivity_panics() {
    HexMesh::from_vertices_and_connectivity(vec![Point3::origin()], vec![Hex8Connectivity([0, 1, 2, 3, 4, 5, 6, 7])]);
}

#[test]
fn shell_mesh_counts() {
    for refinement in 0..3 {
        let n = 1usize << refinement;
        let mesh = create_shell_mesh(&Point3::origin(), 1.0, 2.0, refinement);
        assert_eq!(mesh.num_cells(), 6 * n * n * n);
        // n + 1 radial layers of the 6n² + 2 lattice points on a cube surface
        assert_eq!(mesh.vertices().len(), (n + 1) * (6 * n * n + 2));
        // Inner and outer sphere
        assert_eq!(mesh.find_boundary_faces().len(), 2 * 6 * n * n);
    }
}

#[test]
fn shell_mesh_vertices_lie_on_spheres() {
    let center = Point3::new(1.0, -2.0, 0.5);
    let refinement = 2;
    let n = 1 << refinement;
    let mesh = create_shell_mesh(&center, 2.0, 4.0, refinement);

    for vertex in mesh.vertices() {
        let r = (vertex - center).norm();
        // Radial layers are equally spaced
        let layer = (r - 2.0) * n as f64 / 2.0;
        assert_scalar_eq!(layer, layer.round(), comp = abs, tol = 1e-12);
        assert!(r >= 2.0 - 1e-12 && r <= 4.0 + 1e-12);
    }

    for &v in &mesh.find_boundary_vertices() {
        let r = (mesh.vertices()[v] - center).norm();
        assert!((r - 2.0).abs() < 1e-12 || (r - 4.0).abs() < 1e-12);
    }
}

#[test]
fn shell_cells_are_positively_oriented() {
    let mesh = create_shell_mesh(&Point3::origin(), 1.0, 3.0, 1);
    for cell in 0..mesh.num_cells() {
        let x = mesh.cell_vertices(cell);
        // Jacobian of the trilinear map at the first corner
        let e1 = x[1] - x[0];
        let e2 = x[3] - x[0];
        let e3 = x[4] - x[0];
        assert!(e1.cross(&e2).dot(&e3) > 0.0, "cell {cell} is inverted");
    }
}

#[test]
fn grid_descriptors_build_meshes() {
    let cube = GridDescriptor::Cube(CubeGrid {
        center: Point3::new(1.0, 1.0, 1.0),
        width: 2.0,
        height: 4.0,
        depth: 6.0,
        refinement: 2,
    });
    let mesh = cube.build_mesh().unwrap();
    assert_eq!(mesh.num_cells(), 64);
    let max = mesh
        .vertices()
        .iter()
        .fold(Point3::new(f64::MIN, f64::MIN, f64::MIN), |acc, v| acc.sup(v));
    assert_eq!(max, Point3::new(2.0, 3.0, 4.0));

    let shell = GridDescriptor::Shell(ShellGrid {
        center: Point3::origin(),
        inner_radius: 1.0,
        outer_radius: 2.0,
        refinement: 1,
    });
    assert_eq!(shell.build_mesh().unwrap().num_cells(), 48);
}
