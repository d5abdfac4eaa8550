use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, Matrix3, Point3, Vector3};
use proptest::prelude::*;
use spacetime::element::{ElementDegree, LagrangeHex, HEX_CORNERS, HEX_FACES};
use spacetime::quadrature::{gauss_1d, HexQuadrature};

const DEGREES: [ElementDegree; 2] = [ElementDegree::Linear, ElementDegree::Quadratic];

fn point_in_reference_hex() -> impl Strategy<Value = Point3<f64>> {
    [-1.0..=1.0, -1.0..=1.0, -1.0..=1.0].prop_map(|[x, y, z]| Point3::new(x, y, z))
}

struct Evaluation {
    values: Vec<f64>,
    gradients: Vec<Vector3<f64>>,
    hessians: Vec<Matrix3<f64>>,
}

fn evaluate(element: &LagrangeHex, xi: &Point3<f64>) -> Evaluation {
    let n = element.num_nodes();
    let mut evaluation = Evaluation {
        values: vec![0.0; n],
        gradients: vec![Vector3::zeros(); n],
        hessians: vec![Matrix3::zeros(); n],
    };
    element.evaluate(
        xi,
        &mut evaluation.values,
        &mut evaluation.gradients,
        &mut evaluation.hessians,
    );
    evaluation
}

#[test]
fn node_counts() {
    assert_eq!(LagrangeHex::new(ElementDegree::Linear).num_nodes(), 8);
    assert_eq!(LagrangeHex::new(ElementDegree::Quadratic).num_nodes(), 27);
    assert_eq!(LagrangeHex::trilinear(), LagrangeHex::new(ElementDegree::Linear));
    assert_eq!(ElementDegree::default(), ElementDegree::Quadratic);
}

#[test]
fn lagrange_property() {
    // N_i(x_j) = delta_ij for every node x_j
    for degree in DEGREES {
        let element = LagrangeHex::new(degree);
        let n = element.num_nodes();
        let mut phi = vec![0.0; n];
        let mut values = DMatrix::zeros(n, n);
        for j in 0..n {
            element.populate_basis(&element.node_reference_coords(j), &mut phi);
            values.column_mut(j).copy_from_slice(&phi);
        }
        assert_matrix_eq!(values, DMatrix::<f64>::identity(n, n), comp = abs, tol = 1e-14);
    }
}

#[test]
fn corners_come_first() {
    let element = LagrangeHex::new(ElementDegree::Quadratic);
    for (corner, coords) in HEX_CORNERS.iter().enumerate() {
        let [x, y, z] = *coords;
        assert_eq!(element.node_reference_coords(corner), Point3::new(x, y, z));
    }
}

#[test]
fn parent_corners_of_quadratic_nodes() {
    let element = LagrangeHex::new(ElementDegree::Quadratic);
    let mut counts = [0; 9];
    for node in 0..element.num_nodes() {
        let parents = element.parent_corners(node);
        assert!(parents.windows(2).all(|w| w[0] < w[1]));
        counts[parents.len()] += 1;

        // The node is the centroid of its parent corners
        let centroid = parents
            .iter()
            .map(|&c| element.node_reference_coords(c).coords)
            .sum::<Vector3<f64>>()
            / parents.len() as f64;
        assert_eq!(centroid, element.node_reference_coords(node).coords);
    }
    // 8 corners, 12 edges, 6 faces, 1 center
    assert_eq!(counts[1], 8);
    assert_eq!(counts[2], 12);
    assert_eq!(counts[4], 6);
    assert_eq!(counts[8], 1);
}

#[test]
fn faces_lie_on_reference_boundary() {
    for face in HEX_FACES {
        // All corners of a face share one fixed coordinate
        let fixed = (0..3).filter(|&d| face.iter().map(|&c| HEX_CORNERS[c][d]).all(|x| x == HEX_CORNERS[face[0]][d]));
        assert_eq!(fixed.count(), 1);
    }
}

#[test]
fn gauss_rule_integrates_polynomials_exactly() {
    let (weights, _) = gauss_1d(4);
    assert_scalar_eq!(weights.iter().sum::<f64>(), 2.0, comp = abs, tol = 1e-14);

    let quadrature = HexQuadrature::gauss(3);
    assert_eq!(quadrature.len(), 27);
    assert_scalar_eq!(quadrature.integrate(|_| 1.0), 8.0, comp = abs, tol = 1e-13);
    // ∫ x² y⁴ over [-1, 1]³ = 2/3 · 2/5 · 2
    let integral = quadrature.integrate(|p| p.x * p.x * p.y.powi(4));
    assert_scalar_eq!(integral, 8.0 / 15.0, comp = abs, tol = 1e-13);
}

proptest! {
    #[test]
    fn partition_of_unity(xi in point_in_reference_hex()) {
        for degree in DEGREES {
            let evaluation = evaluate(&LagrangeHex::new(degree), &xi);
            let value_sum: f64 = evaluation.values.iter().sum();
            let gradient_sum: Vector3<f64> = evaluation.gradients.iter().sum();
            let hessian_sum: Matrix3<f64> = evaluation.hessians.iter().sum();
            assert_scalar_eq!(value_sum, 1.0, comp = abs, tol = 1e-12);
            assert_matrix_eq!(gradient_sum, Vector3::zeros(), comp = abs, tol = 1e-12);
            assert_matrix_eq!(hessian_sum, Matrix3::zeros(), comp = abs, tol = 1e-12);
        }
    }

    #[test]
    fn gradients_match_finite_differences(xi in point_in_reference_hex()) {
        let h = 1e-6;
        for degree in DEGREES {
            let element = LagrangeHex::new(degree);
            let n = element.num_nodes();
            let evaluation = evaluate(&element, &xi);
            let mut plus = vec![0.0; n];
            let mut minus = vec![0.0; n];
            for d in 0..3 {
                let mut offset = Vector3::zeros();
                offset[d] = h;
                element.populate_basis(&(xi + offset), &mut plus);
                element.populate_basis(&(xi - offset), &mut minus);
                for i in 0..n {
                    let approximate = (plus[i] - minus[i]) / (2.0 * h);
                    assert_scalar_eq!(evaluation.gradients[i][d], approximate, comp = abs, tol = 1e-7);
                }
            }
        }
    }

    #[test]
    fn hessians_match_finite_differences_of_gradients(xi in point_in_reference_hex()) {
        let h = 1e-5;
        let element = LagrangeHex::new(ElementDegree::Quadratic);
        let evaluation = evaluate(&element, &xi);
        for d in 0..3 {
            let mut offset = Vector3::zeros();
            offset[d] = h;
            let plus = evaluate(&element, &(xi + offset));
            let minus = evaluate(&element, &(xi - offset));
            for i in 0..element.num_nodes() {
                let approximate = (plus.gradients[i] - minus.gradients[i]) / (2.0 * h);
                assert_matrix_eq!(evaluation.hessians[i].column(d), approximate, comp = abs, tol = 1e-7);
            }
        }
    }
}
