use matrixcompare::assert_scalar_eq;
use nalgebra::Point3;
use spacetime::config::{Accuracy, Context, CubeGrid, GridDescriptor, ShellGrid, SolveAccuracy};
use spacetime::element::ElementDegree;
use spacetime::error::ConfigError;
use spacetime::fields::Field;
use spacetime::problem::{IsotropicSchwarzschild, SpacetimeProblem};
use spacetime::solver::{FieldSolver, FieldSolverDescriptor, SchwarzschildValidation, ShellDomain};
use spacetime::tensor::Slot;

#[test]
fn isotropic_schwarzschild_data() {
    let problem = IsotropicSchwarzschild::new(1.0, Point3::origin(), Context::geometrized());
    assert_eq!(problem.horizon_radius(), 2.0);

    let point = Point3::new(0.0, 3.0, 4.0);
    let psi = problem.conformal_factor(&point);
    assert!((psi - 1.1).abs() < 1e-15);
    assert!((problem.analytical_determinant(&point) - psi.powi(12)).abs() < 1e-12);

    let metric = problem.initial_metric(&point);
    for slot in Slot::ALL {
        let expected = if slot.is_diagonal() { psi.powi(4) } else { 0.0 };
        assert!((metric[slot] - expected).abs() < 1e-14);
    }
    assert_eq!(problem.initial_extrinsic(&point).max_abs(), 0.0);
}

#[test]
fn unrefined_shell_keeps_exact_vertex_determinant() {
    // Without refinement every vertex lies on the inner or outer sphere and carries the exact
    // boundary data, so no vertex exceeds the comparison threshold
    let validation = SchwarzschildValidation::new(Context::geometrized());
    let report = validation
        .try_run(1e-3, 1, ShellDomain::default(), Accuracy::default(), 1.0)
        .unwrap();
    assert_eq!(report.run.len(), 1);
    assert_eq!(report.compared_points, 0);
    assert_eq!(report.standard_deviation, 0.0);
    assert_eq!(report.mean_absolute_error, 0.0);

    let deviation = validation.run(1e-3, 1, ShellDomain::default(), Accuracy::default(), 1.0);
    assert!(deviation < 1e-3);
}

fn refined_shell_report(refinement: u32, steps: usize) -> spacetime::solver::ValidationReport {
    let domain = ShellDomain {
        refinement,
        outer_ratio: 4.0,
    };
    let accuracy = Accuracy::uniform(SolveAccuracy::new(2000, 1e-12));
    SchwarzschildValidation::new(Context::geometrized())
        .try_run(1e-3, steps, domain, accuracy, 1.0)
        .unwrap()
}

#[test]
fn refined_shell_determinant_drift_stays_bounded() {
    // Interior vertices carry the L2 projection of the initial data, so the deviation is already
    // nonzero before the first step
    let initial = refined_shell_report(1, 0);
    assert!(initial.run.is_empty());
    assert_eq!(initial.compared_points, 26);
    assert_scalar_eq!(initial.standard_deviation, 9.3430e-2, comp = abs, tol = 5e-6);
    assert!(initial.mean_absolute_error > 0.0);
    assert!(initial.mean_absolute_error <= initial.standard_deviation);

    let evolved = refined_shell_report(1, 5);
    assert_eq!(evolved.run.len(), 5);
    assert!(evolved.run.all_converged());
    assert_eq!(evolved.run.degenerate_samples(), 0);
    assert_eq!(evolved.compared_points, 26);
    assert_scalar_eq!(evolved.standard_deviation, 9.3481e-2, comp = abs, tol = 5e-6);
    let growth = evolved.standard_deviation - initial.standard_deviation;
    assert!(growth.abs() < 2e-4, "determinant drift grew by {}", growth);
}

#[test]
fn shell_refinement_reduces_determinant_deviation() {
    let initial = refined_shell_report(2, 0);
    assert_eq!(initial.compared_points, 294);
    assert_scalar_eq!(initial.standard_deviation, 2.8661e-2, comp = abs, tol = 5e-6);

    let evolved = refined_shell_report(2, 2);
    assert!(evolved.run.all_converged());
    assert_eq!(evolved.compared_points, 294);
    assert_scalar_eq!(evolved.standard_deviation, 2.8666e-2, comp = abs, tol = 5e-6);
    assert!((evolved.standard_deviation - initial.standard_deviation).abs() < 5e-5);

    assert!(initial.standard_deviation < refined_shell_report(1, 0).standard_deviation / 3.0);
}

#[test]
fn validation_errors_report_zero() {
    let validation = SchwarzschildValidation::new(Context::geometrized());

    // A massless body has no horizon to build the shell around
    let err = validation
        .try_run(1e-3, 1, ShellDomain::default(), Accuracy::default(), 0.0)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotPositive { name: "horizon radius", .. })
    ));
    assert_eq!(validation.run(1e-3, 1, ShellDomain::default(), Accuracy::default(), 0.0), 0.0);

    let inverted = ShellDomain {
        refinement: 0,
        outer_ratio: 0.5,
    };
    assert!(validation
        .try_run(1e-3, 1, inverted, Accuracy::default(), 1.0)
        .is_err());
    assert_eq!(validation.run(1e-3, 1, inverted, Accuracy::default(), 1.0), 0.0);

    let zero_iterations = Accuracy::uniform(SolveAccuracy::new(0, 1e-12));
    assert_eq!(validation.run(1e-3, 1, ShellDomain::default(), zero_iterations, 1.0), 0.0);
}

#[test]
fn field_solver_evolves_flat_space_on_cube() {
    let descriptor = FieldSolverDescriptor {
        grid: GridDescriptor::Cube(CubeGrid {
            refinement: 1,
            ..CubeGrid::default()
        }),
        degree: ElementDegree::Linear,
        accuracy: Accuracy::default(),
    };
    let mut solver = FieldSolver::vacuum(Context::geometrized(), descriptor).unwrap();
    assert!(solver.evolution().is_none());

    let report = solver.run(1e-3, 2).unwrap();
    assert_eq!(report.len(), 2);
    assert!(report.all_converged());

    let evolution = solver.evolution().unwrap();
    assert_eq!(evolution.space().num_dofs(), 27);
    for g11 in evolution.vertex_values(Field::Metric(Slot::S11)) {
        assert!((g11 - 1.0).abs() < 1e-12);
    }
    for k12 in evolution.vertex_values(Field::Extrinsic(Slot::S12)) {
        assert!(k12.abs() < 1e-12);
    }
}

#[test]
fn field_solver_rejects_invalid_input() {
    let shell = GridDescriptor::Shell(ShellGrid {
        center: Point3::origin(),
        inner_radius: 2.0,
        outer_radius: 1.0,
        refinement: 0,
    });
    let descriptor = FieldSolverDescriptor {
        grid: shell,
        ..FieldSolverDescriptor::default()
    };
    assert!(matches!(
        FieldSolver::vacuum(Context::geometrized(), descriptor),
        Err(ConfigError::InvalidShell { .. })
    ));

    let mut solver = FieldSolver::vacuum(Context::geometrized(), FieldSolverDescriptor::default()).unwrap();
    assert!(solver.run(f64::NAN, 1).is_err());
    assert!(solver.evolution().is_none());
}
