//! Time stepping of the ADM system.
//!
//! Every step runs the same fixed sequence:
//!
//! 1. assemble the mass matrix,
//! 2. assemble and solve the lapse equation `M α = ∫ (1 + ln det g) φ`,
//! 3. assemble the weak-form time derivatives of metric and extrinsic curvature from the current
//!    state,
//! 4. for every component `u` of metric and extrinsic curvature solve
//!    `M u_next = M u + dt ∫ ∂_t u φ` with Dirichlet data from the problem.
use crate::adm::matter_coupling;
use crate::assembly::{Assembler, RhsVectors};
use crate::config::{EvolutionConfig, SolveAccuracy};
use crate::constraints::AffineConstraints;
use crate::error::SolverError;
use crate::fields::{Field, SpacetimeFields, TensorField};
use crate::problem::SpacetimeProblem;
use crate::solve::{MassSolver, SolveStatus};
use crate::source::{MatterSource, Vacuum};
use crate::space::FiniteElementSpace;
use crate::tensor::{Slot, Sym3};
use log::{debug, info, warn};
use nalgebra::{DVector, Point3};
use nalgebra_sparse::CsrMatrix;
use spacetime_sparse::csr::{mul_add, zeros_from_pattern};
use std::collections::BTreeMap;

/// Diagnostics of a single time step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Number of the step, starting at 1.
    pub step: usize,
    /// Simulation time after the step.
    pub time: f64,
    /// Status of every solve of the step in the order they were performed, lapse first.
    pub solves: Vec<(Field, SolveStatus)>,
    /// Quadrature points at which the metric determinant was non-positive or not finite.
    pub degenerate_samples: usize,
    /// The first field with a NaN or infinite coefficient after the step.
    pub non_finite: Option<Field>,
}

impl StepReport {
    pub fn status(&self, field: Field) -> Option<SolveStatus> {
        self.solves
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, status)| *status)
    }

    pub fn all_converged(&self) -> bool {
        self.solves.iter().all(|(_, status)| status.is_converged())
    }

    /// Whether the step produced fields that can be trusted numerically.
    pub fn is_healthy(&self) -> bool {
        self.all_converged() && self.degenerate_samples == 0 && self.non_finite.is_none()
    }
}

/// Diagnostics of a complete run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn all_converged(&self) -> bool {
        self.steps.iter().all(StepReport::all_converged)
    }

    pub fn degenerate_samples(&self) -> usize {
        self.steps.iter().map(|s| s.degenerate_samples).sum()
    }

    pub fn first_non_finite(&self) -> Option<(usize, Field)> {
        self.steps
            .iter()
            .find_map(|s| s.non_finite.map(|field| (s.step, field)))
    }

    pub fn final_time(&self) -> Option<f64> {
        self.steps.last().map(|s| s.time)
    }
}

#[derive(Debug, Clone)]
struct BoundaryValues {
    metric: [BTreeMap<usize, f64>; 6],
    extrinsic: [BTreeMap<usize, f64>; 6],
    lapse: BTreeMap<usize, f64>,
}

impl BoundaryValues {
    fn new<P: SpacetimeProblem>(space: &FiniteElementSpace, problem: &P) -> Self {
        let mut values = Self {
            metric: Default::default(),
            extrinsic: Default::default(),
            lapse: BTreeMap::new(),
        };
        for &dof in space.boundary_dofs() {
            let point = &space.support_points()[dof];
            let metric = problem.boundary_metric(point);
            let extrinsic = problem.boundary_extrinsic(point);
            for slot in Slot::ALL {
                values.metric[slot.index()].insert(dof, metric[slot]);
                values.extrinsic[slot.index()].insert(dof, extrinsic[slot]);
            }
            if let Some(lapse) = problem.boundary_lapse(point) {
                values.lapse.insert(dof, lapse);
            }
        }
        values
    }
}

/// Evolves metric, extrinsic curvature and lapse on a fixed finite element space.
pub struct Evolution<P, S = Vacuum> {
    space: FiniteElementSpace,
    constraints: AffineConstraints,
    assembler: Assembler,
    fields: SpacetimeFields,
    rhs: RhsVectors,
    mass: CsrMatrix<f64>,
    solver: MassSolver,
    boundary: BoundaryValues,
    problem: P,
    source: S,
    config: EvolutionConfig,
    coupling: f64,
    initialized: bool,
    steps_taken: usize,
    time: f64,
}

impl<P> Evolution<P, Vacuum>
where
    P: SpacetimeProblem,
{
    /// An evolution without matter.
    pub fn vacuum(space: FiniteElementSpace, problem: P, config: EvolutionConfig) -> Result<Self, SolverError> {
        Self::new(space, problem, Vacuum, config)
    }
}

impl<P, S> Evolution<P, S>
where
    P: SpacetimeProblem,
    S: MatterSource,
{
    /// Validates `config` and allocates all matrices and vectors. Fields start at zero with unit
    /// lapse until [`Evolution::initialize`] is called.
    pub fn new(space: FiniteElementSpace, problem: P, source: S, config: EvolutionConfig) -> Result<Self, SolverError> {
        config.validate()?;
        let mut constraints = AffineConstraints::new();
        constraints.close()?;

        let num_dofs = space.num_dofs();
        let mass = zeros_from_pattern(space.sparsity_pattern());
        let solver = MassSolver::new(&mass);
        let assembler = Assembler::new(&space).with_parallel(config.parallel_assembly);
        let boundary = BoundaryValues::new(&space, &problem);

        let mut fields = SpacetimeFields::zeros(num_dofs);
        fields.lapse.fill(1.0);

        info!(
            "Set up evolution with {} cells, {} dofs, {} nonzeros in the mass matrix",
            space.num_cells(),
            num_dofs,
            mass.nnz()
        );

        Ok(Self {
            coupling: matter_coupling(config.context.gravitational_constant, config.context.speed_of_light),
            rhs: RhsVectors::zeros(num_dofs),
            space,
            constraints,
            assembler,
            fields,
            mass,
            solver,
            boundary,
            problem,
            source,
            config,
            initialized: false,
            steps_taken: 0,
            time: 0.0,
        })
    }

    /// Sets metric and extrinsic curvature to the L2 projection of the initial data, with the
    /// boundary data substituted on boundary dofs, and resets the lapse to one.
    pub fn initialize(&mut self) -> Result<Vec<(Field, SolveStatus)>, SolverError> {
        let Self {
            space,
            constraints,
            assembler,
            fields,
            rhs,
            mass,
            solver,
            boundary,
            problem,
            config,
            ..
        } = self;

        assembler.assemble_mass_matrix(space, constraints, mass)?;

        let mut statuses = Vec::with_capacity(12);
        assembler.assemble_projection_rhs(space, constraints, |p| problem.initial_metric(p), &mut rhs.metric)?;
        project(
            space,
            solver,
            mass,
            constraints,
            Field::Metric,
            &mut rhs.metric,
            &mut fields.metric,
            &boundary.metric,
            &config.accuracy.metric,
            |p| problem.initial_metric(p),
            &mut statuses,
        )?;

        assembler.assemble_projection_rhs(space, constraints, |p| problem.initial_extrinsic(p), &mut rhs.extrinsic)?;
        project(
            space,
            solver,
            mass,
            constraints,
            Field::Extrinsic,
            &mut rhs.extrinsic,
            &mut fields.extrinsic,
            &boundary.extrinsic,
            &config.accuracy.extrinsic,
            |p| problem.initial_extrinsic(p),
            &mut statuses,
        )?;

        fields.lapse.fill(1.0);
        self.initialized = true;
        self.steps_taken = 0;
        self.time = 0.0;
        info!("Projected initial data onto {} dofs", self.space.num_dofs());
        Ok(statuses)
    }

    /// Advances all fields by one time step. Initializes the fields first if necessary.
    ///
    /// Non-convergent solves and degenerate metric samples are reported in the returned
    /// [`StepReport`] and do not stop the evolution.
    pub fn step(&mut self) -> Result<StepReport, SolverError> {
        if !self.initialized {
            self.initialize()?;
        }

        let dt = self.config.time_step;
        let Self {
            space,
            constraints,
            assembler,
            fields,
            rhs,
            mass,
            solver,
            boundary,
            source,
            config,
            coupling,
            ..
        } = self;

        assembler.assemble_mass_matrix(space, constraints, mass)?;

        let mut solves = Vec::with_capacity(Field::ALL.len());
        let lapse_degenerate = assembler.assemble_lapse_rhs(space, constraints, fields, &mut rhs.lapse)?;
        let status = solver.solve(
            "lapse",
            mass,
            &mut rhs.lapse,
            &mut fields.lapse,
            &boundary.lapse,
            constraints,
            &config.accuracy.lapse,
        )?;
        solves.push((Field::Lapse, status));

        let evolution_degenerate =
            assembler.assemble_evolution_rhs(space, constraints, fields, source, *coupling, rhs)?;

        for slot in Slot::ALL {
            let field = Field::Metric(slot);
            let status = advance(
                solver,
                mass,
                constraints,
                field,
                dt,
                &mut rhs.metric[slot],
                &mut fields.metric[slot],
                &boundary.metric[slot.index()],
                &config.accuracy.metric,
            )?;
            solves.push((field, status));
        }
        for slot in Slot::ALL {
            let field = Field::Extrinsic(slot);
            let status = advance(
                solver,
                mass,
                constraints,
                field,
                dt,
                &mut rhs.extrinsic[slot],
                &mut fields.extrinsic[slot],
                &boundary.extrinsic[slot.index()],
                &config.accuracy.extrinsic,
            )?;
            solves.push((field, status));
        }

        // Both assemblies test the same metric at the same quadrature points, since the lapse
        // solve leaves the metric untouched. The two counts are equal.
        let degenerate_samples = lapse_degenerate.max(evolution_degenerate);
        if degenerate_samples > 0 {
            warn!("{} quadrature points with degenerate metric", degenerate_samples);
        }
        let non_finite = fields.first_non_finite();
        if let Some(field) = non_finite {
            warn!("Field {} is no longer finite", field);
        }

        self.steps_taken += 1;
        self.time += dt;
        debug!("Finished step {} at t = {}", self.steps_taken, self.time);

        Ok(StepReport {
            step: self.steps_taken,
            time: self.time,
            solves,
            degenerate_samples,
            non_finite,
        })
    }

    /// Runs the configured number of steps.
    pub fn run(&mut self) -> Result<RunReport, SolverError> {
        let mut report = RunReport::default();
        for _ in 0..self.config.steps {
            report.steps.push(self.step()?);
        }
        info!(
            "Finished {} steps at t = {} ({} unconverged solves, {} degenerate samples)",
            report.len(),
            self.time,
            report
                .steps
                .iter()
                .flat_map(|s| &s.solves)
                .filter(|(_, status)| !status.is_converged())
                .count(),
            report.degenerate_samples()
        );
        Ok(report)
    }

    pub fn fields(&self) -> &SpacetimeFields {
        &self.fields
    }

    /// Replaces the current state, e.g. to continue from a stored snapshot.
    ///
    /// Fails without changing the state if any field does not have one coefficient per dof.
    pub fn set_fields(&mut self, fields: SpacetimeFields) -> Result<(), SolverError> {
        let expected = self.space.num_dofs();
        if let Some(actual) = Field::ALL
            .into_iter()
            .map(|field| fields.field(field).len())
            .find(|&len| len != expected)
        {
            return Err(SolverError::DofCountMismatch { expected, actual });
        }
        self.fields = fields;
        self.initialized = true;
        Ok(())
    }

    /// Values of `field` at the mesh vertices.
    pub fn vertex_values(&self, field: Field) -> Vec<f64> {
        self.space.vertex_values(self.fields.field(field))
    }

    pub fn space(&self) -> &FiniteElementSpace {
        &self.space
    }

    pub fn problem(&self) -> &P {
        &self.problem
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// The most recently assembled mass matrix.
    pub fn mass_matrix(&self) -> &CsrMatrix<f64> {
        &self.mass
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

/// Solves `M u_next = M u + dt b` in place of `rhs` and `solution`.
#[allow(clippy::too_many_arguments)]
fn advance(
    solver: &mut MassSolver,
    mass: &CsrMatrix<f64>,
    constraints: &AffineConstraints,
    field: Field,
    dt: f64,
    rhs: &mut DVector<f64>,
    solution: &mut DVector<f64>,
    boundary_values: &BTreeMap<usize, f64>,
    accuracy: &SolveAccuracy,
) -> Result<SolveStatus, SolverError> {
    *rhs *= dt;
    mul_add(mass, &*solution, &mut *rhs);
    solver.solve(&field.name(), mass, rhs, solution, boundary_values, constraints, accuracy)
}

/// Solves the six mass matrix systems of a tensor projection, starting from the interpolant.
#[allow(clippy::too_many_arguments)]
fn project(
    space: &FiniteElementSpace,
    solver: &mut MassSolver,
    mass: &CsrMatrix<f64>,
    constraints: &AffineConstraints,
    field_of: impl Fn(Slot) -> Field,
    rhs: &mut TensorField,
    solution: &mut TensorField,
    boundary_values: &[BTreeMap<usize, f64>; 6],
    accuracy: &SolveAccuracy,
    function: impl Fn(&Point3<f64>) -> Sym3<f64>,
    statuses: &mut Vec<(Field, SolveStatus)>,
) -> Result<(), SolverError> {
    for slot in Slot::ALL {
        let field = field_of(slot);
        solution[slot] = space.interpolate(|p| function(p)[slot]);
        let status = solver.solve(
            &field.name(),
            mass,
            &mut rhs[slot],
            &mut solution[slot],
            &boundary_values[slot.index()],
            constraints,
            accuracy,
        )?;
        statuses.push((field, status));
    }
    Ok(())
}
