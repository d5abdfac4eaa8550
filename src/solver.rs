//! Entry points for embedding applications.
//!
//! Each front-end validates its descriptors, builds a mesh and a finite element space, and drives
//! an [`Evolution`] or the N-body stepper.
use crate::config::{Accuracy, Context, EvolutionConfig, GridDescriptor, ShellGrid};
use crate::element::ElementDegree;
use crate::error::{ConfigError, ParticleNotFound, SolverError};
use crate::evolution::{Evolution, RunReport};
use crate::fields::Field;
use crate::nbody::{Particle, PostNewtonian};
use crate::problem::{IsotropicSchwarzschild, Minkowski, SpacetimeProblem};
use crate::source::{MatterSource, Vacuum};
use crate::space::FiniteElementSpace;
use crate::tensor::Slot;
use eyre::WrapErr;
use log::{error, info};
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

fn build_space(grid: &GridDescriptor, degree: ElementDegree) -> Result<FiniteElementSpace, SolverError> {
    let mesh = grid.build_mesh()?;
    info!(
        "Built mesh with {} vertices and {} cells",
        mesh.vertices().len(),
        mesh.num_cells()
    );
    FiniteElementSpace::new(mesh, degree)
}

/// Grid, element and accuracy of a [`FieldSolver`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSolverDescriptor {
    pub grid: GridDescriptor,
    pub degree: ElementDegree,
    pub accuracy: Accuracy,
}

impl FieldSolverDescriptor {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.accuracy.validate()
    }
}

/// Evolves a problem on a Cartesian or shell grid to completion.
pub struct FieldSolver<P = Minkowski, S = Vacuum> {
    context: Context,
    descriptor: FieldSolverDescriptor,
    problem: P,
    source: S,
    evolution: Option<Evolution<P, S>>,
}

impl FieldSolver<Minkowski, Vacuum> {
    /// Flat vacuum spacetime.
    pub fn vacuum(context: Context, descriptor: FieldSolverDescriptor) -> Result<Self, ConfigError> {
        Self::new(context, descriptor, Minkowski, Vacuum)
    }
}

impl<P, S> FieldSolver<P, S>
where
    P: SpacetimeProblem + Clone,
    S: MatterSource + Clone,
{
    pub fn new(context: Context, descriptor: FieldSolverDescriptor, problem: P, source: S) -> Result<Self, ConfigError> {
        context.validate()?;
        descriptor.validate()?;
        Ok(Self {
            context,
            descriptor,
            problem,
            source,
            evolution: None,
        })
    }

    /// Builds the grid, projects the initial data and runs `steps` steps of size `dt`.
    ///
    /// Every call starts from the initial data again. The finished evolution is kept and can be
    /// inspected with [`FieldSolver::evolution`].
    pub fn run(&mut self, dt: f64, steps: usize) -> Result<RunReport, SolverError> {
        let config = EvolutionConfig {
            time_step: dt,
            steps,
            accuracy: self.descriptor.accuracy,
            context: self.context,
            parallel_assembly: true,
        };
        config.validate()?;

        let space = build_space(&self.descriptor.grid, self.descriptor.degree)?;
        let mut evolution = Evolution::new(space, self.problem.clone(), self.source.clone(), config)?;
        evolution.initialize()?;
        let report = evolution.run()?;
        self.evolution = Some(evolution);
        Ok(report)
    }

    pub fn evolution(&self) -> Option<&Evolution<P, S>> {
        self.evolution.as_ref()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn descriptor(&self) -> &FieldSolverDescriptor {
        &self.descriptor
    }
}

/// Extent of the shell around the horizon in a Schwarzschild validation run.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellDomain {
    pub refinement: u32,
    /// Outer radius in units of the horizon radius.
    pub outer_ratio: f64,
}

impl Default for ShellDomain {
    fn default() -> Self {
        Self {
            refinement: 0,
            outer_ratio: 4.0,
        }
    }
}

/// Vertices whose metric determinant differs from the exact value by less than this do not enter
/// the validation statistics.
pub const VALIDATION_THRESHOLD: f64 = 1e-5;

/// Comparison of an evolved metric with the exact isotropic Schwarzschild solution.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Root mean square of the determinant errors above the threshold.
    pub standard_deviation: f64,
    /// Mean absolute determinant error above the threshold.
    pub mean_absolute_error: f64,
    /// Number of vertices whose error exceeded the threshold.
    pub compared_points: usize,
    pub run: RunReport,
}

/// Evolves the isotropic Schwarzschild metric of a point mass on a shell outside its horizon and
/// measures the drift of the metric determinant.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SchwarzschildValidation {
    context: Context,
}

impl SchwarzschildValidation {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Runs the validation and returns the standard deviation of the determinant error.
    ///
    /// Any error is logged and reported as `0.0`.
    pub fn run(&self, delta: f64, steps: usize, domain: ShellDomain, accuracy: Accuracy, mass: f64) -> f64 {
        match self.try_run(delta, steps, domain, accuracy, mass) {
            Ok(report) => report.standard_deviation,
            Err(err) => {
                error!("Schwarzschild validation failed: {:?}", err);
                0.0
            }
        }
    }

    pub fn try_run(
        &self,
        delta: f64,
        steps: usize,
        domain: ShellDomain,
        accuracy: Accuracy,
        mass: f64,
    ) -> eyre::Result<ValidationReport> {
        info!(
            "Running Schwarzschild validation with delta {}, {} steps, refinement {}",
            delta, steps, domain.refinement
        );
        self.context.validate()?;
        let problem = IsotropicSchwarzschild::new(mass, Point3::origin(), self.context);
        let inner_radius = problem.horizon_radius();
        if !(inner_radius.is_finite() && inner_radius > 0.0) {
            return Err(ConfigError::NotPositive {
                name: "horizon radius",
                value: inner_radius,
            }
            .into());
        }

        let grid = GridDescriptor::Shell(ShellGrid {
            center: Point3::origin(),
            inner_radius,
            outer_radius: domain.outer_ratio * inner_radius,
            refinement: domain.refinement,
        });
        let space = build_space(&grid, ElementDegree::Quadratic).wrap_err("Failed to set up shell space")?;

        let config = EvolutionConfig {
            time_step: delta,
            steps,
            accuracy,
            context: self.context,
            parallel_assembly: true,
        };
        let mut evolution = Evolution::vacuum(space, problem, config)?;
        evolution.initialize().wrap_err("Failed to project initial data")?;
        let run = evolution.run().wrap_err("Evolution failed")?;

        let g11 = evolution.vertex_values(Field::Metric(Slot::S11));
        let g22 = evolution.vertex_values(Field::Metric(Slot::S22));
        let g33 = evolution.vertex_values(Field::Metric(Slot::S33));

        let mut squared = 0.0;
        let mut absolute = 0.0;
        let mut compared_points = 0;
        for (vertex, point) in evolution.space().mesh().vertices().iter().enumerate() {
            let prediction = g11[vertex] * g22[vertex] * g33[vertex];
            let error = prediction - problem.analytical_determinant(point);
            if error.abs() > VALIDATION_THRESHOLD {
                squared += error * error;
                absolute += error.abs();
                compared_points += 1;
            }
        }

        let (standard_deviation, mean_absolute_error) = if compared_points == 0 {
            (0.0, 0.0)
        } else {
            let total = compared_points as f64;
            ((squared / total).sqrt(), absolute / total)
        };
        info!(
            "Mean absolute error {}, standard deviation {} over {} vertices",
            mean_absolute_error, standard_deviation, compared_points
        );

        Ok(ValidationReport {
            standard_deviation,
            mean_absolute_error,
            compared_points,
            run,
        })
    }
}

/// Physical constants, grid and initial bodies of a [`ParticleSolver`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSolverDescriptor {
    pub context: Context,
    pub grid: GridDescriptor,
    pub particles: Vec<Particle>,
}

/// A live set of point masses advanced one post-Newtonian step per frame.
#[derive(Debug, Clone)]
pub struct ParticleSolver {
    stepper: PostNewtonian,
    grid: GridDescriptor,
    particles: Vec<Particle>,
    time: f64,
}

impl ParticleSolver {
    pub fn new(descriptor: ParticleSolverDescriptor) -> Result<Self, ConfigError> {
        descriptor.context.validate()?;
        descriptor.grid.validate()?;
        Ok(Self {
            stepper: PostNewtonian::new(descriptor.context),
            grid: descriptor.grid,
            particles: descriptor.particles,
            time: 0.0,
        })
    }

    /// Adds a particle and returns its index.
    pub fn add_particle(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn particle(&self, index: usize) -> Result<Particle, ParticleNotFound> {
        self.particles.get(index).copied().ok_or(ParticleNotFound {
            index,
            count: self.particles.len(),
        })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// The grid the particles live on.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advances all particles by one step of size `dt`.
    pub fn update(&mut self, dt: f64) -> Result<(), ConfigError> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(ConfigError::InvalidTimeStep(dt));
        }
        self.stepper.step(&mut self.particles, dt);
        self.time += dt;
        Ok(())
    }
}
