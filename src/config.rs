//! Descriptors for physical constants, grids and solver accuracy.
//!
//! All descriptors are plain data that can be deserialized by the host application. Each carries a
//! `validate` method that is called before any mesh or matrix is built.
use crate::error::ConfigError;
use crate::mesh::procedural::{create_box_mesh, create_shell_mesh};
use crate::mesh::HexMesh;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Largest accepted uniform refinement level of a grid.
pub const MAX_REFINEMENT: u32 = 7;

fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

fn check_refinement(refinement: u32) -> Result<(), ConfigError> {
    if refinement > MAX_REFINEMENT {
        Err(ConfigError::RefinementTooLarge {
            refinement,
            max: MAX_REFINEMENT,
        })
    } else {
        Ok(())
    }
}

/// Physical constants in the unit system of the simulation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    pub speed_of_light: f64,
    pub gravitational_constant: f64,
}

impl Default for Context {
    /// SI units.
    fn default() -> Self {
        Units::default().context()
    }
}

impl Context {
    /// Geometrized units, `c = G = 1`.
    pub fn geometrized() -> Self {
        Self {
            speed_of_light: 1.0,
            gravitational_constant: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("speed of light", self.speed_of_light)?;
        check_positive("gravitational constant", self.gravitational_constant)
    }
}

impl From<Units> for Context {
    fn from(units: Units) -> Self {
        units.context()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Length {
    #[default]
    Meter,
    Kilometer,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Time {
    #[default]
    Second,
    Day,
    Year,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mass {
    #[default]
    Kilogram,
    SolarMass,
}

const SPEED_OF_LIGHT_SI: f64 = 299_792_458.0;
const GRAVITATIONAL_CONSTANT_SI: f64 = 6.67408e-11;
const SOLAR_MASS_KG: f64 = 1.989e30;
const SECONDS_PER_DAY: f64 = 3600.0 * 24.0;

impl Length {
    /// Length of one unit in meters.
    pub fn meters(&self) -> f64 {
        match self {
            Length::Meter => 1.0,
            Length::Kilometer => 1000.0,
        }
    }
}

impl Time {
    /// Duration of one unit in seconds.
    pub fn seconds(&self) -> f64 {
        match self {
            Time::Second => 1.0,
            Time::Day => SECONDS_PER_DAY,
            Time::Year => SECONDS_PER_DAY * 365.0,
        }
    }
}

impl Mass {
    /// Mass of one unit in kilograms.
    pub fn kilograms(&self) -> f64 {
        match self {
            Mass::Kilogram => 1.0,
            Mass::SolarMass => SOLAR_MASS_KG,
        }
    }
}

/// Unit system for lengths, times and masses.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    pub length: Length,
    pub time: Time,
    pub mass: Mass,
}

impl Units {
    pub fn speed_of_light(&self) -> f64 {
        SPEED_OF_LIGHT_SI * self.time.seconds() / self.length.meters()
    }

    /// `G` in `length³ / (mass time²)`.
    pub fn gravitational_constant(&self) -> f64 {
        let length = self.length.meters();
        let time = self.time.seconds();
        GRAVITATIONAL_CONSTANT_SI * self.mass.kilograms() * time * time / (length * length * length)
    }

    pub fn context(&self) -> Context {
        Context {
            speed_of_light: self.speed_of_light(),
            gravitational_constant: self.gravitational_constant(),
        }
    }
}

/// Iteration cap and absolute residual tolerance of one conjugate gradient solve.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveAccuracy {
    pub max_iterations: usize,
    pub residual: f64,
}

impl Default for SolveAccuracy {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            residual: 1e-12,
        }
    }
}

impl SolveAccuracy {
    pub fn new(max_iterations: usize, residual: f64) -> Self {
        Self {
            max_iterations,
            residual,
        }
    }

    pub fn validate(&self, equation: &'static str) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations { equation });
        }
        check_positive("residual tolerance", self.residual)
    }
}

/// Solver accuracy of the three kinds of equations.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Accuracy {
    pub lapse: SolveAccuracy,
    pub metric: SolveAccuracy,
    pub extrinsic: SolveAccuracy,
}

impl Accuracy {
    /// The same accuracy for every equation.
    pub fn uniform(accuracy: SolveAccuracy) -> Self {
        Self {
            lapse: accuracy,
            metric: accuracy,
            extrinsic: accuracy,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lapse.validate("lapse")?;
        self.metric.validate("metric")?;
        self.extrinsic.validate("extrinsic curvature")
    }
}

/// An axis-aligned box subdivided into `2^refinement` cells per axis.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeGrid {
    pub center: Point3<f64>,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub refinement: u32,
}

impl Default for CubeGrid {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            width: 1.0,
            height: 1.0,
            depth: 1.0,
            refinement: 1,
        }
    }
}

/// A spherical shell between two radii, meshed as a cube-sphere.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellGrid {
    pub center: Point3<f64>,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub refinement: u32,
}

/// The kind and extents of the simulation grid.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum GridDescriptor {
    Cube(CubeGrid),
    Shell(ShellGrid),
}

impl Default for GridDescriptor {
    fn default() -> Self {
        GridDescriptor::Cube(CubeGrid::default())
    }
}

impl GridDescriptor {
    pub fn refinement(&self) -> u32 {
        match self {
            GridDescriptor::Cube(cube) => cube.refinement,
            GridDescriptor::Shell(shell) => shell.refinement,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            GridDescriptor::Cube(cube) => {
                check_positive("cube width", cube.width)?;
                check_positive("cube height", cube.height)?;
                check_positive("cube depth", cube.depth)?;
                check_refinement(cube.refinement)
            }
            GridDescriptor::Shell(shell) => {
                check_positive("shell inner radius", shell.inner_radius)?;
                check_positive("shell outer radius", shell.outer_radius)?;
                if shell.inner_radius >= shell.outer_radius {
                    return Err(ConfigError::InvalidShell {
                        inner_radius: shell.inner_radius,
                        outer_radius: shell.outer_radius,
                    });
                }
                check_refinement(shell.refinement)
            }
        }
    }

    /// Validates the descriptor and builds the mesh it describes.
    pub fn build_mesh(&self) -> Result<HexMesh, ConfigError> {
        self.validate()?;
        let mesh = match self {
            GridDescriptor::Cube(cube) => {
                let half = Vector3::new(cube.width, cube.height, cube.depth) / 2.0;
                let cells = 1 << cube.refinement;
                create_box_mesh(&(cube.center - half), &(cube.center + half), [cells; 3])
            }
            GridDescriptor::Shell(shell) => create_shell_mesh(
                &shell.center,
                shell.inner_radius,
                shell.outer_radius,
                shell.refinement,
            ),
        };
        Ok(mesh)
    }
}

/// Time stepping parameters of an evolution run.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub time_step: f64,
    pub steps: usize,
    pub accuracy: Accuracy,
    pub context: Context,
    /// Compute cell contributions on the rayon thread pool.
    pub parallel_assembly: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            time_step: 1e-3,
            steps: 1,
            accuracy: Accuracy::default(),
            context: Context::default(),
            parallel_assembly: true,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_step.is_finite() && self.time_step >= 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.time_step));
        }
        self.context.validate()?;
        self.accuracy.validate()
    }
}
