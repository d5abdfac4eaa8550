use nalgebra::Point3;
use spacetime::config::{
    Accuracy, Context, CubeGrid, EvolutionConfig, GridDescriptor, Length, Mass, ShellGrid, SolveAccuracy, Time,
    Units, MAX_REFINEMENT,
};
use spacetime::error::ConfigError;
use spacetime::nbody::Particle;
use spacetime::solver::ParticleSolverDescriptor;

fn relative_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * b.abs()
}

#[test]
fn si_units_by_default() {
    let context = Context::default();
    assert_eq!(context.speed_of_light, 299_792_458.0);
    assert_eq!(context.gravitational_constant, 6.67408e-11);
    assert_eq!(Units::default().context(), context);
    assert!(context.validate().is_ok());
}

#[test]
fn unit_conversion() {
    let km = Units {
        length: Length::Kilometer,
        ..Units::default()
    };
    assert!(relative_eq(km.speed_of_light(), 299_792.458));
    assert!(relative_eq(km.gravitational_constant(), 6.67408e-20));

    let solar = Units {
        mass: Mass::SolarMass,
        ..Units::default()
    };
    assert!(relative_eq(solar.gravitational_constant(), 6.67408e-11 * 1.989e30));
    assert_eq!(solar.speed_of_light(), 299_792_458.0);

    let days = Units {
        time: Time::Day,
        ..Units::default()
    };
    assert!(relative_eq(days.speed_of_light(), 299_792_458.0 * 86400.0));
    assert!(relative_eq(days.gravitational_constant(), 6.67408e-11 * 86400.0 * 86400.0));
    assert!(relative_eq(Time::Year.seconds(), 365.0 * 86400.0));

    let context = Context::from(km);
    assert_eq!(context.speed_of_light, km.speed_of_light());
}

#[test]
fn context_validation() {
    assert!(Context::geometrized().validate().is_ok());
    let invalid = Context {
        speed_of_light: 1.0,
        gravitational_constant: f64::INFINITY,
    };
    assert!(matches!(
        invalid.validate(),
        Err(ConfigError::NotPositive {
            name: "gravitational constant",
            ..
        })
    ));
}

#[test]
fn grid_validation() {
    assert!(GridDescriptor::default().validate().is_ok());

    let flat = GridDescriptor::Cube(CubeGrid {
        depth: 0.0,
        ..CubeGrid::default()
    });
    assert_eq!(
        flat.validate(),
        Err(ConfigError::NotPositive {
            name: "cube depth",
            value: 0.0
        })
    );

    let fine = GridDescriptor::Cube(CubeGrid {
        refinement: MAX_REFINEMENT + 1,
        ..CubeGrid::default()
    });
    assert_eq!(
        fine.validate(),
        Err(ConfigError::RefinementTooLarge {
            refinement: MAX_REFINEMENT + 1,
            max: MAX_REFINEMENT
        })
    );
    assert_eq!(fine.refinement(), MAX_REFINEMENT + 1);

    let shell = GridDescriptor::Shell(ShellGrid {
        center: Point3::origin(),
        inner_radius: 1.0,
        outer_radius: 1.0,
        refinement: 0,
    });
    assert_eq!(
        shell.validate(),
        Err(ConfigError::InvalidShell {
            inner_radius: 1.0,
            outer_radius: 1.0
        })
    );
    assert!(shell.build_mesh().is_err());
}

#[test]
fn grid_descriptors_build_meshes() {
    let cube = GridDescriptor::Cube(CubeGrid {
        center: Point3::new(1.0, 1.0, 1.0),
        width: 2.0,
        height: 4.0,
        depth: 6.0,
        refinement: 1,
    });
    let mesh = cube.build_mesh().unwrap();
    assert_eq!(mesh.num_cells(), 8);
    assert_eq!(mesh.vertices().len(), 27);
    assert!(mesh.vertices().contains(&Point3::new(0.0, -1.0, -2.0)));
    assert!(mesh.vertices().contains(&Point3::new(2.0, 3.0, 4.0)));

    let shell = GridDescriptor::Shell(ShellGrid {
        center: Point3::origin(),
        inner_radius: 1.0,
        outer_radius: 3.0,
        refinement: 1,
    });
    let mesh = shell.build_mesh().unwrap();
    assert_eq!(mesh.num_cells(), 48);
    for vertex in mesh.vertices() {
        let r = vertex.coords.norm();
        assert!(r > 1.0 - 1e-12 && r < 3.0 + 1e-12);
    }
}

#[test]
fn accuracy_validation() {
    assert!(Accuracy::default().validate().is_ok());
    assert_eq!(SolveAccuracy::default(), SolveAccuracy::new(100, 1e-12));

    let accuracy = Accuracy {
        extrinsic: SolveAccuracy::new(0, 1e-12),
        ..Accuracy::default()
    };
    assert_eq!(
        accuracy.validate(),
        Err(ConfigError::ZeroIterations {
            equation: "extrinsic curvature"
        })
    );

    let accuracy = Accuracy::uniform(SolveAccuracy::new(10, -1.0));
    assert_eq!(
        accuracy.validate(),
        Err(ConfigError::NotPositive {
            name: "residual tolerance",
            value: -1.0
        })
    );
}

#[test]
fn evolution_config_validation() {
    assert!(EvolutionConfig::default().validate().is_ok());
    let zero_step = EvolutionConfig {
        time_step: 0.0,
        ..EvolutionConfig::default()
    };
    assert!(zero_step.validate().is_ok());

    for time_step in [-1e-3, f64::INFINITY] {
        let config = EvolutionConfig {
            time_step,
            ..EvolutionConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeStep(time_step)));
    }

    let config = EvolutionConfig {
        context: Context {
            speed_of_light: -1.0,
            gravitational_constant: 1.0,
        },
        ..EvolutionConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::NotPositive { .. })));
}

#[test]
fn error_messages() {
    let err = ConfigError::InvalidShell {
        inner_radius: 2.0,
        outer_radius: 1.0,
    };
    assert_eq!(err.to_string(), "Shell inner radius 2 must be smaller than outer radius 1");
    assert_eq!(
        ConfigError::InvalidTimeStep(-1.0).to_string(),
        "Time step must be non-negative and finite, got -1"
    );
}

#[test]
fn descriptors_deserialize_from_json() {
    let config: EvolutionConfig = serde_json::from_str(
        r#"{
            "time_step": 0.01,
            "steps": 5,
            "accuracy": { "lapse": { "max_iterations": 500 } },
            "context": { "speed_of_light": 1.0, "gravitational_constant": 1.0 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.time_step, 0.01);
    assert_eq!(config.steps, 5);
    assert_eq!(config.accuracy.lapse, SolveAccuracy::new(500, 1e-12));
    assert_eq!(config.accuracy.metric, SolveAccuracy::default());
    assert_eq!(config.context, Context::geometrized());
    assert!(config.parallel_assembly);

    let grid: GridDescriptor = serde_json::from_str(
        r#"{ "Shell": { "center": [0.0, 0.0, 0.0], "inner_radius": 1.0, "outer_radius": 2.0, "refinement": 2 } }"#,
    )
    .unwrap();
    assert_eq!(grid.refinement(), 2);
    assert!(grid.validate().is_ok());

    let units: Units = serde_json::from_str(r#"{ "length": "Kilometer", "mass": "SolarMass" }"#).unwrap();
    assert_eq!(units.time, Time::Second);
    assert_eq!(units.mass, Mass::SolarMass);
}

#[test]
fn particle_descriptor_round_trip() {
    let descriptor = ParticleSolverDescriptor {
        context: Context::geometrized(),
        grid: GridDescriptor::Shell(ShellGrid {
            center: Point3::new(0.0, 0.0, 1.0),
            inner_radius: 1.0,
            outer_radius: 5.0,
            refinement: 1,
        }),
        particles: vec![Particle::at_rest(Point3::new(1.0, 2.0, 3.0), 4.0)],
    };
    let json = serde_json::to_string(&descriptor).unwrap();
    let restored: ParticleSolverDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, descriptor);
}
