use dc_colloc::NodeScheme;
use dc_models::{LuteinLimits, LuteinObjective, LuteinParams};
use dc_project::schema::*;
use dc_project::{load_json, load_yaml, save_yaml, validate_problem};
use dc_sim::{IntegratorType, RolloutOptions};
use dc_solver::SolverOptions;
use dc_transcribe::{Bounds, Sense, TranscribeOptions};

fn lutein_problem() -> ProblemFile {
    ProblemFile {
        version: 1,
        name: "Lutein".to_string(),
        model: ModelDef::Lutein {
            params: LuteinParams::default(),
            limits: LuteinLimits {
                max_biomass: 3.0,
                ..LuteinLimits::default()
            },
        },
        objective: ObjectiveDef::Lutein(LuteinObjective::default()),
        horizon: 144.0,
        intervals: 6,
        collocation: CollocationDef {
            degree: 5,
            nodes: NodeScheme::Radau,
        },
        initial_state: vec![0.27, 765.0, 0.0],
        state: Bounds::new(
            vec![0.0, 0.0, 0.0],
            vec![100.0, 1e5, 100.0],
            vec![1.2, 800.0, 2.0],
        ),
        control: Bounds::new(vec![0.1, 100.0], vec![100.0, 1000.0], vec![30.0, 1000.0]),
        solver: SolverOptions::default().with_max_iterations(50),
        warm_start: Some(RolloutOptions {
            substeps: 10,
            integrator: IntegratorType::ForwardEuler,
        }),
        transcription: TranscribeOptions {
            terminal_path_row: false,
        },
    }
}

#[test]
fn roundtrip_yaml_lutein_problem() {
    let problem = lutein_problem();
    validate_problem(&problem).unwrap();

    let path = std::env::temp_dir().join("dc_project_roundtrip_lutein.yaml");
    save_yaml(&path, &problem).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(problem, loaded);
}

#[test]
fn roundtrip_yaml_custom_nodes() {
    let mut problem = lutein_problem();
    problem.collocation = CollocationDef {
        degree: 2,
        nodes: NodeScheme::Custom {
            points: vec![0.25, 1.0],
        },
    };
    problem.objective = ObjectiveDef::Terminal {
        weights: vec![0.0, 0.0, 1.0],
        sense: Sense::Maximize,
    };

    let path = std::env::temp_dir().join("dc_project_roundtrip_custom.yaml");
    save_yaml(&path, &problem).unwrap();
    assert_eq!(load_yaml(&path).unwrap(), problem);
}

#[test]
fn minimal_yaml_fills_defaults() {
    let yaml = r#"
version: 1
name: minimal
model:
  type: exponential_decay
  rate: 2.0
objective:
  type: terminal
  weights: [1.0]
horizon: 1.0
intervals: 3
initial_state: [1.0]
state:
  lower: [0.0]
  upper: [1.0]
  guess: [0.5]
"#;
    let problem: ProblemFile = serde_yaml::from_str(yaml).unwrap();
    validate_problem(&problem).unwrap();

    assert_eq!(problem.collocation, CollocationDef::default());
    assert_eq!(problem.control, Bounds::empty());
    assert_eq!(problem.solver, SolverOptions::default());
    assert!(problem.warm_start.is_none());
    assert!(problem.transcription.terminal_path_row);
    assert!(matches!(
        problem.objective,
        ObjectiveDef::Terminal {
            sense: Sense::Minimize,
            ..
        }
    ));
}

#[test]
fn json_problem_loads() {
    let json = r#"{
        "version": 1,
        "name": "decay",
        "model": { "type": "exponential_decay", "rate": 1.0 },
        "objective": { "type": "terminal", "weights": [1.0], "sense": "maximize" },
        "horizon": 1.0,
        "intervals": 1,
        "collocation": { "degree": 3, "nodes": { "type": "legendre" } },
        "initial_state": [1.0],
        "state": { "lower": [0.0], "upper": [2.0], "guess": [0.5] }
    }"#;
    let path = std::env::temp_dir().join("dc_project_decay.json");
    std::fs::write(&path, json).unwrap();

    let problem = load_json(&path).unwrap();
    assert_eq!(problem.collocation.nodes, NodeScheme::Legendre);
    assert_eq!(problem.model, ModelDef::ExponentialDecay { rate: 1.0 });
}

#[test]
fn invalid_file_not_saved() {
    let mut problem = lutein_problem();
    problem.state.guess.pop();
    let path = std::env::temp_dir().join("dc_project_invalid.yaml");
    let _ = std::fs::remove_file(&path);

    assert!(save_yaml(&path, &problem).is_err());
    assert!(!path.exists());
}
