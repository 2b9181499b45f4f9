//! Problem file schema.

use dc_colloc::NodeScheme;
use dc_models::{LuteinLimits, LuteinObjective, LuteinParams};
use dc_sim::RolloutOptions;
use dc_solver::SolverOptions;
use dc_transcribe::{Bounds, Sense, TranscribeOptions};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProblemFile {
    pub version: u32,
    pub name: String,
    pub model: ModelDef,
    pub objective: ObjectiveDef,
    /// Final time `T`
    pub horizon: f64,
    /// Number of equal intervals `N`
    pub intervals: usize,
    #[serde(default)]
    pub collocation: CollocationDef,
    pub initial_state: Vec<f64>,
    /// Shared by collocation and end states of every interval
    pub state: Bounds,
    #[serde(default = "Bounds::empty")]
    pub control: Bounds,
    #[serde(default)]
    pub solver: SolverOptions,
    /// Replace the state guesses by a rollout of the control guess before solving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warm_start: Option<RolloutOptions>,
    #[serde(default)]
    pub transcription: TranscribeOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CollocationDef {
    pub degree: usize,
    pub nodes: NodeScheme,
}

impl Default for CollocationDef {
    fn default() -> Self {
        Self {
            degree: 3,
            nodes: NodeScheme::Radau,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelDef {
    Lutein {
        #[serde(default)]
        params: LuteinParams,
        #[serde(default)]
        limits: LuteinLimits,
    },
    ExponentialDecay {
        rate: f64,
    },
}

impl ModelDef {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelDef::Lutein { .. } => "lutein",
            ModelDef::ExponentialDecay { .. } => "exponential_decay",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectiveDef {
    /// Terminal lutein reward with control-move penalty
    Lutein(LuteinObjective),
    /// `weights . X_N`
    Terminal {
        weights: Vec<f64>,
        #[serde(default)]
        sense: Sense,
    },
}
