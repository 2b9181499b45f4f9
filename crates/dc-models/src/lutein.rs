//! Fed-batch photobioreactor producing lutein.
//!
//! States: biomass `Cx` (g/L), nitrate `Cn` (mg/L), lutein `Cl` (mg/L).
//! Controls: nitrate inflow `Fnin` (mg/h) and incident light `I0` (uE).
//!
//! Light decays exponentially into the culture from both faces of a panel of
//! depth `L`; growth and lutein synthesis follow Haldane-type light kinetics
//! averaged over the depth with the trapezoid rule.

use dc_core::{DcError, DcResult, NameMap, Real};
use dc_transcribe::{Dynamics, Evaluation, ObjectivePolicy, Sense, StageTerm};
use serde::{Deserialize, Serialize};

pub const BIOMASS: usize = 0;
pub const NITRATE: usize = 1;
pub const LUTEIN: usize = 2;

pub const FEED: usize = 0;
pub const LIGHT: usize = 1;

pub const STATE_NAMES: [&str; 3] = ["Cx", "Cn", "Cl"];
pub const CONTROL_NAMES: [&str; 2] = ["Fnin", "I0"];

/// Kinetic parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuteinParams {
    /// `u_m`, 1/h
    pub max_growth_rate: Real,
    /// `K_N`, mg/L
    pub nitrate_half_saturation: Real,
    /// `u_d`, 1/h
    pub death_rate: Real,
    /// `Y_nx`, mg nitrate per g biomass
    pub nitrate_yield: Real,
    /// `k_m`
    pub max_lutein_rate: Real,
    /// `Kd`
    pub lutein_consumption: Real,
    /// `K_NL`, mg/L
    pub lutein_nitrate_saturation: Real,
    /// `Ks`, uE
    pub growth_light_saturation: Real,
    /// `Ki`, uE
    pub growth_light_inhibition: Real,
    /// `Ksl`, uE
    pub lutein_light_saturation: Real,
    /// `Kil`, uE
    pub lutein_light_inhibition: Real,
    /// `tau`, light absorption per unit biomass
    pub biomass_absorption: Real,
    /// `Ka`, background absorption
    pub background_absorption: Real,
    /// `L`, panel depth in m
    pub depth: Real,
    /// Depths sampled for the trapezoid rule, both faces included
    pub light_points: usize,
}

impl Default for LuteinParams {
    fn default() -> Self {
        Self {
            max_growth_rate: 0.152,
            nitrate_half_saturation: 30.0,
            death_rate: 5.95e-3,
            nitrate_yield: 305.0,
            max_lutein_rate: 0.35,
            lutein_consumption: 3.71e-3,
            lutein_nitrate_saturation: 10.0,
            growth_light_saturation: 142.8,
            growth_light_inhibition: 214.2,
            lutein_light_saturation: 320.6,
            lutein_light_inhibition: 480.9,
            biomass_absorption: 120.0,
            background_absorption: 0.0,
            depth: 0.084,
            light_points: 11,
        }
    }
}

impl LuteinParams {
    pub fn validate(&self) -> DcResult<()> {
        let positive = [
            self.max_growth_rate,
            self.nitrate_half_saturation,
            self.nitrate_yield,
            self.lutein_nitrate_saturation,
            self.growth_light_saturation,
            self.growth_light_inhibition,
            self.lutein_light_saturation,
            self.lutein_light_inhibition,
            self.depth,
        ];
        if positive.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(DcError::InvalidArg {
                what: "lutein saturation, yield and depth parameters must be positive",
            });
        }
        let non_negative = [
            self.death_rate,
            self.max_lutein_rate,
            self.lutein_consumption,
            self.biomass_absorption,
            self.background_absorption,
        ];
        if non_negative.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return Err(DcError::InvalidArg {
                what: "lutein rate and absorption parameters must be non-negative",
            });
        }
        if self.light_points < 2 {
            return Err(DcError::InvalidArg {
                what: "light_points must be at least 2",
            });
        }
        Ok(())
    }
}

/// Operating limits enforced as path constraints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuteinLimits {
    /// `Cx <= max_biomass`
    pub max_biomass: Real,
    /// `Cn >= min_nitrate`
    pub min_nitrate: Real,
    /// `Cl <= max_lutein_ratio * Cx`
    pub max_lutein_ratio: Real,
}

impl Default for LuteinLimits {
    fn default() -> Self {
        Self {
            max_biomass: 2.6,
            min_nitrate: 150.0,
            max_lutein_ratio: 1.67,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LuteinModel {
    params: LuteinParams,
    limits: LuteinLimits,
}

impl LuteinModel {
    pub fn new(params: LuteinParams, limits: LuteinLimits) -> DcResult<Self> {
        params.validate()?;
        Ok(Self { params, limits })
    }

    pub fn params(&self) -> &LuteinParams {
        &self.params
    }

    pub fn limits(&self) -> &LuteinLimits {
        &self.limits
    }

    /// Depth-averaged light factors `(growth, lutein)` for biomass `cx` under light `i0`.
    pub fn light_factors(&self, cx: Real, i0: Real) -> (Real, Real) {
        let p = &self.params;
        let n = p.light_points;
        let attenuation = p.biomass_absorption * cx + p.background_absorption;
        let haldane = |i: Real, ks: Real, ki: Real| i / (i + ks + i * i / ki);

        let mut growth = 0.0;
        let mut lutein = 0.0;
        for point in 0..n {
            let z = point as Real * p.depth / (n - 1) as Real;
            let iz = i0 * ((-attenuation * z).exp() + (-attenuation * (p.depth - z)).exp());
            let weight = if point == 0 || point == n - 1 { 1.0 } else { 2.0 };
            growth += weight
                * haldane(
                    iz,
                    p.growth_light_saturation,
                    p.growth_light_inhibition,
                );
            lutein += weight
                * haldane(
                    iz,
                    p.lutein_light_saturation,
                    p.lutein_light_inhibition,
                );
        }
        let scale = 1.0 / (2.0 * (n - 1) as Real);
        (growth * scale, lutein * scale)
    }
}

impl Dynamics for LuteinModel {
    fn state_dim(&self) -> usize {
        3
    }

    fn control_dim(&self) -> usize {
        2
    }

    fn path_dim(&self) -> usize {
        3
    }

    fn eval(&self, state: &[Real], control: &[Real]) -> DcResult<Evaluation> {
        let p = &self.params;
        let (cx, cn, cl) = (state[BIOMASS], state[NITRATE], state[LUTEIN]);
        let (feed, light) = (control[FEED], control[LIGHT]);

        let (growth_light, lutein_light) = self.light_factors(cx, light);
        let growth = p.max_growth_rate * growth_light * cx * cn / (cn + p.nitrate_half_saturation);
        let synthesis =
            p.max_lutein_rate * lutein_light * cn / (cn + p.lutein_nitrate_saturation) * cx;

        let derivative = vec![
            growth - p.death_rate * cx,
            -p.nitrate_yield * growth + feed,
            synthesis - p.lutein_consumption * cl * cx,
        ];
        let path = vec![
            cx - self.limits.max_biomass,
            self.limits.min_nitrate - cn,
            cl - self.limits.max_lutein_ratio * cx,
        ];
        Ok(Evaluation::new(derivative, path))
    }

    fn state_names(&self) -> NameMap {
        NameMap::from_static(&STATE_NAMES)
    }

    fn control_names(&self) -> NameMap {
        NameMap::from_static(&CONTROL_NAMES)
    }
}

/// Terminal lutein reward with a penalty on control moves.
///
/// `lutein_weight * Cl(T) - nitrate_weight * Cn(T)` minus, for every interval
/// after the first, `(dFnin * feed_move_scale)^2 + (dI0 * light_move_scale)^2`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuteinObjective {
    pub lutein_weight: Real,
    pub nitrate_weight: Real,
    pub feed_move_scale: Real,
    pub light_move_scale: Real,
}

impl Default for LuteinObjective {
    fn default() -> Self {
        Self {
            lutein_weight: 4.0,
            nitrate_weight: 1e-3,
            feed_move_scale: 0.4,
            light_move_scale: 0.009,
        }
    }
}

impl ObjectivePolicy for LuteinObjective {
    fn sense(&self) -> Sense {
        Sense::Maximize
    }

    fn stage(&self, term: &StageTerm<'_>) -> DcResult<Real> {
        let mut value = 0.0;
        if let Some(previous) = term.previous_control {
            let feed_move = (term.control[FEED] - previous[FEED]) * self.feed_move_scale;
            let light_move = (term.control[LIGHT] - previous[LIGHT]) * self.light_move_scale;
            value -= feed_move * feed_move + light_move * light_move;
        }
        if term.is_last() {
            value += self.lutein_weight * term.state[LUTEIN]
                - self.nitrate_weight * term.state[NITRATE];
        }
        Ok(value)
    }
}
