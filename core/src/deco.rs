//! Bühlmann ZHL-16C tissue integration with gradient factors.
//!
//! The planner drives this module tick by tick: every simulated second of
//! ascent (and every minute of stop time) becomes an `add_segment` call, and
//! the returned tolerance (the minimum ambient pressure the loaded tissues
//! tolerate) is turned into a ceiling depth via `deco_allowed_depth`.
//! Trial ascents snapshot the state by cloning it and roll back by
//! reinstating the clone; the state is a plain value.

use crate::gas::GasMix;

// ============================================================================
// Physical Constants
// ============================================================================

/// Water vapour pressure in the lungs (bar), at 37°C.
const P_WATER_VAPOR: f64 = 0.0627;

/// Pressure increase per millimetre of depth (mbar/mm).
/// 1 atm / 10 msw = 1013.25 / 10_000.0
const MBAR_PER_MM: f64 = 0.101325;

/// One standard atmosphere in mbar.
const ATM_MBAR: f64 = 1013.25;

/// Default surface pressure (mbar) for plans that do not carry one.
pub const SURFACE_PRESSURE_MBAR: i32 = 1013;

/// Fraction of N2 in air.
const AIR_FN2: f64 = 0.7902;

/// Ceilings round up to multiples of this (mm) unless asked to be smooth.
const DECO_STEPSIZE: i32 = 3000;

// ============================================================================
// ZHL-16C Compartment Constants (Bühlmann / Baker)
// ============================================================================

/// Number of tissue compartments.
const NUM_COMPARTMENTS: usize = 16;

/// N2 half-times in minutes for compartments 1–16 (ZHL-16C).
const N2_HALF_TIMES: [f64; NUM_COMPARTMENTS] = [
    5.0, 8.0, 12.5, 18.5, 27.0, 38.3, 54.3, 77.0, 109.0, 146.0, 187.0, 239.0, 305.0, 390.0, 498.0,
    635.0,
];

/// He half-times in minutes for compartments 1–16 (ZHL-16C).
const HE_HALF_TIMES: [f64; NUM_COMPARTMENTS] = [
    1.88, 3.02, 4.72, 6.99, 10.21, 14.48, 20.53, 29.11, 41.20, 55.19, 70.69, 90.34, 115.29, 147.42,
    188.24, 240.03,
];

/// N2 'a' coefficients (bar) for ZHL-16C.
const A_N2: [f64; NUM_COMPARTMENTS] = [
    1.1696, 1.0000, 0.8618, 0.7562, 0.6200, 0.5043, 0.4410, 0.4000, 0.3750, 0.3500, 0.3295, 0.3065,
    0.2835, 0.2610, 0.2480, 0.2327,
];

/// N2 'b' coefficients (dimensionless) for ZHL-16C.
const B_N2: [f64; NUM_COMPARTMENTS] = [
    0.5578, 0.6514, 0.7222, 0.7825, 0.8126, 0.8434, 0.8693, 0.8910, 0.9092, 0.9222, 0.9319, 0.9403,
    0.9477, 0.9544, 0.9602, 0.9653,
];

/// He 'a' coefficients (bar) for ZHL-16C.
const A_HE: [f64; NUM_COMPARTMENTS] = [
    1.6189, 1.3830, 1.1919, 1.0458, 0.9220, 0.8205, 0.7305, 0.6502, 0.5950, 0.5545, 0.5333, 0.5189,
    0.5181, 0.5176, 0.5172, 0.5119,
];

/// He 'b' coefficients (dimensionless) for ZHL-16C.
const B_HE: [f64; NUM_COMPARTMENTS] = [
    0.4770, 0.5747, 0.6527, 0.7223, 0.7582, 0.7957, 0.8279, 0.8553, 0.8757, 0.8903, 0.8997, 0.9073,
    0.9122, 0.9171, 0.9217, 0.9267,
];

// ============================================================================
// Pressure Conversions
// ============================================================================

/// Ambient pressure (mbar) at `depth_mm`.
pub fn depth_to_mbar(depth_mm: i32, surface_pressure_mbar: i32) -> i32 {
    surface_pressure_mbar + (f64::from(depth_mm) * MBAR_PER_MM) as i32
}

/// Ambient pressure (bar) at `depth_mm`.
pub fn depth_to_bar(depth_mm: i32, surface_pressure_mbar: i32) -> f64 {
    f64::from(depth_to_mbar(depth_mm, surface_pressure_mbar)) / 1000.0
}

/// Ambient pressure at `depth_mm` in standard atmospheres.
pub fn depth_to_atm(depth_mm: i32, surface_pressure_mbar: i32) -> f64 {
    f64::from(depth_to_mbar(depth_mm, surface_pressure_mbar)) / ATM_MBAR
}

/// Depth (mm) equivalent to a pressure difference of `mbar`.
pub fn rel_mbar_to_depth(mbar: i32) -> i32 {
    (f64::from(mbar) / MBAR_PER_MM) as i32
}

// ============================================================================
// Gradient Factors
// ============================================================================

/// Gradient-factor settings for a planning pass, in percent.
///
/// GF-high scales the permitted supersaturation at the surface, GF-low at
/// the deep reference; in between the permitted value follows the straight
/// line between the two scaled M-value points (Baker's method).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GradientFactors {
    pub low: i32,
    pub high: i32,
    /// Pin the GF-low reference to the deepest point reached instead of the
    /// deepest computed ceiling.
    pub low_at_maxdepth: bool,
}

impl GradientFactors {
    pub fn new(low: i32, high: i32, low_at_maxdepth: bool) -> Self {
        GradientFactors {
            low,
            high,
            low_at_maxdepth,
        }
    }
}

// ============================================================================
// Tissue State
// ============================================================================

/// State of the 16 tissue compartments plus the gradient-factor bookkeeping
/// for one planning pass.
#[derive(Clone, Debug, PartialEq)]
pub struct DecoState {
    /// N2 partial pressure in each compartment (bar).
    p_n2: [f64; NUM_COMPARTMENTS],
    /// He partial pressure in each compartment (bar).
    p_he: [f64; NUM_COMPARTMENTS],
    gf_low: f64,
    gf_high: f64,
    low_at_maxdepth: bool,
    /// Surface pressure (bar).
    surface: f64,
    /// Ambient pressure (bar) at which GF-low applies.
    gf_low_pressure: f64,
}

impl DecoState {
    /// Tissue state at surface equilibrium, breathing air.
    pub fn at_surface(surface_pressure_mbar: i32, gf: GradientFactors) -> Self {
        let surface = f64::from(surface_pressure_mbar) / 1000.0;
        let p_n2_surface = (surface - P_WATER_VAPOR) * AIR_FN2;
        DecoState {
            p_n2: [p_n2_surface; NUM_COMPARTMENTS],
            p_he: [0.0; NUM_COMPARTMENTS],
            gf_low: f64::from(gf.low) / 100.0,
            gf_high: f64::from(gf.high) / 100.0,
            low_at_maxdepth: gf.low_at_maxdepth,
            surface,
            gf_low_pressure: surface,
        }
    }

    /// Advance every compartment through `duration_s` seconds at constant
    /// ambient pressure on the given mix, and return the updated tolerance.
    ///
    /// An open-circuit segment breathes the mix as-is. With a rebreather
    /// setpoint (`po2_mbar > 0`) the inspired inert pressure is what remains
    /// of the ambient pressure once the setpoint is taken out, split between
    /// N2 and He by the mix's inert ratio.
    pub fn add_segment(
        &mut self,
        ambient_bar: f64,
        gas: &GasMix,
        duration_s: i32,
        po2_mbar: i32,
    ) -> f64 {
        if duration_s > 0 {
            let usable = (ambient_bar - P_WATER_VAPOR).max(0.0);
            let (p_inspired_n2, p_inspired_he) = if po2_mbar > 0 {
                let po2 = (f64::from(po2_mbar) / 1000.0).min(usable);
                let inert = usable - po2;
                let fn2 = gas.fn2();
                let fhe = gas.fhe();
                if fn2 + fhe > 0.0 {
                    (inert * fn2 / (fn2 + fhe), inert * fhe / (fn2 + fhe))
                } else {
                    (inert, 0.0)
                }
            } else {
                (usable * gas.fn2(), usable * gas.fhe())
            };

            let dt_min = f64::from(duration_s) / 60.0;
            for i in 0..NUM_COMPARTMENTS {
                let f_n2 = 1.0 - (-dt_min * std::f64::consts::LN_2 / N2_HALF_TIMES[i]).exp();
                self.p_n2[i] += (p_inspired_n2 - self.p_n2[i]) * f_n2;

                let f_he = 1.0 - (-dt_min * std::f64::consts::LN_2 / HE_HALF_TIMES[i]).exp();
                self.p_he[i] += (p_inspired_he - self.p_he[i]) * f_he;
            }

            if self.low_at_maxdepth && ambient_bar > self.gf_low_pressure {
                self.gf_low_pressure = ambient_bar;
            }
        }
        self.tolerance()
    }

    /// Minimum tolerated ambient pressure (bar) over all compartments.
    pub fn tolerance(&mut self) -> f64 {
        if !self.low_at_maxdepth {
            // The GF-low anchor follows the deepest ceiling seen so far.
            let mut lowest_ceiling = 0.0_f64;
            for i in 0..NUM_COMPARTMENTS {
                let ceiling = self.compartment_ceiling(i, self.gf_low);
                if ceiling > lowest_ceiling {
                    lowest_ceiling = ceiling;
                }
            }
            if lowest_ceiling > self.gf_low_pressure {
                self.gf_low_pressure = lowest_ceiling;
            }
        }

        let mut limit = 0.0_f64;
        for i in 0..NUM_COMPARTMENTS {
            let tolerated = self.compartment_tolerance(i);
            if tolerated > limit {
                limit = tolerated;
            }
        }
        limit
    }

    /// Inert-gas loading, weighted a/b coefficients for compartment `i`.
    fn coefficients(&self, i: usize) -> (f64, f64, f64) {
        let p_total = self.p_n2[i] + self.p_he[i];
        let (a, b) = if p_total > 1e-10 {
            (
                (A_N2[i] * self.p_n2[i] + A_HE[i] * self.p_he[i]) / p_total,
                (B_N2[i] * self.p_n2[i] + B_HE[i] * self.p_he[i]) / p_total,
            )
        } else {
            (A_N2[i], B_N2[i])
        };
        (p_total, a, b)
    }

    /// Ambient pressure below which compartment `i` exceeds its M-value
    /// scaled by a constant gradient factor.
    fn compartment_ceiling(&self, i: usize, gf: f64) -> f64 {
        let (p_total, a, b) = self.coefficients(i);
        (p_total - a * gf) * b / (gf - gf * b + b)
    }

    /// Tolerated ambient pressure for compartment `i`, with the gradient
    /// factor interpolated between GF-high at the surface and GF-low at the
    /// current reference pressure.
    fn compartment_tolerance(&self, i: usize) -> f64 {
        let (p_total, a, b) = self.coefficients(i);
        let p_surf = self.surface;
        let p_low = self.gf_low_pressure;

        if p_low - p_surf < 1e-6 {
            return self.compartment_ceiling(i, self.gf_high);
        }

        // Permitted tissue pressure at the two ends of the GF line.
        let m_surf = p_surf + self.gf_high * (a + p_surf / b - p_surf);
        let m_low = p_low + self.gf_low * (a + p_low / b - p_low);
        if m_low <= m_surf {
            return self.compartment_ceiling(i, self.gf_high);
        }
        p_surf + (p_total - m_surf) * (p_low - p_surf) / (m_low - m_surf)
    }
}

/// Depth (mm) of the ceiling implied by a tissue tolerance; 0 when the
/// surface is tolerated. `smooth` returns the exact depth, otherwise it is
/// rounded up to the next stop increment.
pub fn deco_allowed_depth(tolerance_bar: f64, surface_pressure_bar: f64, smooth: bool) -> i32 {
    let pressure_delta = tolerance_bar - surface_pressure_bar;
    if pressure_delta <= 0.0 {
        return 0;
    }
    let depth = rel_mbar_to_depth((pressure_delta * 1000.0) as i32);
    if smooth {
        depth
    } else {
        (depth + DECO_STEPSIZE - 1) / DECO_STEPSIZE * DECO_STEPSIZE
    }
}

// ============================================================================
// Tests
// ============================================================================
