//! Cylinders and gas accounting.

use serde::{Deserialize, Serialize};

use crate::deco::depth_to_atm;
use crate::gas::{GasMix, O2_IN_AIR};

/// Upper bound on the cylinders a single dive can carry.
pub const MAX_CYLINDERS: usize = 8;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CylinderType {
    pub description: String,
    /// Internal volume in ml.
    pub size_ml: i32,
    /// Working pressure in mbar.
    pub workingpressure_mbar: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cylinder {
    pub gas: GasMix,
    pub kind: CylinderType,
    /// Fill pressure at the start of the dive (mbar).
    pub start_mbar: i32,
    /// Remaining pressure as the plan draws gas down (mbar).
    pub end_mbar: i32,
    /// Depth at which this cylinder becomes usable, i.e. its MOD (mm).
    pub depth_mm: i32,
    /// Atmospheric-equivalent gas drawn from this cylinder (ml).
    pub gas_used_ml: i32,
}

impl Cylinder {
    /// A slot with nothing in it.
    pub fn is_empty(&self) -> bool {
        self.kind.size_ml == 0
            && self.kind.workingpressure_mbar == 0
            && self.start_mbar == 0
            && self.end_mbar == 0
            && self.gas.is_null()
    }

    /// Forget any consumption and return to the start-of-dive fill.
    pub fn reset(&mut self) {
        self.end_mbar = self.start_mbar;
        self.gas_used_ml = 0;
    }

    /// Account one segment of breathing from this cylinder.
    ///
    /// `sac_ml_min` is measured at the surface; the amount actually drawn
    /// scales with the ambient pressure at the segment's mean depth.
    /// Pressure tracking needs a known internal volume; without one only
    /// `gas_used_ml` moves. Does nothing for an empty slot.
    pub fn consume(
        &mut self,
        old_depth_mm: i32,
        new_depth_mm: i32,
        duration_s: i32,
        sac_ml_min: i32,
        surface_pressure_mbar: i32,
    ) {
        if self.is_empty() {
            return;
        }
        let mean_depth = (old_depth_mm + new_depth_mm) / 2;
        let gas_used = (depth_to_atm(mean_depth, surface_pressure_mbar) * f64::from(sac_ml_min)
            / 60.0
            * f64::from(duration_s)) as i32;
        self.gas_used_ml += gas_used;
        if self.kind.size_ml > 0 {
            self.end_mbar -= (f64::from(gas_used) * 1000.0 / f64::from(self.kind.size_ml)) as i32;
        }
    }
}

/// One entry of the external tank catalog. Metric entries carry ml/bar;
/// imperial entries carry psi/cuft and leave `ml` zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TankInfo {
    pub name: String,
    pub ml: i32,
    pub bar: i32,
    pub psi: i32,
    pub cuft: f64,
}

pub fn psi_to_bar(psi: i32) -> f64 {
    f64::from(psi) / 14.5037738
}

pub fn psi_to_mbar(psi: i32) -> i32 {
    (psi_to_bar(psi) * 1000.0) as i32
}

pub fn cuft_to_l(cuft: f64) -> f64 {
    cuft * 28.316846592
}

pub fn bar_to_atm(bar: f64) -> f64 {
    bar / 1.01325
}

/// Configure `cyl` from the named catalog entry. Imperial entries derive the
/// internal volume from the free-gas capacity at working pressure. Unknown
/// names leave the cylinder untouched.
pub fn fill_default_cylinder(cyl: &mut Cylinder, catalog: &[TankInfo], name: &str) {
    let ti = match catalog.iter().find(|t| t.name == name) {
        Some(ti) => ti,
        None => return,
    };
    cyl.kind.description = ti.name.clone();
    if ti.ml > 0 {
        cyl.kind.size_ml = ti.ml;
        cyl.kind.workingpressure_mbar = ti.bar * 1000;
    } else {
        cyl.kind.workingpressure_mbar = psi_to_mbar(ti.psi);
        if ti.psi > 0 {
            cyl.kind.size_ml = (cuft_to_l(ti.cuft) * 1000.0 / bar_to_atm(psi_to_bar(ti.psi))) as i32;
        }
    }
    // MOD of air at a 1600 mbar pO2 limit
    cyl.depth_mm = 1600 * 1000 / O2_IN_AIR * 10 - 10000;
}
