//! Synthesized dive profiles.
//!
//! A dive plan is an intent; the profile is the concrete rendering of it:
//! time-ordered samples with gas-switch and setpoint events, plus the
//! per-cylinder pressure bookkeeping. The profile is rebuilt from scratch on
//! every planning pass and never mutated afterwards.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cylinder::{Cylinder, MAX_CYLINDERS};
use crate::diveplan::DivePlan;
use crate::error::PlanError;
use crate::gas::{GasMix, SAME_GAS_DISTANCE};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds from the start of the dive.
    pub time: i32,
    /// mm.
    pub depth: i32,
    /// Setpoint in mbar; 0 for open circuit.
    pub po2: i32,
    /// Pressure of the cylinder in use, mbar.
    pub cylinder_pressure: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Switch to the given cylinder.
    GasChange { cylinder: usize },
    /// Rebreather setpoint change.
    SetpointChange { po2: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEvent {
    pub time: i32,
    pub kind: EventKind,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiveComputer {
    pub model: String,
    /// mbar.
    pub surface_pressure: i32,
    pub samples: Vec<Sample>,
    pub events: Vec<SampleEvent>,
}

impl DiveComputer {
    /// Append a sample seeded from the previous one, so values that are not
    /// explicitly overwritten (setpoint, cylinder pressure) carry forward.
    fn push_sample(&mut self, time: i32, depth: i32) {
        let mut sample = self.samples.last().copied().unwrap_or_default();
        sample.time = time;
        sample.depth = depth;
        self.samples.push(sample);
    }

    fn set_last_po2(&mut self, po2: i32) {
        if let Some(sample) = self.samples.last_mut() {
            sample.po2 = po2;
        }
    }

    fn set_last_pressure(&mut self, mbar: i32) {
        if let Some(sample) = self.samples.last_mut() {
            sample.cylinder_pressure = mbar;
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dive {
    pub when: i64,
    pub cylinders: Vec<Cylinder>,
    pub dc: DiveComputer,
    pub notes: Option<String>,
}

impl Dive {
    /// Index of the cylinder whose mix matches `gas`.
    pub fn gas_index(&self, gas: &GasMix) -> Option<usize> {
        self.cylinders
            .iter()
            .take(MAX_CYLINDERS)
            .position(|cyl| !cyl.is_empty() && cyl.gas.distance(gas) < SAME_GAS_DISTANCE)
    }
}

/// Render a plan into a dive profile, drawing down a copy of the master
/// dive's cylinders. Returns `None` when the plan has no segments to render.
///
/// Waypoints with time 0 only declare that a mix is available; they are
/// checked against the cylinder list and produce no samples. A gas change
/// between segments emits the switch event one second after the previous
/// waypoint together with a bridging sample at the old depth.
pub fn create_dive_from_plan(plan: &DivePlan, master: &Dive) -> Result<Option<Dive>, PlanError> {
    let first = match plan.points.first() {
        Some(first) => *first,
        None => return Ok(None),
    };
    if master.cylinders.len() > MAX_CYLINDERS {
        return Err(PlanError::TooManyGasMixes);
    }
    let mut dive = Dive {
        when: plan.when,
        cylinders: master.cylinders.clone(),
        dc: DiveComputer {
            model: "planned dive".to_string(),
            surface_pressure: plan.surface_pressure,
            samples: Vec::new(),
            events: Vec::new(),
        },
        notes: None,
    };
    for cyl in &mut dive.cylinders {
        cyl.reset();
    }

    let mut current = 0usize;
    let mut oldgas = dive.cylinders.first().map(|c| c.gas).unwrap_or_default();
    let mut oldpo2 = 0;
    let mut lasttime = 0;
    let mut lastdepth = 0;

    dive.dc.samples.push(Sample {
        time: 0,
        depth: 0,
        po2: first.po2,
        cylinder_pressure: 0,
    });

    for dp in &plan.points {
        let po2 = dp.po2;

        if dp.time == 0 {
            // availability declaration: the mix must be on the cylinder list
            let gas = dp.gas.unwrap_or(oldgas);
            if dive.gas_index(&gas).is_none() {
                return Err(PlanError::GasNotAvailable {
                    gas: gas.to_string(),
                });
            }
            continue;
        }

        let gasmix = dp.gas.unwrap_or(oldgas);

        if oldpo2 != po2 {
            if lasttime != 0 {
                dive.dc.events.push(SampleEvent {
                    time: lasttime,
                    kind: EventKind::SetpointChange { po2 },
                });
            }
            oldpo2 = po2;
        }

        if gasmix.distance(&oldgas) > 0 {
            let idx = match dive.gas_index(&gasmix) {
                Some(idx) => idx,
                None => {
                    return Err(PlanError::GasNotAvailable {
                        gas: gasmix.to_string(),
                    })
                }
            };
            debug!("gas switch to cylinder {idx} ({gasmix}) at {} s", lasttime + 1);
            dive.dc.events.push(SampleEvent {
                time: lasttime + 1,
                kind: EventKind::GasChange { cylinder: idx },
            });
            dive.dc.set_last_po2(po2);
            dive.dc.push_sample(lasttime + 1, lastdepth);
            current = idx;
            oldgas = gasmix;
        }

        let (prev_time, prev_depth) = dive
            .dc
            .samples
            .last()
            .map(|s| (s.time, s.depth))
            .unwrap_or((0, 0));
        dive.dc.set_last_po2(po2);
        dive.dc.push_sample(dp.time, dp.depth);
        dive.dc.set_last_po2(po2);

        let sac = if dp.entered {
            plan.bottom_sac
        } else {
            plan.deco_sac
        };
        if let Some(cyl) = dive.cylinders.get_mut(current) {
            cyl.consume(
                prev_depth,
                dp.depth,
                dp.time - prev_time,
                sac,
                plan.surface_pressure,
            );
            let end = cyl.end_mbar;
            dive.dc.set_last_pressure(end);
        }

        lasttime = dp.time;
        lastdepth = dp.depth;
    }

    if dive.dc.samples.len() <= 1 {
        // not enough to make a dive; most likely every time was zero
        return Ok(None);
    }
    Ok(Some(dive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cylinder::CylinderType;

    fn cylinder(gas: GasMix) -> Cylinder {
        Cylinder {
            gas,
            kind: CylinderType {
                description: "12l 232bar".to_string(),
                size_ml: 12_000,
                workingpressure_mbar: 232_000,
            },
            start_mbar: 232_000,
            end_mbar: 232_000,
            depth_mm: 0,
            gas_used_ml: 0,
        }
    }

    fn master_with(gases: &[GasMix]) -> Dive {
        let mut master = Dive::default();
        for &gas in gases {
            master.cylinders.push(cylinder(gas));
        }
        master
    }

    fn plan_with(points: Vec<(i32, i32)>) -> DivePlan {
        let mut plan = DivePlan {
            surface_pressure: 1013,
            gf_low: 30,
            gf_high: 70,
            bottom_sac: 20_000,
            deco_sac: 17_000,
            ..Default::default()
        };
        for (time, depth) in points {
            let mut dp = crate::diveplan::Waypoint::new(time, depth, Some(GasMix::AIR), 0);
            dp.entered = true;
            plan.append(dp);
        }
        plan
    }

    #[test]
    fn test_empty_plan_yields_no_dive() {
        let master = master_with(&[GasMix::AIR]);
        let plan = DivePlan::default();
        assert!(create_dive_from_plan(&plan, &master).unwrap().is_none());
    }

    #[test]
    fn test_declarations_only_yield_no_dive() {
        let master = master_with(&[GasMix::AIR]);
        let mut plan = plan_with(vec![]);
        plan.append(crate::diveplan::Waypoint::new(0, 6_000, Some(GasMix::AIR), 0));
        assert!(create_dive_from_plan(&plan, &master).unwrap().is_none());
    }

    #[test]
    fn test_single_waypoint_gets_initial_and_final_sample() {
        let master = master_with(&[GasMix::AIR]);
        let plan = plan_with(vec![(1800, 15_000)]);
        let dive = create_dive_from_plan(&plan, &master).unwrap().unwrap();
        assert_eq!(dive.dc.samples.len(), 2);
        assert_eq!(dive.dc.samples[0].time, 0);
        assert_eq!(dive.dc.samples[0].depth, 0);
        assert_eq!(dive.dc.samples[1].time, 1800);
        assert_eq!(dive.dc.samples[1].depth, 15_000);
    }

    #[test]
    fn test_consumption_lands_in_samples() {
        let master = master_with(&[GasMix::AIR]);
        let plan = plan_with(vec![(1800, 15_000)]);
        let dive = create_dive_from_plan(&plan, &master).unwrap().unwrap();
        let last = dive.dc.samples.last().unwrap();
        assert!(last.cylinder_pressure < 232_000);
        assert_eq!(last.cylinder_pressure, dive.cylinders[0].end_mbar);
        assert!(dive.cylinders[0].gas_used_ml > 0);
    }

    #[test]
    fn test_gas_switch_emits_event_and_bridge_sample() {
        let ean50 = GasMix::new(500, 0);
        let master = master_with(&[GasMix::AIR, ean50]);
        let mut plan = plan_with(vec![(1200, 30_000)]);
        plan.add_segment(300, 21_000, None, 0, false);
        plan.add_segment(300, 21_000, Some(ean50), 0, false);
        let dive = create_dive_from_plan(&plan, &master).unwrap().unwrap();

        let switch = dive
            .dc
            .events
            .iter()
            .find(|e| matches!(e.kind, EventKind::GasChange { cylinder: 1 }))
            .expect("gas switch event");
        assert_eq!(switch.time, 1501);

        // bridging sample preserves the depth at the moment of the switch
        let bridge = dive
            .dc
            .samples
            .iter()
            .find(|s| s.time == 1501)
            .expect("bridge sample");
        assert_eq!(bridge.depth, 21_000);

        // consumption after the switch comes out of the second cylinder
        assert!(dive.cylinders[1].gas_used_ml > 0);
    }

    #[test]
    fn test_unknown_gas_is_an_error() {
        let master = master_with(&[GasMix::AIR]);
        let mut plan = plan_with(vec![(1200, 30_000)]);
        plan.add_segment(300, 21_000, Some(GasMix::new(500, 0)), 0, false);
        let err = create_dive_from_plan(&plan, &master).unwrap_err();
        assert!(matches!(err, PlanError::GasNotAvailable { .. }));
    }

    #[test]
    fn test_unknown_declared_gas_is_an_error() {
        let master = master_with(&[GasMix::AIR]);
        let mut plan = plan_with(vec![(1200, 30_000)]);
        plan.append(crate::diveplan::Waypoint::new(
            0,
            6_000,
            Some(GasMix::new(1000, 0)),
            0,
        ));
        let err = create_dive_from_plan(&plan, &master).unwrap_err();
        assert!(matches!(err, PlanError::GasNotAvailable { .. }));
    }

    #[test]
    fn test_setpoint_change_event() {
        let master = master_with(&[GasMix::AIR]);
        let mut plan = plan_with(vec![]);
        let mut dp = crate::diveplan::Waypoint::new(600, 20_000, Some(GasMix::AIR), 1300);
        dp.entered = true;
        plan.append(dp);
        let mut dp = crate::diveplan::Waypoint::new(600, 20_000, None, 1000);
        dp.entered = true;
        plan.append(dp);
        let dive = create_dive_from_plan(&plan, &master).unwrap().unwrap();

        let sp = dive
            .dc
            .events
            .iter()
            .find(|e| matches!(e.kind, EventKind::SetpointChange { po2: 1000 }))
            .expect("setpoint change event");
        assert_eq!(sp.time, 600);
        assert_eq!(dive.dc.samples[0].po2, 1300);
    }

    #[test]
    fn test_more_cylinders_than_supported() {
        let mut master = master_with(&[GasMix::AIR]);
        for i in 0..MAX_CYLINDERS {
            master.cylinders.push(cylinder(GasMix::new(300 + i as i32 * 50, 0)));
        }
        let plan = plan_with(vec![(1800, 15_000)]);
        let err = create_dive_from_plan(&plan, &master).unwrap_err();
        assert_eq!(err, PlanError::TooManyGasMixes);
    }

    #[test]
    fn test_samples_strictly_ordered() {
        let ean50 = GasMix::new(500, 0);
        let master = master_with(&[GasMix::AIR, ean50]);
        let mut plan = plan_with(vec![(1200, 30_000)]);
        plan.add_segment(300, 21_000, None, 0, false);
        plan.add_segment(120, 21_000, Some(ean50), 0, false);
        plan.add_segment(600, 0, None, 0, false);
        let dive = create_dive_from_plan(&plan, &master).unwrap().unwrap();
        for pair in dive.dc.samples.windows(2) {
            assert!(
                pair[0].time < pair[1].time,
                "samples must be strictly ordered: {} then {}",
                pair[0].time,
                pair[1].time
            );
        }
    }
}
