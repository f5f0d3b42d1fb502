//! The ascent planner.
//!
//! Starting from the last entered waypoint, the planner ascends in
//! one-second ticks toward the next candidate stop depth, testing each leg
//! against the tissue ceiling with a trial ascent on a snapshot of the
//! tissue state. Where the trial hits the ceiling the diver waits at the
//! current stop, one minute at a time, until the leg is clear. Gas switches
//! happen at the declared depths. Every committed leg becomes a waypoint on
//! the same dive plan, which is then re-synthesized into the final profile.

use log::debug;

use crate::config::PlannerConfig;
use crate::deco::{
    deco_allowed_depth, depth_to_bar, DecoState, GradientFactors, SURFACE_PRESSURE_MBAR,
};
use crate::diveplan::DivePlan;
use crate::error::PlanError;
use crate::gas::GasMix;
use crate::profile::{create_dive_from_plan, Dive, EventKind};
use crate::render::render_plan;

/// Integration grain during ascent, seconds.
pub const TIMESTEP: i32 = 1;

/// Unit of deco stop time, seconds.
pub const DECOTIMESTEP: i32 = 60;

/// Standard candidate stop depths, mm: 3 m steps to 57 m, then coarser.
/// Index 1 is the last-stop depth, the one entry the configuration can move.
const DECO_STOP_LEVELS: [i32; 50] = [
    0, 3000, 6000, 9000, 12000, 15000, 18000, 21000, 24000, 27000, 30000, 33000, 36000, 39000,
    42000, 45000, 48000, 51000, 54000, 57000, 60000, 63000, 66000, 69000, 72000, 75000, 78000,
    81000, 84000, 87000, 90000, 100000, 110000, 120000, 130000, 140000, 150000, 160000, 170000,
    180000, 190000, 200000, 220000, 240000, 260000, 280000, 300000, 320000, 340000, 360000,
];

/// The candidate stop table with the configured last-stop depth applied.
pub fn deco_stop_levels(last_stop_6m: bool) -> Vec<i32> {
    let mut levels = DECO_STOP_LEVELS.to_vec();
    levels[1] = if last_stop_6m { 6000 } else { 3000 };
    levels
}

/// Ascent rate at `depth`, mm/s: 1 m/min over the final metres, 9 m/min
/// while well below the dive's average depth, 6 m/min in between.
pub fn ascend_velocity(depth: i32, avg_depth: i32) -> i32 {
    if depth <= 6000 {
        1000 / 60
    } else if depth * 4 > avg_depth * 3 {
        9000 / 60
    } else {
        6000 / 60
    }
}

/// A declared gas switch on the way up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasChange {
    /// mm.
    pub depth: i32,
    pub cylinder: usize,
}

/// Collect the declared gas switches at or above `depth`, ordered by depth
/// ascending. A declaration deeper than `depth` instead nominates its
/// cylinder for the first ascent leg; among several, the shallowest wins.
pub fn analyze_gaslist(
    plan: &DivePlan,
    dive: &Dive,
    depth: i32,
    asc_cylinder: &mut usize,
) -> Result<Vec<GasChange>, PlanError> {
    let mut changes: Vec<GasChange> = Vec::new();
    let mut best_depth = dive
        .cylinders
        .get(*asc_cylinder)
        .map(|c| c.depth_mm)
        .filter(|&d| d > 0)
        .unwrap_or(i32::MAX);

    for dp in &plan.points {
        if dp.time != 0 {
            continue;
        }
        let gas = match dp.gas {
            Some(gas) => gas,
            None => continue,
        };
        let idx = match dive.gas_index(&gas) {
            Some(idx) => idx,
            None => {
                return Err(PlanError::GasNotAvailable {
                    gas: gas.to_string(),
                })
            }
        };
        if dp.depth <= depth {
            let pos = changes
                .iter()
                .position(|c| dp.depth < c.depth)
                .unwrap_or(changes.len());
            changes.insert(pos, GasChange {
                depth: dp.depth,
                cylinder: idx,
            });
        } else if dp.depth < best_depth {
            best_depth = dp.depth;
            *asc_cylinder = idx;
        }
    }

    for change in &changes {
        debug!(
            "gas change at {:.1} m to cylinder {}",
            f64::from(change.depth) / 1000.0,
            change.cylinder
        );
    }
    Ok(changes)
}

/// Merge the candidate deco depths and the gas-change depths into a single
/// ascending grid. The result keeps `dstops.len() + gstops.len()` entries;
/// collapsed duplicates pad the head with zeros, so index 0 is always the
/// surface.
pub fn sort_stops(dstops: &[i32], gstops: &[GasChange]) -> Vec<i32> {
    let total = dstops.len() + gstops.len();
    let mut levels = vec![0; total];

    if gstops.is_empty() {
        levels[..dstops.len()].copy_from_slice(dstops);
        return levels;
    }

    let mut i = total as i32 - 1;
    let mut di = dstops.len() as i32 - 1;
    let mut gi = gstops.len() as i32 - 1;
    while i >= 0 {
        let d = dstops[di as usize];
        let g = gstops[gi as usize].depth;
        if d > g {
            levels[i as usize] = d;
            di -= 1;
        } else if d == g {
            levels[i as usize] = d;
            di -= 1;
            gi -= 1;
        } else {
            levels[i as usize] = g;
            gi -= 1;
        }
        i -= 1;
        if di < 0 {
            while gi >= 0 {
                levels[i as usize] = gstops[gi as usize].depth;
                i -= 1;
                gi -= 1;
            }
            break;
        }
        if gi < 0 {
            while di >= 0 {
                levels[i as usize] = dstops[di as usize];
                i -= 1;
                di -= 1;
            }
            break;
        }
    }
    levels
}

fn interpolate(a: i32, b: i32, part: i32, whole: i32) -> i32 {
    if whole == 0 {
        return a;
    }
    a + (b - a) * part / whole
}

/// Gas being breathed at `time`, according to the profile's gas-change
/// events.
fn gas_at_time(dive: &Dive, time: i32, mut gas: GasMix) -> GasMix {
    for event in &dive.dc.events {
        if event.time > time {
            break;
        }
        if let EventKind::GasChange { cylinder } = event.kind {
            if let Some(cyl) = dive.cylinders.get(cylinder) {
                gas = cyl.gas;
            }
        }
    }
    gas
}

/// Feed the whole synthesized profile through the tissue integrator, one
/// second at a time with linear depth interpolation between samples.
fn tissue_at_end(dive: &Dive, deco: &mut DecoState) {
    let surface = dive.dc.surface_pressure;
    let mut gas = dive.cylinders.first().map(|c| c.gas).unwrap_or_default();
    let mut t0 = 0;
    let mut lastdepth = 0;
    for sample in &dive.dc.samples {
        let t1 = sample.time;
        gas = gas_at_time(dive, t0, gas);
        for j in t0..t1 {
            let depth = interpolate(lastdepth, sample.depth, j - t0, t1 - t0);
            deco.add_segment(depth_to_bar(depth, surface), &gas, 1, sample.po2);
        }
        lastdepth = sample.depth;
        t0 = t1;
    }
}

/// Compute the ascent back to the surface from the last entered waypoint,
/// appending the generated waypoints to `diveplan`, and return the fully
/// synthesized dive with the rendered plan in its notes.
///
/// With `add_deco` off only a direct ascent segment is produced. Returns
/// `Ok(None)` when the plan has nothing to render.
pub fn plan(
    diveplan: &mut DivePlan,
    master: &Dive,
    config: &PlannerConfig,
    add_deco: bool,
    show_disclaimer: bool,
) -> Result<Option<Dive>, PlanError> {
    if diveplan.surface_pressure == 0 {
        diveplan.surface_pressure = SURFACE_PRESSURE_MBAR;
    }

    let dive = match create_dive_from_plan(diveplan, master)? {
        Some(dive) => dive,
        None => return Ok(None),
    };

    // start from the last sample, i.e. the last manually entered waypoint
    let last = match dive.dc.samples.last() {
        Some(sample) => *sample,
        None => return Ok(None),
    };
    let mut gas = dive.cylinders.first().map(|c| c.gas).unwrap_or_default();
    gas = gas_at_time(&dive, last.time, gas);
    let po2 = last.po2;
    let mut current_cylinder = dive.gas_index(&gas).unwrap_or(0);
    let mut depth = last.depth;
    let avg_depth = diveplan.average_depth();
    let mut last_ascend_rate = ascend_velocity(depth, avg_depth);

    // if all we wanted was the dive, just get us back to the surface
    if !add_deco {
        let transitiontime = depth / 75;
        diveplan.add_segment(transitiontime, 0, Some(gas), po2, false);
        return create_dive_from_plan(diveplan, master);
    }

    let gf = GradientFactors::new(
        diveplan.gf_low,
        diveplan.gf_high,
        config.gf_low_at_maxdepth,
    );
    let surface_bar = f64::from(diveplan.surface_pressure) / 1000.0;
    let mut deco = DecoState::at_surface(diveplan.surface_pressure, gf);
    tissue_at_end(&dive, &mut deco);

    let mut best_first_ascend_cylinder = current_cylinder;
    let gaschanges = analyze_gaslist(diveplan, &dive, depth, &mut best_first_ascend_cylinder)?;

    // first potential stop depth at or below the current depth
    let levels = deco_stop_levels(config.last_stop_6m);
    let mut stopidx = levels
        .iter()
        .position(|&l| l >= depth)
        .unwrap_or(levels.len());
    if stopidx > 0 {
        stopidx -= 1;
    }
    let stoplevels = sort_stops(&levels[..=stopidx], &gaschanges);
    stopidx += gaschanges.len();

    let mut clock = last.time;
    let mut previous_point_time = clock;
    let mut gi = gaschanges.len() as i32 - 1;
    let mut stopping = false;

    if best_first_ascend_cylinder != current_cylinder {
        // a deeper-rated deco gas was declared; start the ascent on it
        stopping = true;
        current_cylinder = best_first_ascend_cylinder;
        gas = dive
            .cylinders
            .get(current_cylinder)
            .map(|c| c.gas)
            .unwrap_or(gas);
        debug!("first ascent leg on cylinder {current_cylinder} ({gas})");
    }

    loop {
        // ascend towards the next stop depth
        loop {
            let rate = ascend_velocity(depth, avg_depth);
            let mut deltad = rate * TIMESTEP;
            if rate != last_ascend_rate {
                diveplan.add_segment(clock - previous_point_time, depth, Some(gas), po2, false);
                previous_point_time = clock;
                stopping = false;
                last_ascend_rate = rate;
            }
            if depth - deltad < stoplevels[stopidx] {
                // clamped to the stop depth; the tick still counts in full
                deltad = depth - stoplevels[stopidx];
            }
            deco.add_segment(
                depth_to_bar(depth, diveplan.surface_pressure),
                &gas,
                TIMESTEP,
                po2,
            );
            clock += TIMESTEP;
            depth -= deltad;
            if depth <= stoplevels[stopidx] {
                break;
            }
        }

        if depth <= 0 {
            break; // surface reached
        }

        if gi >= 0 && stoplevels[stopidx] == gaschanges[gi as usize].depth {
            // the stop we just arrived at is a declared gas change
            diveplan.add_segment(clock - previous_point_time, depth, Some(gas), po2, false);
            previous_point_time = clock;
            stopping = true;
            current_cylinder = gaschanges[gi as usize].cylinder;
            gas = dive
                .cylinders
                .get(current_cylinder)
                .map(|c| c.gas)
                .unwrap_or(gas);
            debug!(
                "switch to cylinder {current_cylinder} ({gas}) at {:.1} m",
                f64::from(depth) / 1000.0
            );
            gi -= 1;
        }

        stopidx -= 1;

        // trial-ascend to the next stop on a tissue snapshot; wait out the
        // ceiling at the current depth if the trial hits it
        let mut trial_depth = depth;
        let mut cached = deco.clone();
        loop {
            let mut clear_to_ascend = true;
            while trial_depth > stoplevels[stopidx] {
                let deltad = ascend_velocity(trial_depth, avg_depth) * TIMESTEP;
                let tolerance = deco.add_segment(
                    depth_to_bar(trial_depth, diveplan.surface_pressure),
                    &gas,
                    TIMESTEP,
                    po2,
                );
                if deco_allowed_depth(tolerance, surface_bar, true) > trial_depth - deltad {
                    // we should have stopped
                    clear_to_ascend = false;
                    break;
                }
                trial_depth -= deltad;
            }
            deco = cached.clone();

            if clear_to_ascend {
                break;
            }

            if !stopping {
                // the last committed segment was an ascent; open the stop
                diveplan.add_segment(clock - previous_point_time, depth, Some(gas), po2, false);
                previous_point_time = clock;
                stopping = true;
            }
            deco.add_segment(
                depth_to_bar(depth, diveplan.surface_pressure),
                &gas,
                DECOTIMESTEP,
                po2,
            );
            cached = deco.clone();
            clock += DECOTIMESTEP;
            trial_depth = depth;
        }

        if stopping {
            // close the stop before ascending again
            diveplan.add_segment(clock - previous_point_time, depth, Some(gas), po2, false);
            previous_point_time = clock;
            stopping = false;
        }
    }

    // we made it to the surface
    diveplan.add_segment(clock - previous_point_time, 0, Some(gas), po2, false);

    let mut planned = match create_dive_from_plan(diveplan, master)? {
        Some(dive) => dive,
        None => return Ok(None),
    };
    planned.notes = Some(render_plan(diveplan, &planned, config, show_disclaimer));
    Ok(Some(planned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cylinder::{Cylinder, CylinderType};
    use crate::diveplan::Waypoint;

    fn cylinder(gas: GasMix, depth_mm: i32) -> Cylinder {
        Cylinder {
            gas,
            kind: CylinderType {
                description: "12l 232bar".to_string(),
                size_ml: 12_000,
                workingpressure_mbar: 232_000,
            },
            start_mbar: 232_000,
            end_mbar: 232_000,
            depth_mm,
            gas_used_ml: 0,
        }
    }

    #[test]
    fn test_ascend_velocity_bands() {
        // final metres crawl
        assert_eq!(ascend_velocity(6_000, 30_000), 1000 / 60);
        assert_eq!(ascend_velocity(3_000, 30_000), 1000 / 60);
        // deep, well below three quarters of the average: fast
        assert_eq!(ascend_velocity(40_000, 30_000), 9000 / 60);
        // between: moderate
        assert_eq!(ascend_velocity(20_000, 30_000), 6000 / 60);
    }

    #[test]
    fn test_deco_stop_levels_last_stop() {
        let levels = deco_stop_levels(false);
        assert_eq!(levels[0], 0);
        assert_eq!(levels[1], 3000);
        let levels = deco_stop_levels(true);
        assert_eq!(levels[1], 6000);
        assert_eq!(levels[2], 6000);
    }

    #[test]
    fn test_sort_stops_merges_and_pads() {
        let dstops = [0, 3000, 6000, 9000];
        let gstops = [
            GasChange {
                depth: 6000,
                cylinder: 1,
            },
            GasChange {
                depth: 21000,
                cylinder: 2,
            },
        ];
        let levels = sort_stops(&dstops, &gstops);
        assert_eq!(levels, vec![0, 0, 3000, 6000, 9000, 21000]);
    }

    #[test]
    fn test_sort_stops_without_gas_changes() {
        let dstops = [0, 3000, 6000];
        let levels = sort_stops(&dstops, &[]);
        assert_eq!(levels, vec![0, 3000, 6000]);
    }

    #[test]
    fn test_analyze_gaslist_orders_by_depth() {
        let ean50 = GasMix::new(500, 0);
        let oxygen = GasMix::new(1000, 0);
        let mut master = Dive::default();
        master.cylinders.push(cylinder(GasMix::new(180, 450), 0));
        master.cylinders.push(cylinder(ean50, 21_000));
        master.cylinders.push(cylinder(oxygen, 6_000));

        let mut plan = DivePlan::default();
        let mut bottom = Waypoint::new(1200, 60_000, Some(GasMix::new(180, 450)), 0);
        bottom.entered = true;
        plan.append(bottom);
        plan.append(Waypoint::new(0, 21_000, Some(ean50), 0));
        plan.append(Waypoint::new(0, 6_000, Some(oxygen), 0));

        let mut asc = 0usize;
        let changes = analyze_gaslist(&plan, &master, 60_000, &mut asc).unwrap();
        assert_eq!(
            changes,
            vec![
                GasChange {
                    depth: 6_000,
                    cylinder: 2
                },
                GasChange {
                    depth: 21_000,
                    cylinder: 1
                },
            ]
        );
        assert_eq!(asc, 0, "no declaration deeper than the current depth");
    }

    #[test]
    fn test_analyze_gaslist_prefers_shallowest_deeper_declaration() {
        let tmx = GasMix::new(180, 450);
        let travel = GasMix::new(500, 0);
        let mut master = Dive::default();
        master.cylinders.push(cylinder(GasMix::AIR, 0));
        master.cylinders.push(cylinder(tmx, 0));
        master.cylinders.push(cylinder(travel, 0));

        let mut plan = DivePlan::default();
        let mut bottom = Waypoint::new(600, 15_000, Some(GasMix::AIR), 0);
        bottom.entered = true;
        plan.append(bottom);
        plan.append(Waypoint::new(0, 40_000, Some(tmx), 0));
        plan.append(Waypoint::new(0, 30_000, Some(travel), 0));

        let mut asc = 0usize;
        let changes = analyze_gaslist(&plan, &master, 15_000, &mut asc).unwrap();
        assert!(changes.is_empty());
        assert_eq!(asc, 2, "shallowest deeper declaration wins");
    }

    #[test]
    fn test_gas_at_time_follows_events() {
        let ean50 = GasMix::new(500, 0);
        let mut dive = Dive::default();
        dive.cylinders.push(cylinder(GasMix::AIR, 0));
        dive.cylinders.push(cylinder(ean50, 0));
        dive.dc.events.push(crate::profile::SampleEvent {
            time: 900,
            kind: EventKind::GasChange { cylinder: 1 },
        });

        assert_eq!(gas_at_time(&dive, 0, GasMix::AIR), GasMix::AIR);
        assert_eq!(gas_at_time(&dive, 899, GasMix::AIR), GasMix::AIR);
        assert_eq!(gas_at_time(&dive, 900, GasMix::AIR), ean50);
        assert_eq!(gas_at_time(&dive, 2000, GasMix::AIR), ean50);
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate(0, 1000, 1, 4), 250);
        assert_eq!(interpolate(1000, 0, 2, 4), 500);
        assert_eq!(interpolate(500, 500, 3, 7), 500);
        assert_eq!(interpolate(500, 800, 0, 0), 500);
    }
}
