//! Human-readable plan output.

use std::fmt::Write;

use crate::config::PlannerConfig;
use crate::cylinder::MAX_CYLINDERS;
use crate::deco::depth_to_atm;
use crate::diveplan::DivePlan;
use crate::profile::Dive;

const DISCLAIMER: &str = "DISCLAIMER / WARNING: THIS IS A NEW IMPLEMENTATION OF THE BUHLMANN \
ALGORITHM AND A DIVE PLANNER IMPLEMENTATION BASED ON THAT WHICH HAS RECEIVED ONLY A LIMITED \
AMOUNT OF TESTING. WE STRONGLY RECOMMEND NOT TO PLAN DIVES SIMPLY BASED ON THE RESULTS GIVEN \
HERE.";

/// Warn when the partial pressure of O2 at a waypoint exceeds this (mbar).
const PO2_WARNING_MBAR: i32 = 1600;

/// Warn when a sized cylinder is planned below this end pressure (mbar).
const PRESSURE_WARNING_MBAR: i32 = 10_000;

/// Render the plan as text: waypoint lines (table or prose), the
/// per-cylinder gas consumption summary, and any advisory warnings.
pub fn render_plan(
    plan: &DivePlan,
    dive: &Dive,
    config: &PlannerConfig,
    show_disclaimer: bool,
) -> String {
    if plan.points.is_empty() {
        return String::new();
    }

    let mut buf = String::new();
    if show_disclaimer {
        buf.push_str(DISCLAIMER);
        buf.push('\n');
    }
    let _ = write!(
        buf,
        "Dive plan\nbased on GFlow = {} and GFhigh = {}\n\ndepth",
        plan.gf_low, plan.gf_high
    );
    if config.display_runtime {
        buf.push_str(" runtime");
    }
    if config.display_duration {
        buf.push_str(" stop time");
    }
    buf.push_str(" gas\n");

    let mut lasttime = 0;
    let mut lastdepth = 0;
    let mut gaschange = true;
    let mut current_gas = dive.cylinders.first().map(|c| c.gas).unwrap_or_default();

    for (i, dp) in plan.points.iter().enumerate() {
        if dp.time == 0 {
            continue;
        }
        let gasmix = dp.gas.unwrap_or(current_gas);
        current_gas = gasmix;

        // look past gas declarations for the segment that follows
        let nextdp = plan.points[i + 1..].iter().find(|p| p.time != 0);
        let newgasmix = match nextdp {
            Some(next) => next.gas.unwrap_or(gasmix),
            None => gasmix,
        };

        // skip legs devoid of anything useful: generated transitions with no
        // gas change that neither start nor end a level stretch
        if !dp.entered
            && gasmix.distance(&newgasmix) == 0
            && nextdp.is_some()
            && dp.depth != lastdepth
            && nextdp.map(|next| next.depth != dp.depth).unwrap_or(false)
        {
            continue;
        }

        let depthvalue = f64::from(dp.depth) / 1000.0;
        if dp.depth != lastdepth {
            if config.display_transitions {
                let _ = writeln!(
                    buf,
                    "Transition to {:.1} m in {}:{:02} min - runtime {}:{:02} on {}",
                    depthvalue,
                    (dp.time - lasttime) / 60,
                    (dp.time - lasttime) % 60,
                    dp.time / 60,
                    dp.time % 60,
                    gasmix
                );
            } else if dp.entered {
                table_line(&mut buf, config, dp.time, lasttime, depthvalue);
                if gaschange {
                    let _ = write!(buf, " {newgasmix}");
                    gaschange = false;
                }
                buf.push('\n');
            }
        } else if config.verbatim {
            let _ = writeln!(
                buf,
                "Stay at {:.1} m for {}:{:02} min - runtime {}:{:02} on {}",
                depthvalue,
                (dp.time - lasttime) / 60,
                (dp.time - lasttime) % 60,
                dp.time / 60,
                dp.time % 60,
                gasmix
            );
        } else {
            table_line(&mut buf, config, dp.time, lasttime, depthvalue);
            if gaschange {
                let _ = write!(buf, " {newgasmix}");
                gaschange = false;
            }
            buf.push('\n');
        }

        if nextdp.is_some() && gasmix.distance(&newgasmix) > 0 {
            // gas switch at this waypoint
            if config.verbatim {
                let _ = writeln!(buf, "Switch gas to {newgasmix}");
            } else {
                gaschange = true;
            }
        }
        lasttime = dp.time;
        lastdepth = dp.depth;
    }

    buf.push_str("\nGas consumption:\n");
    for cyl in dive.cylinders.iter().take(MAX_CYLINDERS) {
        if cyl.is_empty() {
            break;
        }
        let warning = if cyl.kind.size_ml > 0 && cyl.end_mbar < PRESSURE_WARNING_MBAR {
            " WARNING: this is more gas than available in the specified cylinder!"
        } else {
            ""
        };
        let _ = writeln!(
            buf,
            "{:.0}l of {}{}",
            f64::from(cyl.gas_used_ml) / 1000.0,
            cyl.gas,
            warning
        );
    }

    let mut gas = dive.cylinders.first().map(|c| c.gas).unwrap_or_default();
    for dp in &plan.points {
        if dp.time == 0 {
            continue;
        }
        if let Some(mix) = dp.gas {
            gas = mix;
        }
        let po2 =
            (depth_to_atm(dp.depth, dive.dc.surface_pressure) * gas.fo2() * 1000.0) as i32;
        if po2 > PO2_WARNING_MBAR {
            let _ = writeln!(
                buf,
                "Warning: high pO2 value {:.2} at {}:{:02} with gas {} at depth {:.0} m",
                f64::from(po2) / 1000.0,
                dp.time / 60,
                dp.time % 60,
                gas,
                f64::from(dp.depth) / 1000.0
            );
        }
    }

    buf
}

fn table_line(buf: &mut String, config: &PlannerConfig, time: i32, lasttime: i32, depth_m: f64) {
    let _ = write!(buf, "{depth_m:3.0}m");
    if config.display_runtime {
        let _ = write!(buf, "  {:3}min ", (time + 30) / 60);
    }
    if config.display_duration {
        let _ = write!(buf, "   {:3}min ", (time - lasttime + 30) / 60);
    }
}
