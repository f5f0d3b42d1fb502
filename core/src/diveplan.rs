//! The dive plan: an ordered list of waypoints.

use serde::{Deserialize, Serialize};

use crate::gas::GasMix;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Seconds. Absolute within the plan once appended; a zero marks a
    /// gas-availability declaration rather than a segment.
    pub time: i32,
    /// mm.
    pub depth: i32,
    /// `None` inherits the previous segment's gas.
    pub gas: Option<GasMix>,
    /// Rebreather setpoint in mbar; 0 for open circuit.
    pub po2: i32,
    /// Entered by the user, as opposed to generated ascent/stop waypoints.
    pub entered: bool,
}

impl Waypoint {
    pub fn new(time: i32, depth: i32, gas: Option<GasMix>, po2: i32) -> Self {
        Waypoint {
            time,
            depth,
            gas,
            po2,
            entered: false,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DivePlan {
    /// Start of the dive, unix seconds.
    pub when: i64,
    /// mbar.
    pub surface_pressure: i32,
    /// Gradient factors in percent.
    pub gf_low: i32,
    pub gf_high: i32,
    /// Surface gas consumption on the bottom and during deco, ml/min.
    pub bottom_sac: i32,
    pub deco_sac: i32,
    pub points: Vec<Waypoint>,
}

impl DivePlan {
    /// True when no waypoint describes an actual segment.
    pub fn is_empty(&self) -> bool {
        self.points.iter().all(|dp| dp.time == 0)
    }

    /// Append a waypoint. A nonzero time is taken as a duration past the end
    /// of the plan and rewritten to an absolute time; declarations (time 0)
    /// keep their zero.
    pub fn append(&mut self, mut dp: Waypoint) {
        if dp.time != 0 {
            let last = self.points.iter().map(|p| p.time).max().unwrap_or(0);
            dp.time += last;
        }
        self.points.push(dp);
    }

    /// Append a segment of `duration` seconds ending at `depth`.
    pub fn add_segment(
        &mut self,
        duration: i32,
        depth: i32,
        gas: Option<GasMix>,
        po2: i32,
        entered: bool,
    ) {
        let mut dp = Waypoint::new(duration, depth, gas, po2);
        dp.entered = entered;
        self.append(dp);
    }

    /// The idx-th waypoint, growing the plan with blank waypoints as needed.
    pub fn nth_mut(&mut self, idx: usize) -> &mut Waypoint {
        while self.points.len() <= idx {
            self.points.push(Waypoint::default());
        }
        &mut self.points[idx]
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
    }

    /// Time-weighted mean depth of the planned profile, mm.
    pub fn average_depth(&self) -> i32 {
        let mut integral = 0i64;
        let mut last_time = 0i64;
        let mut last_depth = 0i64;
        for dp in &self.points {
            if dp.time == 0 {
                continue;
            }
            let time = i64::from(dp.time);
            let depth = i64::from(dp.depth);
            integral += (depth + last_depth) * (time - last_time) / 2;
            last_time = time;
            last_depth = depth;
        }
        if last_time > 0 {
            (integral / last_time) as i32
        } else {
            0
        }
    }
}
