//! Decompression dive planning.
//!
//! Takes a dive plan (user-entered waypoints plus the available cylinders)
//! and produces a physiologically safe profile back to the surface: the
//! ascent legs, the required decompression stops, gas switches at the
//! declared depths, per-cylinder consumption, and a printable plan. Tissue
//! loading follows a Bühlmann ZHL-16C model with gradient factors.
//!
//! # Example
//!
//! ```
//! use diveplan_compute::{
//!     plan, validate_gas, Cylinder, CylinderType, Dive, DivePlan, PlannerConfig, Waypoint,
//! };
//!
//! let air = validate_gas("air").unwrap();
//! let mut master = Dive::default();
//! master.cylinders.push(Cylinder {
//!     gas: air,
//!     kind: CylinderType {
//!         description: "12l 232bar".to_string(),
//!         size_ml: 12_000,
//!         workingpressure_mbar: 232_000,
//!     },
//!     start_mbar: 232_000,
//!     end_mbar: 232_000,
//!     depth_mm: 0,
//!     gas_used_ml: 0,
//! });
//!
//! let mut diveplan = DivePlan {
//!     gf_low: 30,
//!     gf_high: 70,
//!     bottom_sac: 20_000,
//!     deco_sac: 17_000,
//!     ..Default::default()
//! };
//! let mut bottom = Waypoint::new(1800, 15_000, Some(air), 0);
//! bottom.entered = true;
//! diveplan.append(bottom);
//!
//! let dive = plan(&mut diveplan, &master, &PlannerConfig::default(), true, false)
//!     .unwrap()
//!     .expect("plan has segments");
//! assert_eq!(dive.dc.samples.last().unwrap().depth, 0);
//! ```

pub mod config;
pub mod cylinder;
pub mod deco;
pub mod diveplan;
pub mod error;
pub mod gas;
pub mod planner;
pub mod profile;
pub mod render;

pub use config::PlannerConfig;
pub use cylinder::{fill_default_cylinder, Cylinder, CylinderType, TankInfo, MAX_CYLINDERS};
pub use deco::{deco_allowed_depth, DecoState, GradientFactors};
pub use diveplan::{DivePlan, Waypoint};
pub use error::PlanError;
pub use gas::{validate_gas, validate_po2, GasMix};
pub use planner::{plan, analyze_gaslist, sort_stops, GasChange, DECOTIMESTEP, TIMESTEP};
pub use profile::{create_dive_from_plan, Dive, DiveComputer, EventKind, Sample, SampleEvent};
pub use render::render_plan;
