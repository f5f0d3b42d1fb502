//! Breathing-gas mixes.
//!
//! A mix stores its oxygen and helium fractions in permille; the nitrogen
//! fraction is implicit. A mix with both fractions zero is a sentinel for
//! "no mix given"; in comparisons it behaves as air, matching the
//! convention that an unconfigured cylinder holds air.

pub mod parser;

pub use parser::{validate_gas, validate_po2};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permille of O2 in air.
pub const O2_IN_AIR: i32 = 209;

/// Two mixes closer than this (in permille distance) are the same gas.
pub const SAME_GAS_DISTANCE: i32 = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasMix {
    /// O2 fraction in permille.
    pub o2: i32,
    /// He fraction in permille.
    pub he: i32,
}

impl GasMix {
    pub const AIR: GasMix = GasMix {
        o2: O2_IN_AIR,
        he: 0,
    };

    pub fn new(o2: i32, he: i32) -> Self {
        GasMix { o2, he }
    }

    /// Neither fraction set: not a real mix, "keep breathing what you were".
    pub fn is_null(&self) -> bool {
        self.o2 == 0 && self.he == 0
    }

    pub fn is_air(&self) -> bool {
        self.he == 0 && (self.o2 == 0 || (self.o2 >= O2_IN_AIR - 1 && self.o2 <= O2_IN_AIR + 1))
    }

    /// O2 permille with the air fallback for an unset fraction applied.
    pub fn effective_o2(&self) -> i32 {
        if self.o2 != 0 {
            self.o2
        } else {
            O2_IN_AIR
        }
    }

    /// Distance between two mixes in permille, |Δo2| + |Δhe|.
    pub fn distance(&self, other: &GasMix) -> i32 {
        (self.effective_o2() - other.effective_o2()).abs() + (self.he - other.he).abs()
    }

    pub fn fo2(&self) -> f64 {
        f64::from(self.effective_o2()) / 1000.0
    }

    pub fn fhe(&self) -> f64 {
        f64::from(self.he) / 1000.0
    }

    pub fn fn2(&self) -> f64 {
        1.0 - self.fo2() - self.fhe()
    }
}

impl fmt::Display for GasMix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_air() {
            write!(f, "air")
        } else if self.he == 0 {
            write!(f, "EAN{}", (self.o2 + 5) / 10)
        } else {
            write!(f, "{}/{}", (self.o2 + 5) / 10, (self.he + 5) / 10)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_gas_threshold() {
        let ean32 = GasMix::new(320, 0);
        let ean36 = GasMix::new(360, 0);
        assert_eq!(ean32.distance(&ean36), 40);
        assert!(ean32.distance(&ean36) < SAME_GAS_DISTANCE);

        let air = GasMix::AIR;
        let ean50 = GasMix::new(500, 0);
        assert!(air.distance(&ean50) >= SAME_GAS_DISTANCE);
    }

    #[test]
    fn test_null_mix_counts_as_air() {
        let null = GasMix::default();
        assert!(null.is_null());
        assert!(null.is_air());
        assert_eq!(null.distance(&GasMix::AIR), 0);
        assert!((null.fo2() - 0.209).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display_canonical_names() {
        assert_eq!(GasMix::AIR.to_string(), "air");
        assert_eq!(GasMix::new(320, 0).to_string(), "EAN32");
        assert_eq!(GasMix::new(500, 0).to_string(), "EAN50");
        assert_eq!(GasMix::new(210, 350).to_string(), "21/35");
        assert_eq!(GasMix::new(180, 450).to_string(), "18/45");
    }

    #[test]
    fn test_inert_fractions() {
        let tmx = GasMix::new(180, 450);
        assert!((tmx.fo2() - 0.18).abs() < 1e-9);
        assert!((tmx.fhe() - 0.45).abs() < 1e-9);
        assert!((tmx.fn2() - 0.37).abs() < 1e-9);
    }
}
