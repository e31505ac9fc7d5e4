//! Length units.
//!
//! Configuration files describe sheets in millimetres while PDF content is
//! positioned in points (1/72 inch). Everything is converted to [`Pt`] as soon
//! as it is loaded.

use std::fmt;
use std::ops::{Add, Deref, Mul, Sub};

pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// A length in PDF points.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Pt(pub f32);

/// A length in millimetres.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Mm(pub f32);

impl From<Mm> for Pt {
    fn from(mm: Mm) -> Self {
        Pt(mm.0 * POINTS_PER_MM)
    }
}

impl Deref for Pt {
    type Target = f32;

    fn deref(&self) -> &f32 {
        &self.0
    }
}

impl Add for Pt {
    type Output = Pt;

    fn add(self, rhs: Pt) -> Pt {
        Pt(self.0 + rhs.0)
    }
}

impl Sub for Pt {
    type Output = Pt;

    fn sub(self, rhs: Pt) -> Pt {
        Pt(self.0 - rhs.0)
    }
}

impl Mul<f32> for Pt {
    type Output = Pt;

    fn mul(self, rhs: f32) -> Pt {
        Pt(self.0 * rhs)
    }
}

impl fmt::Display for Pt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}pt", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_convert_millimetres_to_points() {
        let inch: Pt = Mm(25.4).into();
        assert!((*inch - 72.0).abs() < 1e-4);
        let a4_width: Pt = Mm(210.0).into();
        assert!((*a4_width - 595.2756).abs() < 1e-3);
    }
}
