//! Board model
//!
//! The aggregator never talks to a design tool directly. Anything that can
//! enumerate conductors (tracks, arcs, vias) and connection points (pads)
//! implements [`BoardSource`]: the `.kicad_pcb` reader, the JSON export reader,
//! or a hand-built [`BoardData`] in tests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nanometres per millimetre. KiCad stores every coordinate in nanometres.
pub const NANOMETERS_PER_MILLIMETER: f64 = 1_000_000.0;
/// Micrometres per millimetre.
pub const MICROMETERS_PER_MILLIMETER: f64 = 1_000.0;
/// Mils (thousandths of an inch) per millimetre.
pub const MILS_PER_MILLIMETER: f64 = 1_000.0 / 25.4;
/// Inches per millimetre.
pub const INCHES_PER_MILLIMETER: f64 = 1.0 / 25.4;

/// Native unit of the KiCad board object model.
pub const KICAD_INTERNAL_UNIT: LengthUnit = LengthUnit::Nanometer;

/// Linear unit a board source reports conductor lengths in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    Nanometer,
    Micrometer,
    Millimeter,
    Mil,
    Inch,
}

impl LengthUnit {
    /// How many of this unit make up one millimetre.
    pub fn per_millimeter(self) -> f64 {
        match self {
            LengthUnit::Nanometer => NANOMETERS_PER_MILLIMETER,
            LengthUnit::Micrometer => MICROMETERS_PER_MILLIMETER,
            LengthUnit::Millimeter => 1.0,
            LengthUnit::Mil => MILS_PER_MILLIMETER,
            LengthUnit::Inch => INCHES_PER_MILLIMETER,
        }
    }

    pub fn to_millimeters(self, value: f64) -> f64 {
        value / self.per_millimeter()
    }

    pub fn from_millimeters(self, mm: f64) -> f64 {
        mm * self.per_millimeter()
    }

    pub fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Nanometer => "nm",
            LengthUnit::Micrometer => "um",
            LengthUnit::Millimeter => "mm",
            LengthUnit::Mil => "mil",
            LengthUnit::Inch => "in",
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// A routed piece of copper (segment, arc or via) belonging to one net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conductor {
    pub net: String,
    pub netclass: String,
    /// Length in the owning source's [`LengthUnit`].
    pub length: f64,
}

impl Conductor {
    pub fn new(net: impl Into<String>, netclass: impl Into<String>, length: f64) -> Self {
        Self {
            net: net.into(),
            netclass: netclass.into(),
            length,
        }
    }
}

/// A pad. Contributes netclass membership but no length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    pub net: String,
    pub netclass: String,
}

impl ConnectionPoint {
    pub fn new(net: impl Into<String>, netclass: impl Into<String>) -> Self {
        Self {
            net: net.into(),
            netclass: netclass.into(),
        }
    }
}

/// Anything that can enumerate board conductors and connection points.
pub trait BoardSource {
    fn conductors(&self) -> &[Conductor];

    fn connection_points(&self) -> &[ConnectionPoint];

    /// Unit of [`Conductor::length`] values.
    fn length_unit(&self) -> LengthUnit {
        KICAD_INTERNAL_UNIT
    }
}

/// Owned board snapshot, produced by every reader in [`crate::parser`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardData {
    pub conductors: Vec<Conductor>,
    pub connection_points: Vec<ConnectionPoint>,
    pub length_unit: LengthUnit,
}

impl BoardData {
    pub fn new(length_unit: LengthUnit) -> Self {
        Self {
            length_unit,
            ..Default::default()
        }
    }

    pub fn push_conductor(&mut self, conductor: Conductor) {
        self.conductors.push(conductor);
    }

    pub fn push_connection_point(&mut self, point: ConnectionPoint) {
        self.connection_points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.conductors.is_empty() && self.connection_points.is_empty()
    }
}

impl BoardSource for BoardData {
    fn conductors(&self) -> &[Conductor] {
        &self.conductors
    }

    fn connection_points(&self) -> &[ConnectionPoint] {
        &self.connection_points
    }

    fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }
}
