//! Netclass aggregation
//!
//! One linear pass over a board's conductors and connection points builds
//! three mappings:
//! - netclass -> distinct member nets
//! - net -> total routed length (mm)
//! - netclass -> longest member net (mm)
//!
//! Ordered maps keep every rendering of the result reproducible.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::board::{BoardSource, Conductor, ConnectionPoint, LengthUnit};

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetclassSummary {
    pub netclass_nets: BTreeMap<String, BTreeSet<String>>,
    pub net_lengths: BTreeMap<String, f64>,
    pub netclass_max_length: BTreeMap<String, f64>,
}

/// Length of a single net as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NetLength {
    Known(f64),
    /// The net never carried a conductor.
    Unknown,
}

impl NetLength {
    pub fn millimeters(self) -> Option<f64> {
        match self {
            NetLength::Known(mm) => Some(mm),
            NetLength::Unknown => None,
        }
    }
}

impl fmt::Display for NetLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetLength::Known(mm) => write!(f, "{:.3} mm", mm),
            NetLength::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Build the netclass/net/length mappings.
///
/// Lengths are converted from `unit` to millimetres. Nets seen only on
/// connection points join their netclass but get no length entry.
pub fn aggregate(
    conductors: &[Conductor],
    connection_points: &[ConnectionPoint],
    unit: LengthUnit,
) -> NetclassSummary {
    let mut netclass_nets: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut net_lengths: BTreeMap<String, f64> = BTreeMap::new();

    for conductor in conductors {
        netclass_nets
            .entry(conductor.netclass.clone())
            .or_default()
            .insert(conductor.net.clone());
        *net_lengths.entry(conductor.net.clone()).or_insert(0.0) +=
            unit.to_millimeters(conductor.length);
    }

    for point in connection_points {
        netclass_nets
            .entry(point.netclass.clone())
            .or_default()
            .insert(point.net.clone());
    }

    let netclass_max_length = netclass_nets
        .iter()
        .map(|(netclass, nets)| {
            let max = nets
                .iter()
                .map(|net| net_lengths.get(net).copied().unwrap_or(0.0))
                .fold(0.0_f64, f64::max);
            (netclass.clone(), max)
        })
        .collect();

    NetclassSummary {
        netclass_nets,
        net_lengths,
        netclass_max_length,
    }
}

/// [`aggregate`] driven by a [`BoardSource`].
pub fn aggregate_source(source: &dyn BoardSource) -> NetclassSummary {
    let summary = aggregate(
        source.conductors(),
        source.connection_points(),
        source.length_unit(),
    );
    tracing::debug!(
        "Aggregated {} conductors and {} connection points into {} netclasses, {} routed nets",
        source.conductors().len(),
        source.connection_points().len(),
        summary.netclass_nets.len(),
        summary.net_lengths.len()
    );
    summary
}

/// Recorded length of `net`, or [`NetLength::Unknown`] if no conductor referenced it.
pub fn length_of(net_lengths: &BTreeMap<String, f64>, net: &str) -> NetLength {
    net_lengths
        .get(net)
        .copied()
        .map_or(NetLength::Unknown, NetLength::Known)
}

impl NetclassSummary {
    /// All netclass names, lexicographically sorted.
    pub fn netclass_names(&self) -> Vec<String> {
        self.netclass_nets.keys().cloned().collect()
    }

    pub fn contains(&self, netclass: &str) -> bool {
        self.netclass_nets.contains_key(netclass)
    }

    pub fn nets_of(&self, netclass: &str) -> Option<&BTreeSet<String>> {
        self.netclass_nets.get(netclass)
    }

    /// Longest member net of `netclass`, 0.0 when unknown.
    pub fn max_length_of(&self, netclass: &str) -> f64 {
        self.netclass_max_length
            .get(netclass)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn length_of(&self, net: &str) -> NetLength {
        length_of(&self.net_lengths, net)
    }
}
