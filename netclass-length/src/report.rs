//! Human-readable and JSON views of a [`NetclassSummary`].

use serde::Serialize;

use crate::aggregate::{NetLength, NetclassSummary};

/// Text block per requested netclass, in the given order.
pub fn render_netclasses<S: AsRef<str>>(summary: &NetclassSummary, netclasses: &[S]) -> String {
    let mut out = String::new();
    for name in netclasses {
        let name = name.as_ref();
        match summary.nets_of(name) {
            Some(nets) => {
                out.push_str(&format!("Netclass: {}\n", name));
                out.push_str("Nets:\n");
                for net in nets {
                    out.push_str(&format!(
                        "  - {} (Length: {})\n",
                        net,
                        summary.length_of(net)
                    ));
                }
                out.push_str(&format!(
                    "Maximum length: {:.3} mm\n\n",
                    summary.max_length_of(name)
                ));
            }
            None => out.push_str(&format!("Netclass '{}' not found.\n\n", name)),
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct NetReport {
    pub name: String,
    /// `None` when the net has no routed conductor.
    pub length_mm: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetclassReport {
    pub name: String,
    pub max_length_mm: f64,
    pub nets: Vec<NetReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub netclasses: Vec<NetclassReport>,
    pub not_found: Vec<String>,
}

impl SummaryReport {
    /// Report for `netclasses`; names the summary does not know land in `not_found`.
    pub fn build<S: AsRef<str>>(summary: &NetclassSummary, netclasses: &[S]) -> Self {
        let mut report = SummaryReport {
            netclasses: Vec::new(),
            not_found: Vec::new(),
        };
        for name in netclasses {
            let name = name.as_ref();
            let Some(nets) = summary.nets_of(name) else {
                report.not_found.push(name.to_string());
                continue;
            };
            report.netclasses.push(NetclassReport {
                name: name.to_string(),
                max_length_mm: summary.max_length_of(name),
                nets: nets
                    .iter()
                    .map(|net| NetReport {
                        name: net.clone(),
                        length_mm: summary.length_of(net).millimeters(),
                    })
                    .collect(),
            });
        }
        report
    }

    pub fn total_nets(&self) -> usize {
        self.netclasses.iter().map(|nc| nc.nets.len()).sum()
    }
}

impl NetclassReport {
    pub fn unrouted_nets(&self) -> impl Iterator<Item = &NetReport> {
        self.nets.iter().filter(|n| n.length_mm.is_none())
    }
}

/// Shorthand used by the CLI for a single net line.
pub fn describe_net(summary: &NetclassSummary, net: &str) -> String {
    match summary.length_of(net) {
        NetLength::Known(mm) => format!("{}: {:.3} mm", net, mm),
        NetLength::Unknown => format!("{}: Unknown", net),
    }
}
