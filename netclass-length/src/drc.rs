//! KiCad custom DRC rule emission.
//!
//! Output is consumed verbatim by KiCad's custom rules editor
//! (`.kicad_dru`), so the layout below is a fixed contract. Netclass names
//! are emitted as-is; a name that is not a valid rule identifier produces an
//! invalid rule.

use crate::aggregate::NetclassSummary;

/// First line of every generated rules document.
pub const DRC_VERSION_HEADER: &str = "(version 1)";
/// Last line of every generated rules document.
pub const DRC_END_MARKER: &str = "; -- End of generated DRC rules --";

/// One length rule for `netclass`, optimal length `max_length` mm.
pub fn format_drc_rule(netclass: &str, max_length: f64) -> String {
    format!(
        "(rule {nc}_LENGTH\n\t(condition \"A.NetClass=='{nc}'\")\n\t(constraint length (opt {max:.3}mm))\n)\n",
        nc = netclass,
        max = max_length,
    )
}

/// Full rules document for `netclasses`, in the given order.
///
/// Names missing from `summary` get a 0.000mm rule.
pub fn render_rules<S: AsRef<str>>(netclasses: &[S], summary: &NetclassSummary) -> String {
    let mut out = String::new();
    out.push_str(DRC_VERSION_HEADER);
    out.push_str("\n\n");
    for name in netclasses {
        let name = name.as_ref();
        out.push_str(&format_drc_rule(name, summary.max_length_of(name)));
        out.push('\n');
    }
    out.push_str(DRC_END_MARKER);
    out.push('\n');
    out
}
