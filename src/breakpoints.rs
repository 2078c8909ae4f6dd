use crate::config::NormalizedBreakpoint;
use crate::types::{BreakpointMatch, MatchStrategy, ViewportSnapshot};

fn min_bound(breakpoint: &NormalizedBreakpoint) -> f64 {
    breakpoint.min_width.unwrap_or(f64::NEG_INFINITY)
}

fn max_bound(breakpoint: &NormalizedBreakpoint) -> f64 {
    breakpoint.max_width.unwrap_or(f64::INFINITY)
}

/// Whether `width` satisfies the breakpoint under its inferred strategy
pub fn matches_breakpoint(width: f64, breakpoint: &NormalizedBreakpoint) -> bool {
    match breakpoint.inferred_strategy {
        MatchStrategy::MinWidth => width >= min_bound(breakpoint),
        MatchStrategy::MaxWidth => width <= max_bound(breakpoint),
        MatchStrategy::Range => width >= min_bound(breakpoint) && width <= max_bound(breakpoint),
    }
}

/// Find the active breakpoint for a viewport.
/// When several match, the last one in author order wins.
pub fn resolve(viewport: &ViewportSnapshot, breakpoints: &[NormalizedBreakpoint]) -> Option<BreakpointMatch> {
    breakpoints
        .iter()
        .rfind(|bp| matches_breakpoint(viewport.width, bp))
        .map(|bp| BreakpointMatch {
            id: bp.id.clone(),
            label: bp.label.clone(),
        })
}
