//! # Page Break Decisions
//!
//! The rules for when content starts a new page. Kept free of any surface
//! access so the decisions can be tested on plain numbers.

/// What to do with a paragraph given the room left on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BreakDecision {
    /// Fits in the room left.
    Place,
    /// Does not fit here but would fit whole on a fresh page.
    MoveToNextPage,
    /// Taller than any page can hold: place it here and shrink.
    ShrinkToFit,
}

/// Decide how to place a paragraph of `required` height.
///
/// `capacity` is the clamped box the current position allows, `fresh` the
/// same clamp on an empty page. A page that is already fresh never breaks.
pub fn decide_paragraph(required: f64, capacity: f64, fresh: f64, on_fresh_page: bool) -> BreakDecision {
    if required <= capacity {
        return BreakDecision::Place;
    }
    if !on_fresh_page && capacity < fresh {
        return BreakDecision::MoveToNextPage;
    }
    BreakDecision::ShrinkToFit
}

/// Whether a group (section, line item, comment) should open a new page
/// before its first element.
///
/// Groups are only pushed when they would start in the last `threshold`
/// points of a page that already holds content.
pub fn should_break_before(remaining: f64, threshold: f64, on_fresh_page: bool) -> bool {
    !on_fresh_page && remaining < threshold
}
