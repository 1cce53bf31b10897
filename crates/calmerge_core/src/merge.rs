//! Overlapping-event consolidation.
//!
//! # Responsibility
//! - Collapse runs of overlapping events into single representative events.
//! - Report which original events a caller must delete after committing.
//!
//! # Invariants
//! - Pure: no storage access, no shared state. Safe to run concurrently for
//!   different owners.
//! - Equal start times keep their input order (stable sort).
//! - Overlap is strict and checked against the last member of the open group
//!   only, so A~B and B~C chain A, B, C into one group even if A and C are
//!   disjoint.
//! - `superseded` never contains a representative; `output` never contains a
//!   superseded event.

use crate::model::event::{Event, EventId, EventStatus};
use std::collections::HashSet;
use uuid::Uuid;

const TITLE_SEPARATOR: &str = " + ";
const DESCRIPTION_SEPARATOR: &str = " | ";

/// Outcome of one consolidation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeResult {
    /// Representatives and untouched events, ordered by start time.
    pub output: Vec<Event>,
    /// Original events absorbed into a representative, in sweep order.
    pub superseded: Vec<Event>,
    /// IDs of the events in `output` that were synthesized by a merge.
    pub representatives: Vec<EventId>,
}

impl MergeResult {
    /// Returns whether at least one group was merged.
    pub fn has_merges(&self) -> bool {
        !self.representatives.is_empty()
    }

    /// Iterates over the synthesized events that do not exist in storage yet.
    pub fn new_events(&self) -> impl Iterator<Item = &Event> {
        self.output
            .iter()
            .filter(|event| self.representatives.contains(&event.id))
    }
}

/// Returns whether two events share any instant.
///
/// Touching endpoints (`a.end_ms == b.start_ms`) do not overlap.
pub fn overlaps(a: &Event, b: &Event) -> bool {
    a.end_ms > b.start_ms && a.start_ms < b.end_ms
}

/// Consolidates overlapping events, assigning fresh v4 IDs to representatives.
pub fn consolidate(events: Vec<Event>) -> MergeResult {
    consolidate_with(events, Uuid::new_v4)
}

/// Consolidates overlapping events using `next_id` for representative IDs.
///
/// `next_id` must not return an ID already used by an input event.
pub fn consolidate_with(events: Vec<Event>, mut next_id: impl FnMut() -> EventId) -> MergeResult {
    if events.len() <= 1 {
        return MergeResult {
            output: events,
            ..MergeResult::default()
        };
    }

    let mut sorted = events;
    sorted.sort_by_key(|event| event.start_ms);

    let mut result = MergeResult::default();
    let mut group: Vec<Event> = Vec::new();

    for event in sorted {
        let extends_group = group.last().is_some_and(|last| overlaps(last, &event));
        if !extends_group && !group.is_empty() {
            close_group(std::mem::take(&mut group), &mut result, &mut next_id);
        }
        group.push(event);
    }
    close_group(group, &mut result, &mut next_id);

    result
}

fn close_group(
    group: Vec<Event>,
    result: &mut MergeResult,
    next_id: &mut impl FnMut() -> EventId,
) {
    match group.len() {
        0 => {}
        1 => result.output.extend(group),
        _ => {
            let merged = merge_group(&group, next_id());
            result.representatives.push(merged.id);
            result.output.push(merged);
            result.superseded.extend(group);
        }
    }
}

/// Builds the representative of a non-empty group, in group order.
fn merge_group(group: &[Event], id: EventId) -> Event {
    let start_ms = group.iter().map(|event| event.start_ms).min().unwrap_or_default();
    let end_ms = group.iter().map(|event| event.end_ms).max().unwrap_or_default();

    let title = group
        .iter()
        .map(|event| event.title.as_str())
        .collect::<Vec<_>>()
        .join(TITLE_SEPARATOR);

    let descriptions = group
        .iter()
        .filter_map(|event| event.description.as_deref())
        .filter(|description| !description.is_empty())
        .collect::<Vec<_>>();
    let description = if descriptions.is_empty() {
        None
    } else {
        Some(descriptions.join(DESCRIPTION_SEPARATOR))
    };

    let status = group
        .iter()
        .map(|event| event.status)
        .fold(EventStatus::Completed, |best, status| {
            if status.priority() > best.priority() {
                status
            } else {
                best
            }
        });

    let mut seen = HashSet::new();
    let attendees = group
        .iter()
        .flat_map(|event| event.attendees.iter())
        .filter(|user| seen.insert(user.id))
        .cloned()
        .collect();

    let merged = Event {
        id,
        title,
        description,
        status,
        start_ms,
        end_ms,
        attendees,
    };
    debug_assert!(
        merged.start_ms < merged.end_ms,
        "merged event must keep start before end"
    );
    merged
}
