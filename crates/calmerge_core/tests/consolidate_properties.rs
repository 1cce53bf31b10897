use calmerge_core::{consolidate, overlaps, Event, EventStatus, User};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

const STATUSES: [EventStatus; 3] = [
    EventStatus::Todo,
    EventStatus::InProgress,
    EventStatus::Completed,
];

fn pool() -> Vec<User> {
    (1..=4)
        .map(|n| User::with_id(Uuid::from_u128(n), format!("user{n}")))
        .collect()
}

/// Builds `E0, E1, ...` from `(start, len, status, attendee mask)` tuples.
fn build(specs: Vec<(i64, i64, usize, u8)>) -> Vec<Event> {
    let users = pool();
    specs
        .into_iter()
        .enumerate()
        .map(|(i, (start, len, status, mask))| {
            let mut event = Event::new(format!("E{i}"), start, start + len);
            event.status = STATUSES[status];
            for (bit, user) in users.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    event.add_attendee(user.clone());
                }
            }
            event
        })
        .collect()
}

fn arb_events(max: usize) -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((0i64..200, 1i64..40, 0usize..3, 0u8..16), 0..max).prop_map(build)
}

/// Events whose ends grow with their starts, so no event reaches past a
/// later one. Starts are distinct, which makes input order irrelevant.
fn arb_unnested_events() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((1i64..30, 1i64..60, 0usize..3, 0u8..16), 0..12)
        .prop_map(|steps| {
            let mut start = 0;
            let mut prev_end = 0;
            let specs = steps
                .into_iter()
                .map(|(gap, len, status, mask)| {
                    start += gap;
                    let end = (start + len).max(prev_end + 1);
                    prev_end = end;
                    (start, end - start, status, mask)
                })
                .collect();
            build(specs)
        })
        .prop_shuffle()
}

fn index_by_title(events: &[Event]) -> HashMap<&str, &Event> {
    events
        .iter()
        .map(|event| (event.title.as_str(), event))
        .collect()
}

/// Original members of a representative, recovered from its joined title.
fn members<'a>(merged: &Event, by_title: &HashMap<&str, &'a Event>) -> Vec<&'a Event> {
    merged
        .title
        .split(" + ")
        .map(|title| by_title[title])
        .collect()
}

proptest! {
    #[test]
    fn zero_or_one_event_is_returned_unchanged(events in arb_events(2)) {
        let result = consolidate(events.clone());
        prop_assert_eq!(result.output, events);
        prop_assert!(result.superseded.is_empty());
        prop_assert!(result.representatives.is_empty());
    }

    #[test]
    fn back_to_back_events_never_merge(
        lens in prop::collection::vec(1i64..50, 2..10),
        reverse in any::<bool>(),
    ) {
        let mut start = 0;
        let specs = lens
            .into_iter()
            .map(|len| {
                let spec = (start, len, 0, 1);
                start += len;
                spec
            })
            .collect();
        let chain = build(specs);
        let mut input = chain.clone();
        if reverse {
            input.reverse();
        }

        let result = consolidate(input);
        prop_assert_eq!(result.output, chain);
        prop_assert!(result.superseded.is_empty());
    }

    #[test]
    fn output_is_ordered_by_start(events in arb_events(16)) {
        let result = consolidate(events);
        for pair in result.output.windows(2) {
            prop_assert!(pair[0].start_ms <= pair[1].start_ms);
        }
    }

    #[test]
    fn every_input_is_kept_or_superseded_exactly_once(events in arb_events(16)) {
        let input_ids: HashSet<_> = events.iter().map(|event| event.id).collect();
        let result = consolidate(events);

        let mut seen = HashSet::new();
        for event in result.output.iter().chain(result.superseded.iter()) {
            if result.representatives.contains(&event.id) {
                prop_assert!(!input_ids.contains(&event.id));
            } else {
                prop_assert!(seen.insert(event.id), "{} reported twice", event.title);
            }
        }
        prop_assert_eq!(seen, input_ids);
    }

    #[test]
    fn representative_attends_everyone_from_its_members(events in arb_events(16)) {
        let by_title = index_by_title(&events);
        let result = consolidate(events.clone());

        for merged in result.new_events() {
            let group = members(merged, &by_title);
            prop_assert!(group.len() >= 2);

            let expected: HashSet<_> = group
                .iter()
                .flat_map(|event| event.attendees.iter().map(|user| user.id))
                .collect();
            let actual: Vec<_> = merged.attendees.iter().map(|user| user.id).collect();
            prop_assert_eq!(actual.len(), expected.len(), "duplicate attendee");
            prop_assert_eq!(actual.into_iter().collect::<HashSet<_>>(), expected);

            let start = group.iter().map(|event| event.start_ms).min();
            let end = group.iter().map(|event| event.end_ms).max();
            prop_assert_eq!(Some(merged.start_ms), start);
            prop_assert_eq!(Some(merged.end_ms), end);
        }
    }

    #[test]
    fn in_progress_member_makes_representative_in_progress(events in arb_events(16)) {
        let by_title = index_by_title(&events);
        let result = consolidate(events.clone());

        for merged in result.new_events() {
            let best = members(merged, &by_title)
                .iter()
                .map(|event| event.status.priority())
                .max();
            prop_assert_eq!(Some(merged.status.priority()), best);
            if best == Some(EventStatus::InProgress.priority()) {
                prop_assert_eq!(merged.status, EventStatus::InProgress);
            }
        }
    }

    #[test]
    fn second_pass_over_unnested_events_changes_nothing(events in arb_unnested_events()) {
        let first = consolidate(events);
        for pair in first.output.windows(2) {
            prop_assert!(!overlaps(&pair[0], &pair[1]));
        }

        let second = consolidate(first.output.clone());
        prop_assert!(!second.has_merges());
        prop_assert_eq!(second.output, first.output);
    }

    #[test]
    fn event_reaching_past_group_merges_again_on_second_pass(
        long_start in 0i64..100,
        long_len in 20i64..100,
        short_offset in 0i64..5,
        short_len in 1i64..5,
        late_len in 1i64..50,
    ) {
        // `late` overlaps `long` but starts after `short` has ended.
        let long_end = long_start + long_len;
        let short_start = long_start + short_offset;
        let late_start = long_end - 1;
        let events = build(vec![
            (long_start, long_len, 0, 0),
            (short_start, short_len, 0, 0),
            (late_start, late_len, 0, 0),
        ]);

        let first = consolidate(events);
        prop_assert_eq!(first.output.len(), 2);
        prop_assert_eq!(first.output[0].title.as_str(), "E0 + E1");
        prop_assert_eq!(first.output[1].title.as_str(), "E2");

        let second = consolidate(first.output.clone());
        prop_assert_eq!(second.output.len(), 1);
        prop_assert_eq!(second.output[0].title.as_str(), "E0 + E1 + E2");
    }
}
