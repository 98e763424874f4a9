//! Reusable invariant checks over an event slice, one per universal
//! invariant in spec §8 (P1-P6). Each takes the events in store append
//! order, the same shape `EventStore::events_for_request` returns.

use std::collections::HashMap;

use anyhow::{bail, Result};
use chorus_types::{Event, EventKind};

/// (P1) Offset monotonicity: for the named topic, publish events appear
/// with strictly increasing, contiguous offsets starting at 0.
pub fn assert_offsets_monotonic(events: &[Event], topic_name: &str) -> Result<()> {
    let mut expected = 0u64;
    for event in events {
        let Some(record) = publish_record(event, topic_name) else {
            continue;
        };
        if record.offset != expected {
            bail!(
                "topic {topic_name}: expected next offset {expected}, got {}",
                record.offset
            );
        }
        expected += 1;
    }
    Ok(())
}

/// (P2) Consumer monotonicity: for the named (topic, consumer) pair, the
/// sequence of `offset` values on ConsumeFromTopic events strictly
/// increases.
pub fn assert_consumer_monotonic(events: &[Event], topic_name: &str, consumer: &str) -> Result<()> {
    let mut last: Option<u64> = None;
    for event in events {
        let EventKind::ConsumeFromTopic(record) = &event.kind else {
            continue;
        };
        if record.topic_name != topic_name || record.consumer_name != consumer {
            continue;
        }
        if let Some(prev) = last {
            if record.offset <= prev {
                bail!(
                    "consumer {consumer} on topic {topic_name}: offset {} did not increase past {prev}",
                    record.offset
                );
            }
        }
        last = Some(record.offset);
    }
    Ok(())
}

/// (P4) Causal ancestry: every `consumed_event_ids` entry in a publish
/// references an event_id that appears strictly earlier in `events`.
pub fn assert_causal_ancestry(events: &[Event]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for event in events {
        if let EventKind::PublishToTopic(record) | EventKind::OutputTopic(record) = &event.kind {
            for parent in &record.consumed_event_ids {
                if !seen.contains(parent) {
                    bail!("event {} references unseen causal parent {parent}", event.event_id);
                }
            }
        }
        seen.insert(event.event_id);
    }
    Ok(())
}

/// (P5) At-most-one node instance: no two `NodeInvoke` events for the same
/// node name occur without an intervening `NodeRespond`/`NodeFailed`.
pub fn assert_no_overlapping_node_invocations(events: &[Event]) -> Result<()> {
    let mut open: HashMap<String, bool> = HashMap::new();
    for event in events {
        match &event.kind {
            EventKind::NodeInvoke { identity, .. } => {
                if *open.get(&identity.node_name).unwrap_or(&false) {
                    bail!("node {} invoked again before its prior run completed", identity.node_name);
                }
                open.insert(identity.node_name.clone(), true);
            }
            EventKind::NodeRespond { identity, .. } | EventKind::NodeFailed { identity, .. } => {
                open.insert(identity.node_name.clone(), false);
            }
            _ => {}
        }
    }
    Ok(())
}

/// (P6) Idempotent restore, expressed as equality of the final sequence of
/// `NodeRespond`/`NodeFailed` output across two runs — callers pass the
/// event histories of (a) an uninterrupted run and (b) a crash-and-restore
/// run of the same request, filtered to outcome events only.
pub fn assert_same_node_outcomes(a: &[Event], b: &[Event]) -> Result<()> {
    let outcomes_of = |events: &[Event]| -> Vec<(String, Option<Vec<chorus_types::Message>>)> {
        events
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::NodeRespond { identity, output_data } => {
                    Some((identity.node_name.clone(), Some(output_data.clone())))
                }
                EventKind::NodeFailed { identity, .. } => Some((identity.node_name.clone(), None)),
                _ => None,
            })
            .collect()
    };

    let (outcomes_a, outcomes_b) = (outcomes_of(a), outcomes_of(b));
    if outcomes_a != outcomes_b {
        bail!("node outcome sequences diverged between runs: {outcomes_a:?} vs {outcomes_b:?}");
    }
    Ok(())
}

fn publish_record<'a>(event: &'a Event, topic_name: &str) -> Option<&'a chorus_types::PublishRecord> {
    match &event.kind {
        EventKind::PublishToTopic(record) | EventKind::OutputTopic(record) if record.topic_name == topic_name => {
            Some(record)
        }
        _ => None,
    }
}
