//! Folding an incoming snapshot into the prior state.

use std::collections::HashMap;

use crate::types::{FamilyKey, MetricFamily, Sample};

/// Merge an incoming batch of families into the prior state.
///
/// The result is built from `incoming` alone:
///
/// - an incoming family with no counterpart in `state` is adopted as is;
/// - an incoming family matching a prior family (same [`FamilyKey`]) keeps
///   its own name, type, help and label names, but its samples are the prior
///   family's samples, each one increased by the value of the incoming
///   sample it matches (see [`Sample::matches`]). Prior samples without a
///   match are carried over unchanged. Incoming samples without a prior
///   counterpart are dropped;
/// - prior families absent from `incoming` are dropped.
///
/// When several prior families share a key, the first one in `state` is
/// used. When several incoming samples match one prior sample, the last one
/// wins.
pub fn merge(state: &[MetricFamily], incoming: Vec<MetricFamily>) -> Vec<MetricFamily> {
    let mut index: HashMap<FamilyKey, &MetricFamily> = HashMap::with_capacity(state.len());
    for family in state {
        index.entry(family.key()).or_insert(family);
    }

    incoming
        .into_iter()
        .map(|fresh| match index.get(&fresh.key()) {
            Some(base) => combine(base, fresh),
            None => fresh,
        })
        .collect()
}

fn combine(base: &MetricFamily, fresh: MetricFamily) -> MetricFamily {
    let samples = base
        .samples
        .iter()
        .map(|old| {
            // Scanning from the back makes the last matching sample win.
            match fresh.samples.iter().rev().find(|new| old.matches(new)) {
                Some(new) => Sample {
                    value: old.value + new.value,
                    ..old.clone()
                },
                None => old.clone(),
            }
        })
        .collect();

    MetricFamily { samples, ..fresh }
}
