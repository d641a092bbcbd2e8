//! Descriptive statistics over incident history
//!
//! Pure counting; all orderings are fully deterministic (count descending, then
//! label ascending) so reports do not depend on hash iteration order.

use crate::core_types::incident::IncidentRecord;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Days in the weekday axis (Monday = 0)
pub const WEEKDAYS: usize = 7;
/// Hours in the hour axis
pub const HOURS: usize = 24;

/// Incident counts by weekday and hour of day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalHistogram {
    /// `counts[weekday][hour]`
    pub counts: [[usize; HOURS]; WEEKDAYS],
}

impl TemporalHistogram {
    /// Count for one cell
    #[inline]
    pub fn get(&self, weekday: usize, hour: usize) -> usize {
        self.counts[weekday][hour]
    }

    /// Sum over every cell
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Busiest `(weekday, hour)`, earliest cell on ties; `None` if empty
    pub fn peak(&self) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), usize)> = None;
        for (day, row) in self.counts.iter().enumerate() {
            for (hour, &count) in row.iter().enumerate() {
                if count > best.map_or(0, |(_, c)| c) {
                    best = Some(((day, hour), count));
                }
            }
        }
        best.map(|(cell, _)| cell)
    }
}

/// Weekday × hour histogram of incident timestamps
pub fn temporal_histogram(history: &[IncidentRecord]) -> TemporalHistogram {
    let mut counts = [[0; HOURS]; WEEKDAYS];
    for record in history {
        counts[record.weekday() as usize][record.hour() as usize] += 1;
    }
    TemporalHistogram { counts }
}

/// A label with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodCount {
    /// Neighborhood (or other category) label
    pub label: String,
    /// Occurrences
    pub count: usize,
}

/// Incident-type breakdown for one neighborhood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodBreakdown {
    /// Neighborhood label and total
    pub neighborhood: NeighborhoodCount,
    /// Counts per incident type, most frequent first
    pub incident_types: Vec<NeighborhoodCount>,
}

fn ranked<'a, I>(labels: I) -> Vec<NeighborhoodCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut ranked: Vec<NeighborhoodCount> = counts
        .into_iter()
        .map(|(label, count)| NeighborhoodCount {
            label: label.to_owned(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| (Reverse(a.count), &a.label).cmp(&(Reverse(b.count), &b.label)));
    ranked
}

/// The `n` neighborhoods with the most incidents
pub fn top_neighborhoods(history: &[IncidentRecord], n: usize) -> Vec<NeighborhoodCount> {
    let mut all = ranked(history.iter().map(|r| r.neighborhood.as_str()));
    all.truncate(n);
    all
}

/// Incident types within each of the top `n` neighborhoods
pub fn incident_types_by_neighborhood(
    history: &[IncidentRecord],
    n: usize,
) -> Vec<NeighborhoodBreakdown> {
    top_neighborhoods(history, n)
        .into_iter()
        .map(|neighborhood| {
            let incident_types = ranked(
                history
                    .iter()
                    .filter(|r| r.neighborhood == neighborhood.label)
                    .map(|r| r.incident_type.as_str()),
            );
            NeighborhoodBreakdown {
                neighborhood,
                incident_types,
            }
        })
        .collect()
}

/// Most frequent cause, ties by label; `None` for empty history
pub fn most_common_cause(history: &[IncidentRecord]) -> Option<&str> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for record in history {
        *counts.entry(record.cause.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .min_by(|a, b| (Reverse(a.1), a.0).cmp(&(Reverse(b.1), b.0)))
        .map(|(cause, _)| cause)
}
