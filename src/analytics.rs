//! Dashboard derivations over a fetched crash list.
//!
//! Everything here is pure and synchronous: inputs are borrowed, outputs are
//! new values, and no function fails on empty or partially-populated input.

use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CrashEvent, CrashType, EvidenceCustodyLog, Severity};

/// Marker jitter step, about 10 m of latitude.
pub const JITTER_DELTA_DEGREES: f64 = 1e-4;

// ===== FILTERING =====

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SeverityFilter {
    #[default]
    All,
    Only(Severity),
}

impl SeverityFilter {
    pub fn matches(&self, severity: Severity) -> bool {
        match self {
            SeverityFilter::All => true,
            SeverityFilter::Only(s) => *s == severity,
        }
    }

    /// All → minor → moderate → severe → All.
    pub fn cycle(self) -> Self {
        match self {
            SeverityFilter::All => SeverityFilter::Only(Severity::Minor),
            SeverityFilter::Only(Severity::Minor) => SeverityFilter::Only(Severity::Moderate),
            SeverityFilter::Only(Severity::Moderate) => SeverityFilter::Only(Severity::Severe),
            SeverityFilter::Only(_) => SeverityFilter::All,
        }
    }
}

impl fmt::Display for SeverityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeverityFilter::All => f.write_str("all"),
            SeverityFilter::Only(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for SeverityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Severity::from(s) {
            _ if s == "all" || s.is_empty() => Ok(SeverityFilter::All),
            Severity::Unknown => Err(format!("unknown severity: {}", s)),
            severity => Ok(SeverityFilter::Only(severity)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CrashTypeFilter {
    #[default]
    All,
    Only(CrashType),
}

impl CrashTypeFilter {
    pub fn matches(&self, crash_type: CrashType) -> bool {
        match self {
            CrashTypeFilter::All => true,
            CrashTypeFilter::Only(t) => *t == crash_type,
        }
    }

    /// All → each known crash type in declaration order → All.
    pub fn cycle(self) -> Self {
        match self {
            CrashTypeFilter::All => CrashTypeFilter::Only(CrashType::ALL[0]),
            CrashTypeFilter::Only(current) => CrashType::ALL
                .iter()
                .position(|t| *t == current)
                .and_then(|i| CrashType::ALL.get(i + 1))
                .map(|t| CrashTypeFilter::Only(*t))
                .unwrap_or(CrashTypeFilter::All),
        }
    }
}

impl fmt::Display for CrashTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrashTypeFilter::All => f.write_str("all"),
            CrashTypeFilter::Only(t) => write!(f, "{}", t),
        }
    }
}

impl FromStr for CrashTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match CrashType::from(s) {
            _ if s == "all" || s.is_empty() => Ok(CrashTypeFilter::All),
            CrashType::Unknown => Err(format!("unknown crash type: {}", s)),
            crash_type => Ok(CrashTypeFilter::Only(crash_type)),
        }
    }
}

/// Client-side list filter. Default criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterCriteria {
    pub severity: SeverityFilter,
    pub crash_type: CrashTypeFilter,
    pub search_text: String,
}

impl FilterCriteria {
    pub fn with_severity(mut self, severity: SeverityFilter) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_crash_type(mut self, crash_type: CrashTypeFilter) -> Self {
        self.crash_type = crash_type;
        self
    }

    pub fn with_search(mut self, search_text: impl Into<String>) -> Self {
        self.search_text = search_text.into();
        self
    }

    pub fn matches(&self, event: &CrashEvent) -> bool {
        self.matches_with_needle(event, &self.search_text.to_lowercase())
    }

    fn matches_with_needle(&self, event: &CrashEvent, needle: &str) -> bool {
        self.severity.matches(event.severity)
            && self.crash_type.matches(event.crash_type)
            && matches_search(event, needle)
    }
}

fn matches_search(event: &CrashEvent, needle: &str) -> bool {
    needle.is_empty()
        || event.event_id.to_lowercase().contains(needle)
        || event.location.address.to_lowercase().contains(needle)
}

/// Events matching every criterion, in input order.
///
/// Search is a case-insensitive substring match on the event id or the address.
pub fn filter(events: &[CrashEvent], criteria: &FilterCriteria) -> Vec<CrashEvent> {
    let needle = criteria.search_text.to_lowercase();
    events
        .iter()
        .filter(|e| criteria.matches_with_needle(e, &needle))
        .cloned()
        .collect()
}

/// Remembers the last filter result keyed on input identity and criteria.
///
/// Identity is the `Arc` allocation, which is what the query cache hands out,
/// so a refetched list always recomputes.
#[derive(Debug, Default)]
pub struct FilterMemo {
    last: Option<(Arc<Vec<CrashEvent>>, FilterCriteria, Arc<Vec<CrashEvent>>)>,
}

impl FilterMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        events: &Arc<Vec<CrashEvent>>,
        criteria: &FilterCriteria,
    ) -> Arc<Vec<CrashEvent>> {
        if let Some((input, last_criteria, output)) = &self.last {
            if Arc::ptr_eq(input, events) && last_criteria == criteria {
                return Arc::clone(output);
            }
        }
        let output = Arc::new(filter(events, criteria));
        self.last = Some((Arc::clone(events), criteria.clone(), Arc::clone(&output)));
        output
    }
}

// ===== KPIS =====

/// Dashboard summary scalars. Averages and peaks are `None` for an empty list.
/// `distinct_device_count` ignores events with an empty `device_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total: usize,
    pub severe_count: usize,
    pub avg_impact_force_g: Option<f64>,
    pub peak_speed: Option<f64>,
    /// Unique non-empty `metadata.device_id` values.
    pub distinct_device_count: usize,
}

pub fn compute_kpis(events: &[CrashEvent]) -> Kpis {
    let total = events.len();
    let severe_count = events
        .iter()
        .filter(|e| e.severity == Severity::Severe)
        .count();

    // Summed in sorted order so the mean is bit-identical for any permutation.
    let mut forces: Vec<f64> = events
        .iter()
        .map(|e| e.calculated_values.impact_force_g)
        .collect();
    forces.sort_by(f64::total_cmp);
    let avg_impact_force_g = (total > 0).then(|| forces.iter().sum::<f64>() / total as f64);

    let peak_speed = events
        .iter()
        .map(|e| e.calculated_values.speed_previous)
        .max_by(f64::total_cmp);

    let distinct_device_count = events
        .iter()
        .map(|e| e.metadata.device_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<HashSet<_>>()
        .len();

    Kpis {
        total,
        severe_count,
        avg_impact_force_g,
        peak_speed,
        distinct_device_count,
    }
}

/// Share of custody entries flagged verified by the API, `None` without entries.
pub fn verified_share(logs: &[EvidenceCustodyLog]) -> Option<f64> {
    if logs.is_empty() {
        return None;
    }
    let verified = logs.iter().filter(|l| l.verified).count();
    Some(verified as f64 / logs.len() as f64)
}

// ===== GROUPING =====

/// Counts per key, kept in first-encounter order.
#[derive(Debug, Clone)]
pub struct GroupCounts<K> {
    entries: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K> Default for GroupCounts<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> GroupCounts<K> {
    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &K) -> usize {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts; equals the number of grouped items.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    /// Entries in first-encounter order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, usize)> {
        self.entries.iter().map(|(k, n)| (k, *n))
    }

    /// Entries by descending count; ties keep first-encounter order.
    pub fn ranked(&self) -> Vec<(K, usize)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by_key(|(_, n)| Reverse(*n));
        ranked
    }

    pub fn top(&self) -> Option<(K, usize)> {
        self.ranked().into_iter().next()
    }

    pub fn into_entries(self) -> Vec<(K, usize)> {
        self.entries
    }
}

pub fn group_count<T, K, F>(items: &[T], mut key_fn: F) -> GroupCounts<K>
where
    K: Eq + Hash + Clone,
    F: FnMut(&T) -> K,
{
    let mut counts = GroupCounts::default();
    for item in items {
        counts.add(key_fn(item));
    }
    counts
}

pub fn severity_distribution(events: &[CrashEvent]) -> GroupCounts<Severity> {
    group_count(events, |e| e.severity)
}

pub fn crash_type_distribution(events: &[CrashEvent]) -> GroupCounts<CrashType> {
    group_count(events, |e| e.crash_type)
}

/// Counts per address prefix (text before the first comma).
pub fn hotspots(events: &[CrashEvent]) -> GroupCounts<String> {
    group_count(events, |e| e.location.area().to_string())
}

/// Most frequent non-empty address prefix; the first one seen wins a tie.
pub fn top_hotspot(events: &[CrashEvent]) -> Option<(String, usize)> {
    hotspots(events)
        .ranked()
        .into_iter()
        .find(|(area, _)| !area.is_empty())
}

// ===== TIMELINE =====

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub impact_force_g: f64,
    pub crash_type: CrashType,
}

/// Impact force over time, ascending. Equal instants keep input order;
/// events whose timestamp does not parse are left out.
pub fn build_timeline(events: &[CrashEvent]) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = events
        .iter()
        .filter_map(|e| {
            Some(TimelinePoint {
                event_id: e.event_id.clone(),
                timestamp: e.occurred_at()?,
                impact_force_g: e.calculated_values.impact_force_g,
                crash_type: e.crash_type,
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

/// The `n` newest events, newest first. Unparseable timestamps sort last.
pub fn recent(events: &[CrashEvent], n: usize) -> Vec<CrashEvent> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &CrashEvent)> =
        events.iter().map(|e| (e.occurred_at(), e)).collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    keyed.into_iter().take(n).map(|(_, e)| e.clone()).collect()
}

// ===== MAP MARKERS =====

/// A crash with display coordinates nudged apart from its neighbours.
/// The event's stored location is untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitteredMarker<'a> {
    pub event: &'a CrashEvent,
    pub display_lat: f64,
    pub display_lon: f64,
}

/// `(lat, lon)` offset for the marker at `index`: a 5×5 grid centred on the true point.
pub fn jitter_offset(index: usize) -> (f64, f64) {
    let d = JITTER_DELTA_DEGREES;
    let lat = (index % 5) as f64 * d - 2.0 * d;
    let lon = ((index / 5) % 5) as f64 * d - 2.0 * d;
    (lat, lon)
}

/// Offsets depend only on list position, so reordering the list moves markers.
pub fn jitter_positions(events: &[CrashEvent]) -> Vec<JitteredMarker<'_>> {
    events
        .iter()
        .enumerate()
        .map(|(index, event)| {
            let (offset_lat, offset_lon) = jitter_offset(index);
            JitteredMarker {
                event,
                display_lat: event.location.latitude() + offset_lat,
                display_lon: event.location.longitude() + offset_lon,
            }
        })
        .collect()
}
