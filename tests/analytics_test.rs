mod common;

use std::sync::Arc;

use common::{crash, sample_fleet, with_device, with_impact};
use forensic_edr_rs::analytics::*;
use forensic_edr_rs::models::{CrashEvent, CrashType, EvidenceCustodyLog, Severity};

fn ids(events: &[CrashEvent]) -> Vec<&str> {
    events.iter().map(|e| e.event_id.as_str()).collect()
}

/// A few deterministic reorderings of `events`.
fn permutations(events: &[CrashEvent]) -> Vec<Vec<CrashEvent>> {
    let mut reversed = events.to_vec();
    reversed.reverse();
    let mut rotated = events.to_vec();
    rotated.rotate_left(2);
    let mut interleaved: Vec<CrashEvent> = events.iter().step_by(2).cloned().collect();
    interleaved.extend(events.iter().skip(1).step_by(2).cloned());
    vec![events.to_vec(), reversed, rotated, interleaved]
}

// ===== FILTERING =====

#[test]
fn test_default_criteria_pass_everything_through() {
    let fleet = sample_fleet();
    let filtered = filter(&fleet, &FilterCriteria::default());
    assert_eq!(filtered, fleet);
}

#[test]
fn test_search_matches_address_case_insensitively() {
    let events = vec![
        crash("A", Severity::Minor, CrashType::RearEndCollision, "123 Colombo Rd", "2024-01-01T00:00:00Z"),
        crash("B", Severity::Minor, CrashType::RearEndCollision, "45 Kandy St", "2024-01-01T00:00:00Z"),
    ];
    let filtered = filter(&events, &FilterCriteria::default().with_search("colombo"));
    assert_eq!(ids(&filtered), vec!["A"]);
}

#[test]
fn test_search_matches_event_id() {
    let fleet = sample_fleet();
    let filtered = filter(&fleet, &FilterCriteria::default().with_search("EVT-004"));
    assert_eq!(ids(&filtered), vec!["evt-004"]);
}

#[test]
fn test_criteria_are_combined_with_and() {
    let fleet = sample_fleet();
    let criteria = FilterCriteria::default()
        .with_severity(SeverityFilter::Only(Severity::Severe))
        .with_crash_type(CrashTypeFilter::Only(CrashType::RolloverEvent))
        .with_search("kandy");
    assert_eq!(ids(&filter(&fleet, &criteria)), vec!["evt-004"]);

    let no_match = criteria.with_search("colombo");
    assert!(filter(&fleet, &no_match).is_empty());
}

#[test]
fn test_filter_is_ordered_subset_and_idempotent() {
    let fleet = sample_fleet();
    let criteria_list = vec![
        FilterCriteria::default().with_severity(SeverityFilter::Only(Severity::Minor)),
        FilterCriteria::default().with_crash_type(CrashTypeFilter::Only(CrashType::RearEndCollision)),
        FilterCriteria::default().with_search("kandy"),
        FilterCriteria::default().with_search("zzz"),
    ];

    for criteria in criteria_list {
        let once = filter(&fleet, &criteria);

        // Subset, preserving relative order.
        let mut cursor = fleet.iter();
        for event in &once {
            assert!(cursor.any(|e| e == event), "{} out of order or missing", event.event_id);
        }

        assert_eq!(filter(&once, &criteria), once);
    }
}

#[test]
fn test_filter_does_not_touch_input() {
    let fleet = sample_fleet();
    let before = fleet.clone();
    let _ = filter(&fleet, &FilterCriteria::default().with_search("colombo"));
    assert_eq!(fleet, before);
}

#[test]
fn test_filter_parsing_from_strings() {
    assert_eq!("all".parse::<SeverityFilter>(), Ok(SeverityFilter::All));
    assert_eq!("severe".parse::<SeverityFilter>(), Ok(SeverityFilter::Only(Severity::Severe)));
    assert!("catastrophic".parse::<SeverityFilter>().is_err());
    assert_eq!(
        "rollover_event".parse::<CrashTypeFilter>(),
        Ok(CrashTypeFilter::Only(CrashType::RolloverEvent))
    );
    assert!("sideswipe".parse::<CrashTypeFilter>().is_err());
}

#[test]
fn test_filter_cycles_return_to_all() {
    let mut severity = SeverityFilter::All;
    for _ in 0..4 {
        severity = severity.cycle();
    }
    assert_eq!(severity, SeverityFilter::All);

    let mut crash_type = CrashTypeFilter::All;
    let mut seen = Vec::new();
    for _ in 0..5 {
        crash_type = crash_type.cycle();
        seen.push(crash_type);
    }
    assert_eq!(seen.last(), Some(&CrashTypeFilter::All));
    assert_eq!(seen[0], CrashTypeFilter::Only(CrashType::FrontalImpactCollision));
}

#[test]
fn test_filter_memo_reuses_result_for_same_input_and_criteria() {
    let fleet = Arc::new(sample_fleet());
    let criteria = FilterCriteria::default().with_search("kandy");
    let mut memo = FilterMemo::new();

    let first = memo.get(&fleet, &criteria);
    let second = memo.get(&fleet, &criteria);
    assert!(Arc::ptr_eq(&first, &second));

    let refetched = Arc::new(sample_fleet());
    let third = memo.get(&refetched, &criteria);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(first, third);

    let other = memo.get(&refetched, &FilterCriteria::default());
    assert_eq!(other.len(), refetched.len());
}

// ===== KPIS =====

#[test]
fn test_kpis_on_empty_input_report_no_value() {
    let kpis = compute_kpis(&[]);
    assert_eq!(kpis.total, 0);
    assert_eq!(kpis.severe_count, 0);
    assert_eq!(kpis.distinct_device_count, 0);
    assert_eq!(kpis.avg_impact_force_g, None);
    assert_eq!(kpis.peak_speed, None);
}

#[test]
fn test_kpis_for_sample_fleet() {
    let kpis = compute_kpis(&sample_fleet());
    assert_eq!(kpis.total, 5);
    assert_eq!(kpis.severe_count, 2);
    assert_eq!(kpis.distinct_device_count, 5);
    let avg = kpis.avg_impact_force_g.expect("average present");
    assert!((avg - 6.34).abs() < 1e-9, "avg was {}", avg);
    assert_eq!(kpis.peak_speed, Some(97.2));
}

#[test]
fn test_kpis_severity_example() {
    let events = vec![
        crash("1", Severity::Minor, CrashType::RearEndCollision, "", "2024-01-01T00:00:00Z"),
        crash("2", Severity::Severe, CrashType::RearEndCollision, "", "2024-01-01T00:00:00Z"),
        crash("3", Severity::Severe, CrashType::RearEndCollision, "", "2024-01-01T00:00:00Z"),
    ];
    let kpis = compute_kpis(&events);
    assert_eq!(kpis.total, 3);
    assert_eq!(kpis.severe_count, 2);

    let by_severity = severity_distribution(&events);
    assert_eq!(by_severity.len(), 2);
    assert_eq!(by_severity.get(&Severity::Minor), 1);
    assert_eq!(by_severity.get(&Severity::Severe), 2);
    assert_eq!(by_severity.get(&Severity::Moderate), 0);
}

#[test]
fn test_kpis_are_permutation_invariant() {
    let fleet = vec![
        with_impact(crash("a", Severity::Minor, CrashType::RearEndCollision, "", ""), 0.1, 10.0),
        with_impact(crash("b", Severity::Severe, CrashType::RearEndCollision, "", ""), 0.2, 30.0),
        with_impact(crash("c", Severity::Moderate, CrashType::RearEndCollision, "", ""), 0.3, 20.0),
        with_impact(crash("d", Severity::Severe, CrashType::RearEndCollision, "", ""), 1e-17, 5.0),
    ];
    let expected = compute_kpis(&fleet);
    for permutation in permutations(&fleet) {
        let kpis = compute_kpis(&permutation);
        assert_eq!(kpis, expected);
        assert_eq!(
            kpis.avg_impact_force_g.map(f64::to_bits),
            expected.avg_impact_force_g.map(f64::to_bits)
        );
    }
}

#[test]
fn test_non_finite_speed_text_never_becomes_peak() {
    let events: Vec<CrashEvent> = serde_json::from_value(serde_json::json!([
        { "event_id": "a", "calculated_values": { "speed_previous": "NaN", "impact_force_g": "NaN" } },
        { "event_id": "b", "calculated_values": { "speed_previous": 80, "impact_force_g": 2.0 } }
    ]))
    .unwrap();

    let kpis = compute_kpis(&events);
    assert_eq!(kpis.peak_speed, Some(80.0));
    assert_eq!(kpis.avg_impact_force_g, Some(1.0));
}

#[test]
fn test_distinct_devices_ignore_duplicates_and_blanks() {
    let events = vec![
        with_device(crash("1", Severity::Minor, CrashType::RearEndCollision, "", ""), "DEV-A"),
        with_device(crash("2", Severity::Minor, CrashType::RearEndCollision, "", ""), "DEV-A"),
        with_device(crash("3", Severity::Minor, CrashType::RearEndCollision, "", ""), "DEV-B"),
        with_device(crash("4", Severity::Minor, CrashType::RearEndCollision, "", ""), ""),
    ];
    assert_eq!(compute_kpis(&events).distinct_device_count, 2);
}

#[test]
fn test_verified_share() {
    assert_eq!(verified_share(&[]), None);

    let logs: Vec<EvidenceCustodyLog> = (0..4)
        .map(|i| EvidenceCustodyLog {
            entry_id: format!("E{}", i),
            verified: i != 3,
            ..Default::default()
        })
        .collect();
    assert_eq!(verified_share(&logs), Some(0.75));
}

// ===== GROUPING =====

#[test]
fn test_group_count_totals_equal_input_length() {
    let fleet = sample_fleet();
    assert_eq!(severity_distribution(&fleet).total(), fleet.len());
    assert_eq!(crash_type_distribution(&fleet).total(), fleet.len());
    assert_eq!(hotspots(&fleet).total(), fleet.len());
    assert_eq!(group_count(&fleet, |e| e.event_id.len()).total(), fleet.len());
    assert_eq!(severity_distribution(&[]).total(), 0);
}

#[test]
fn test_group_count_keeps_first_encounter_order() {
    let fleet = sample_fleet();
    let order: Vec<Severity> = severity_distribution(&fleet).iter().map(|(s, _)| *s).collect();
    assert_eq!(order, vec![Severity::Minor, Severity::Severe, Severity::Moderate]);
}

#[test]
fn test_hotspot_uses_first_address_token() {
    let fleet = sample_fleet();
    let spots = hotspots(&fleet);
    assert_eq!(spots.get(&"45 Kandy St".to_string()), 2);
    assert_eq!(spots.get(&"123 Colombo Rd".to_string()), 1);
    assert_eq!(top_hotspot(&fleet), Some(("45 Kandy St".to_string(), 2)));
}

#[test]
fn test_ranking_ties_go_to_first_encountered() {
    let events = vec![
        crash("1", Severity::Minor, CrashType::RearEndCollision, "Galle, South", ""),
        crash("2", Severity::Minor, CrashType::RearEndCollision, "Jaffna, North", ""),
        crash("3", Severity::Minor, CrashType::RearEndCollision, "Jaffna, North", ""),
        crash("4", Severity::Minor, CrashType::RearEndCollision, "Galle, South", ""),
        crash("5", Severity::Minor, CrashType::RearEndCollision, "Matara", ""),
    ];
    let ranked = hotspots(&events).ranked();
    assert_eq!(
        ranked,
        vec![
            ("Galle".to_string(), 2),
            ("Jaffna".to_string(), 2),
            ("Matara".to_string(), 1),
        ]
    );

    for _ in 0..10 {
        assert_eq!(top_hotspot(&events), Some(("Galle".to_string(), 2)));
    }
}

#[test]
fn test_top_hotspot_skips_blank_addresses() {
    let events = vec![
        crash("1", Severity::Minor, CrashType::RearEndCollision, "", ""),
        crash("2", Severity::Minor, CrashType::RearEndCollision, "", ""),
        crash("3", Severity::Minor, CrashType::RearEndCollision, "Matara", ""),
    ];
    assert_eq!(top_hotspot(&events), Some(("Matara".to_string(), 1)));
    assert_eq!(top_hotspot(&[]), None);
}

// ===== TIMELINE =====

#[test]
fn test_timeline_is_sorted_for_any_permutation() {
    let fleet = sample_fleet();
    for permutation in permutations(&fleet) {
        let timeline = build_timeline(&permutation);
        assert_eq!(timeline.len(), fleet.len());
        assert!(timeline.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}

#[test]
fn test_timeline_is_stable_for_equal_instants() {
    let fleet = sample_fleet();
    // EVT-001 and EVT-003 share a timestamp.
    let timeline = build_timeline(&fleet);
    let tied: Vec<&str> = timeline
        .iter()
        .filter(|p| p.event_id == "EVT-001" || p.event_id == "EVT-003")
        .map(|p| p.event_id.as_str())
        .collect();
    assert_eq!(tied, vec!["EVT-001", "EVT-003"]);

    let mut reversed = fleet.clone();
    reversed.reverse();
    let timeline = build_timeline(&reversed);
    let tied: Vec<&str> = timeline
        .iter()
        .filter(|p| p.event_id == "EVT-001" || p.event_id == "EVT-003")
        .map(|p| p.event_id.as_str())
        .collect();
    assert_eq!(tied, vec!["EVT-003", "EVT-001"]);
}

#[test]
fn test_timeline_compares_instants_not_strings() {
    let events = vec![
        crash("utc", Severity::Minor, CrashType::RearEndCollision, "", "2024-03-02T06:00:00Z"),
        // 05:30 UTC, earlier despite the larger local clock time.
        crash("colombo", Severity::Minor, CrashType::RearEndCollision, "", "2024-03-02T11:00:00+05:30"),
    ];
    let timeline = build_timeline(&events);
    assert_eq!(timeline[0].event_id, "colombo");
    assert_eq!(timeline[1].event_id, "utc");
}

#[test]
fn test_timeline_skips_unparseable_timestamps() {
    let events = vec![
        crash("ok", Severity::Minor, CrashType::RearEndCollision, "", "2024-03-02T06:00:00Z"),
        crash("bad", Severity::Minor, CrashType::RearEndCollision, "", "yesterday"),
        crash("empty", Severity::Minor, CrashType::RearEndCollision, "", ""),
    ];
    let timeline = build_timeline(&events);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].event_id, "ok");
}

#[test]
fn test_recent_returns_newest_first() {
    let fleet = sample_fleet();
    let newest = recent(&fleet, 2);
    assert_eq!(ids(&newest), vec!["evt-004", "EVT-001"]);
    assert_eq!(recent(&fleet, 50).len(), fleet.len());
    assert!(recent(&[], 5).is_empty());
}

// ===== MAP MARKERS =====

#[test]
fn test_jitter_offsets_follow_index_grid() {
    let d = JITTER_DELTA_DEGREES;
    assert_eq!(jitter_offset(0), (-2.0 * d, -2.0 * d));
    assert_eq!(jitter_offset(4), (4.0 * d - 2.0 * d, -2.0 * d));
    assert_eq!(jitter_offset(12), (2.0 * d - 2.0 * d, 2.0 * d - 2.0 * d));

    let (lat_5, lon_5) = jitter_offset(5);
    let (lat_10, lon_10) = jitter_offset(10);
    assert_eq!(lat_5, lat_10);
    assert_ne!(lon_5, lon_10);

    // The grid wraps every 25 markers.
    assert_eq!(jitter_offset(3), jitter_offset(28));
}

#[test]
fn test_jitter_is_deterministic_and_leaves_locations_alone() {
    let fleet: Vec<CrashEvent> = (0..12)
        .map(|i| crash(&format!("E{}", i), Severity::Minor, CrashType::RearEndCollision, "Same spot", ""))
        .collect();
    let before = fleet.clone();

    let first: Vec<(u64, u64)> = jitter_positions(&fleet)
        .iter()
        .map(|m| (m.display_lat.to_bits(), m.display_lon.to_bits()))
        .collect();
    let second: Vec<(u64, u64)> = jitter_positions(&fleet)
        .iter()
        .map(|m| (m.display_lat.to_bits(), m.display_lon.to_bits()))
        .collect();
    assert_eq!(first, second);
    assert_eq!(fleet, before);

    // Colocated markers end up at distinct display positions.
    let mut unique = first.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), fleet.len());
}

#[test]
fn test_jitter_tracks_list_position_not_identity() {
    let fleet = sample_fleet();
    let mut reversed = fleet.clone();
    reversed.reverse();

    let lat_of = |markers: &[JitteredMarker<'_>], id: &str| {
        markers.iter().find(|m| m.event.event_id == id).map(|m| m.display_lat)
    };
    // EVT-001 sits at index 0 in one list and index 4 in the other.
    let original = jitter_positions(&fleet);
    let moved = jitter_positions(&reversed);
    assert_ne!(lat_of(&original, "EVT-001"), lat_of(&moved, "EVT-001"));
}
