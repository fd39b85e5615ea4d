#![no_main]

use chartcore::change::{PercentChange, percent_change};
use chartcore::model::{CatalogItem, ChartId, ItemKind};
use chartcore::ranking::{PriorPositions, build_chart};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeMap;

fuzz_target!(|data: &[u8]| {
    let items: Vec<CatalogItem> = data
        .chunks(3)
        .enumerate()
        .map(|(idx, chunk)| CatalogItem {
            id: format!("item_{idx}"),
            kind: ItemKind::Song,
            title: format!("title_{}", chunk.first().copied().unwrap_or(0) % 4),
            artist_name: String::from("fuzz"),
            cover_art: None,
            release_date: None,
            weekly_metric: u64::from(chunk.get(1).copied().unwrap_or(0) % 8),
            last_weekly_metric: chunk.get(2).map(|byte| u64::from(*byte % 4)),
            lifetime_metric: u64::from(chunk.first().copied().unwrap_or(0)),
            chart_history: BTreeMap::new(),
        })
        .collect();

    let mut prior = PriorPositions::new();
    for (idx, byte) in data.iter().enumerate().step_by(2) {
        prior.insert(format!("item_{idx}"), u32::from(*byte) + 1);
    }

    let chart = build_chart(&items, ChartId::Hot100, &prior).expect("unique ids");
    assert_eq!(chart.len(), items.len());
    for (expected, entry) in (1_u32..).zip(&chart) {
        assert_eq!(entry.position, expected);
    }

    for item in &items {
        let change = percent_change(item.weekly_metric, item.last_weekly_metric);
        if matches!(item.last_weekly_metric, None | Some(0)) {
            assert_eq!(change, PercentChange::New);
        } else {
            assert!(change.value().is_some_and(f64::is_finite));
        }
    }
});
