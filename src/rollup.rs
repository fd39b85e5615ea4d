use crate::model::{CatalogItem, ChartId, ItemKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use time::Date;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupRow {
    pub item_id: String,
    pub title: String,
    pub kind: ItemKind,
    pub overall_peak: u32,
    pub best_chart: ChartId,
    pub latest_peak_date: Option<Date>,
    pub longest_run: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBreakdown {
    pub chart: ChartId,
    pub entries: usize,
    pub number_ones: usize,
    pub top10s: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerRollup {
    pub total_charted_items: usize,
    pub number_one_count: usize,
    pub top10_count: usize,
    pub career_weekly_total: u64,
    pub career_lifetime_total: u64,
    pub longest_chart_run: u32,
    pub total_chart_weeks: u64,
    pub by_chart: Vec<ChartBreakdown>,
    pub listing: Vec<RollupRow>,
}

/// Career statistics for one artist's catalog.
///
/// Peak counts use each item's overall peak, so an item that hit #1 on two
/// charts counts once. Items without chart history only contribute to the
/// metric totals.
pub fn career_rollup(items: &[CatalogItem]) -> CareerRollup {
    let mut listing: Vec<RollupRow> = items.iter().filter_map(rollup_row).collect();
    listing.sort_by(compare_rows);

    let by_chart = ChartId::ALL
        .into_iter()
        .map(|chart| chart_breakdown(items, chart))
        .filter(|breakdown| breakdown.entries > 0)
        .collect();

    let records = items.iter().flat_map(|item| item.chart_history.values());
    let (longest_chart_run, total_chart_weeks) =
        records.fold((0_u32, 0_u64), |(longest, total), record| {
            (
                longest.max(record.weeks_on_chart),
                total.saturating_add(u64::from(record.weeks_on_chart)),
            )
        });

    CareerRollup {
        total_charted_items: listing.len(),
        number_one_count: listing.iter().filter(|row| row.overall_peak == 1).count(),
        top10_count: listing.iter().filter(|row| row.overall_peak <= 10).count(),
        career_weekly_total: items
            .iter()
            .fold(0_u64, |total, item| total.saturating_add(item.weekly_metric)),
        career_lifetime_total: items
            .iter()
            .fold(0_u64, |total, item| total.saturating_add(item.lifetime_metric)),
        longest_chart_run,
        total_chart_weeks,
        by_chart,
        listing,
    }
}

fn rollup_row(item: &CatalogItem) -> Option<RollupRow> {
    let (best_chart, best) = item
        .chart_history
        .iter()
        .min_by_key(|(_, record)| record.peak_position)?;
    Some(RollupRow {
        item_id: item.id.clone(),
        title: item.title.clone(),
        kind: item.kind,
        overall_peak: best.peak_position,
        best_chart: *best_chart,
        latest_peak_date: item.latest_peak_date(),
        longest_run: item
            .chart_history
            .values()
            .map(|record| record.weeks_on_chart)
            .max()
            .unwrap_or(0),
    })
}

fn chart_breakdown(items: &[CatalogItem], chart: ChartId) -> ChartBreakdown {
    let peaks: Vec<u32> = items
        .iter()
        .filter_map(|item| item.chart_history.get(&chart))
        .map(|record| record.peak_position)
        .collect();
    ChartBreakdown {
        chart,
        entries: peaks.len(),
        number_ones: peaks.iter().filter(|peak| **peak == 1).count(),
        top10s: peaks.iter().filter(|peak| **peak <= 10).count(),
    }
}

fn compare_rows(a: &RollupRow, b: &RollupRow) -> Ordering {
    let by_date = match (a.latest_peak_date, b.latest_peak_date) {
        (Some(a_date), Some(b_date)) => b_date.cmp(&a_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.item_id.cmp(&b.item_id))
}
