use crate::change::{PercentChange, Trend, percent_change};
use crate::error::{AggregateError, Result};
use crate::model::{ChartEntry, ChartId, ItemKind};
use crate::ranking::{build_chart, compare_items, eligible_candidates, ensure_unique_ids};
use crate::rollup::{CareerRollup, career_rollup};
use crate::snapshot::{CatalogSnapshot, PriorCharts};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use time::Date;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemChange {
    pub item_id: String,
    pub title: String,
    pub kind: ItemKind,
    pub weekly_metric: u64,
    pub last_weekly_metric: Option<u64>,
    pub change: PercentChange,
    pub trend: Trend,
}

/// Everything the screens render for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub cycle_date: Date,
    pub artist_name: String,
    pub charts: BTreeMap<ChartId, Vec<ChartEntry>>,
    pub changes: Vec<ItemChange>,
    pub rollup: CareerRollup,
}

impl WeeklyReport {
    /// Fails before producing anything if the snapshot breaks a contract.
    pub fn build(snapshot: &CatalogSnapshot, prior: &PriorCharts) -> Result<Self> {
        let _span =
            tracing::debug_span!("weekly_report", cycle = %snapshot.cycle_date).entered();
        ensure_unique_ids(&snapshot.items)?;

        let mut charts = BTreeMap::new();
        for chart in ChartId::ALL {
            let candidates = eligible_candidates(&snapshot.items, chart, snapshot.cycle_date);
            let entries = build_chart(candidates, chart, &prior.for_chart(chart))?;
            charts.insert(chart, entries);
        }

        let mut released: Vec<_> = snapshot
            .items
            .iter()
            .filter(|item| item.is_released(snapshot.cycle_date))
            .collect();
        released.sort_by(|a, b| compare_items(a, b));
        let changes = released
            .into_iter()
            .map(|item| {
                let change = percent_change(item.weekly_metric, item.last_weekly_metric);
                ItemChange {
                    item_id: item.id.clone(),
                    title: item.title.clone(),
                    kind: item.kind,
                    weekly_metric: item.weekly_metric,
                    last_weekly_metric: item.last_weekly_metric,
                    change,
                    trend: Trend::from(change),
                }
            })
            .collect::<Vec<_>>();

        let rollup = career_rollup(&snapshot.items);
        tracing::debug!(
            items = snapshot.items.len(),
            released = changes.len(),
            charted = rollup.total_charted_items,
            "report built"
        );

        Ok(Self {
            cycle_date: snapshot.cycle_date,
            artist_name: snapshot.artist_name.clone(),
            charts,
            changes,
            rollup,
        })
    }

    pub fn chart(&self, chart: ChartId) -> &[ChartEntry] {
        self.charts.get(&chart).map(Vec::as_slice).unwrap_or_default()
    }

    /// Positions to feed into the next cycle's report.
    pub fn prior_for_next_cycle(&self) -> PriorCharts {
        PriorCharts::from_charts(&self.charts)
    }

    /// Biggest percentage gains first; debuts are not movers.
    pub fn top_movers(&self, limit: usize) -> Vec<&ItemChange> {
        let mut movers: Vec<&ItemChange> = self
            .changes
            .iter()
            .filter(|change| change.trend == Trend::Rising)
            .collect();
        movers.sort_by(|a, b| {
            let a_value = a.change.value().unwrap_or(0.0);
            let b_value = b.change.value().unwrap_or(0.0);
            b_value
                .total_cmp(&a_value)
                .then_with(|| a.title.cmp(&b.title))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        movers.truncate(limit);
        movers
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| AggregateError::Json {
            origin: format!("report for {}", self.cycle_date),
            source,
        })
    }

    /// SHA-256 of the report JSON; equal snapshots give equal fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        let json = self.to_json()?;
        let digest = Sha256::digest(json.as_bytes());
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }
}

/// Replays the history oldest first so each week's statuses compare against
/// the week before, and returns the latest report.
pub fn report_from_history(history: &[CatalogSnapshot]) -> Result<Option<WeeklyReport>> {
    let mut prior = PriorCharts::default();
    let mut latest = None;
    for snapshot in history {
        let report = WeeklyReport::build(snapshot, &prior)?;
        prior = report.prior_for_next_cycle();
        latest = Some(report);
    }
    Ok(latest)
}
