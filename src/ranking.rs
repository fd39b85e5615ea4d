use crate::error::{AggregateError, Result};
use crate::model::{CatalogItem, ChartEntry, ChartId, EntryStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use time::Date;

/// Position-by-item map from the previous cycle of a single chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorPositions {
    positions: BTreeMap<String, u32>,
}

impl PriorPositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[ChartEntry]) -> Self {
        Self {
            positions: entries
                .iter()
                .map(|entry| (entry.item_id.clone(), entry.position))
                .collect(),
        }
    }

    pub fn insert(&mut self, item_id: impl Into<String>, position: u32) {
        self.positions.insert(item_id.into(), position);
    }

    pub fn get(&self, item_id: &str) -> Option<u32> {
        self.positions.get(item_id).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Ranks `candidates` for `chart` and assigns positions `1..=n`.
///
/// Candidates are expected to be pre-filtered (see [`eligible_candidates`]).
/// Duplicate ids are rejected before any entry is produced.
pub fn build_chart<'a, I>(
    candidates: I,
    chart: ChartId,
    prior: &PriorPositions,
) -> Result<Vec<ChartEntry>>
where
    I: IntoIterator<Item = &'a CatalogItem>,
{
    let mut ranked: Vec<&CatalogItem> = candidates.into_iter().collect();
    ensure_unique_ids(ranked.iter().copied())?;

    ranked.sort_by(|a, b| compare_items(a, b));

    let entries = ranked
        .into_iter()
        .zip(1_u32..)
        .map(|(item, position)| {
            let (peak_position, weeks_on_chart) = match item.chart_history.get(&chart) {
                Some(record) => (record.peak_position, record.weeks_on_chart),
                None => {
                    tracing::warn!(
                        item_id = %item.id,
                        chart = chart.key(),
                        "charting item has no history for this chart"
                    );
                    (position, 1)
                }
            };
            ChartEntry {
                position,
                item_id: item.id.clone(),
                title: item.title.clone(),
                artist: item.artist_name.clone(),
                cover_art: item.cover_art.clone(),
                status: entry_status(position, prior.get(&item.id)),
                peak_position,
                weeks_on_chart,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(chart = chart.key(), entries = entries.len(), "chart built");
    Ok(entries)
}

pub fn ensure_unique_ids<'a, I>(items: I) -> Result<()>
where
    I: IntoIterator<Item = &'a CatalogItem>,
{
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(item.id.as_str()) {
            return Err(AggregateError::DuplicateItem {
                id: item.id.clone(),
            });
        }
    }
    Ok(())
}

pub fn entry_status(position: u32, prior_position: Option<u32>) -> EntryStatus {
    match prior_position {
        None => EntryStatus::New,
        Some(prior) => match position.cmp(&prior) {
            Ordering::Less => EntryStatus::Up,
            Ordering::Greater => EntryStatus::Down,
            Ordering::Equal => EntryStatus::Same,
        },
    }
}

/// Weekly metric desc, lifetime metric desc, then title asc.
///
/// Titles compare case-insensitively first; exact title and id settle the
/// rest so the order never depends on input order.
pub fn compare_items(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.weekly_metric
        .cmp(&a.weekly_metric)
        .then(b.lifetime_metric.cmp(&a.lifetime_metric))
        .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Items that may appear on `chart` during the cycle dated `on`.
pub fn eligible_candidates<'a>(
    items: &'a [CatalogItem],
    chart: ChartId,
    on: Date,
) -> impl Iterator<Item = &'a CatalogItem> + 'a {
    items.iter().filter(move |item| {
        item.kind == chart.eligible_kind()
            && item.is_released(on)
            && item.chart_history.contains_key(&chart)
    })
}

/// Every item, charted or not, in ranking order.
pub fn full_catalog(items: &[CatalogItem]) -> Vec<&CatalogItem> {
    let mut all: Vec<&CatalogItem> = items.iter().collect();
    all.sort_by(|a, b| compare_items(a, b));
    all
}
