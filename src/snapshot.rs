use crate::error::{AggregateError, Result};
use crate::model::{CatalogItem, ChartEntry, ChartId, ChartRecord, ItemKind};
use crate::ranking::PriorPositions;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;
use walkdir::WalkDir;

/// One week's immutable view of an artist's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSnapshot {
    pub cycle_date: Date,
    pub artist_name: String,
    pub items: Vec<CatalogItem>,
}

// Metrics may arrive as whole floats (`1500000.0`), so numbers are read as
// raw JSON numbers and checked before they reach the aggregator.
#[derive(Debug, Deserialize)]
struct RawSnapshot {
    cycle_date: Date,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: String,
    kind: ItemKind,
    title: String,
    artist_name: String,
    #[serde(default)]
    cover_art: Option<String>,
    #[serde(default)]
    release_date: Option<Date>,
    #[serde(default)]
    weekly_metric: Option<Number>,
    #[serde(default)]
    last_weekly_metric: Option<Number>,
    #[serde(default)]
    lifetime_metric: Option<Number>,
    #[serde(default)]
    chart_history: BTreeMap<ChartId, RawChartRecord>,
}

#[derive(Debug, Deserialize)]
struct RawChartRecord {
    peak_position: Number,
    #[serde(default)]
    peak_date: Option<Date>,
    weeks_on_chart: Number,
}

impl TryFrom<RawItem> for CatalogItem {
    type Error = AggregateError;

    fn try_from(raw: RawItem) -> Result<Self> {
        let weekly_metric = optional_metric(&raw.id, "weekly_metric", raw.weekly_metric.as_ref())?;
        let last_weekly_metric = raw
            .last_weekly_metric
            .as_ref()
            .map(|value| metric(&raw.id, "last_weekly_metric", value))
            .transpose()?;
        let lifetime_metric =
            optional_metric(&raw.id, "lifetime_metric", raw.lifetime_metric.as_ref())?;

        let mut chart_history = BTreeMap::new();
        for (chart, record) in raw.chart_history {
            chart_history.insert(
                chart,
                ChartRecord {
                    peak_position: counter(&raw.id, "peak_position", &record.peak_position)?,
                    peak_date: record.peak_date,
                    weeks_on_chart: counter(&raw.id, "weeks_on_chart", &record.weeks_on_chart)?,
                },
            );
        }

        Ok(Self {
            id: raw.id,
            kind: raw.kind,
            title: raw.title,
            artist_name: raw.artist_name,
            cover_art: raw.cover_art,
            release_date: raw.release_date,
            weekly_metric,
            last_weekly_metric,
            lifetime_metric,
            chart_history,
        })
    }
}

// Largest float that still names exactly one integer.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_991.0;

/// Integers are taken as written; floats only when whole and exact.
fn whole_number(value: &Number) -> Option<u64> {
    if let Some(whole) = value.as_u64() {
        return Some(whole);
    }
    let float = value.as_f64()?;
    if float.is_finite() && (0.0..=MAX_EXACT_FLOAT).contains(&float) && float.fract() == 0.0 {
        Some(float as u64)
    } else {
        None
    }
}

fn metric(item_id: &str, field: &'static str, value: &Number) -> Result<u64> {
    whole_number(value).ok_or_else(|| {
        AggregateError::invalid_metric(item_id, field, value.as_f64().unwrap_or(f64::NAN))
    })
}

fn optional_metric(item_id: &str, field: &'static str, value: Option<&Number>) -> Result<u64> {
    value.map_or(Ok(0), |value| metric(item_id, field, value))
}

fn counter(item_id: &str, field: &'static str, value: &Number) -> Result<u32> {
    whole_number(value)
        .filter(|&count| count >= 1)
        .and_then(|count| u32::try_from(count).ok())
        .ok_or_else(|| {
            AggregateError::invalid_metric(item_id, field, value.as_f64().unwrap_or(f64::NAN))
        })
}

impl CatalogSnapshot {
    pub fn from_json(raw: &str, origin: &str) -> Result<Self> {
        let parsed: RawSnapshot =
            serde_json::from_str(raw).map_err(|source| AggregateError::Json {
                origin: origin.to_string(),
                source,
            })?;
        let items = parsed
            .items
            .into_iter()
            .map(CatalogItem::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            cycle_date: parsed.cycle_date,
            artist_name: parsed.artist_name,
            items,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json(&raw, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            items = snapshot.items.len(),
            cycle = %snapshot.cycle_date,
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| AggregateError::Json {
            origin: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(|source| AggregateError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Previous-cycle positions for every chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorCharts {
    charts: BTreeMap<ChartId, PriorPositions>,
}

impl PriorCharts {
    pub fn from_charts(charts: &BTreeMap<ChartId, Vec<ChartEntry>>) -> Self {
        Self {
            charts: charts
                .iter()
                .map(|(chart, entries)| (*chart, PriorPositions::from_entries(entries)))
                .collect(),
        }
    }

    pub fn set(&mut self, chart: ChartId, positions: PriorPositions) {
        self.charts.insert(chart, positions);
    }

    pub fn for_chart(&self, chart: ChartId) -> PriorPositions {
        self.charts.get(&chart).cloned().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.values().all(PriorPositions::is_empty)
    }
}

/// A missing file means no previous cycle was recorded.
pub fn load_prior(path: &Path) -> Result<PriorCharts> {
    if !path.exists() {
        return Ok(PriorCharts::default());
    }

    let raw = fs::read_to_string(path).map_err(|source| AggregateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| AggregateError::Json {
        origin: path.display().to_string(),
        source,
    })
}

pub fn save_prior(path: &Path, prior: &PriorCharts) -> Result<()> {
    if path.exists() {
        let backup = path.with_extension("json.bak");
        fs::copy(path, &backup).map_err(|source| AggregateError::Io {
            path: backup.clone(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(prior).map_err(|source| AggregateError::Json {
        origin: path.display().to_string(),
        source,
    })?;
    fs::write(path, json).map_err(|source| AggregateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every `*.json` snapshot directly inside `dir`, oldest cycle first.
pub fn load_history(dir: &Path) -> Result<Vec<CatalogSnapshot>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| AggregateError::Scan {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();

    let mut snapshots = paths
        .iter()
        .map(|path| CatalogSnapshot::load(path))
        .collect::<Result<Vec<_>>>()?;
    snapshots.sort_by_key(|snapshot| snapshot.cycle_date);
    tracing::debug!(dir = %dir.display(), weeks = snapshots.len(), "history loaded");
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use time::macros::date;

    const SNAPSHOT: &str = r#"{
        "cycle_date": "2026-03-06",
        "artist_name": "Lil Test",
        "items": [
            {
                "id": "song-1",
                "kind": "Song",
                "title": "Cold Summer",
                "artist_name": "Lil Test",
                "release_date": "2026-02-20",
                "weekly_metric": 1500000.0,
                "last_weekly_metric": 1000000,
                "lifetime_metric": 4200000,
                "chart_history": {
                    "hot100": { "peak_position": 4, "peak_date": "2026-02-27", "weeks_on_chart": 2 }
                }
            },
            {
                "id": "album-1",
                "kind": "Album",
                "title": "Scheduled",
                "artist_name": "Lil Test"
            }
        ]
    }"#;

    #[test]
    fn parses_and_validates_items() {
        let snapshot = CatalogSnapshot::from_json(SNAPSHOT, "inline").expect("parse");

        assert_eq!(snapshot.cycle_date, date!(2026 - 03 - 06));
        assert_eq!(snapshot.items.len(), 2);
        let song = &snapshot.items[0];
        assert_eq!(song.weekly_metric, 1_500_000);
        assert_eq!(song.last_weekly_metric, Some(1_000_000));
        assert_eq!(song.chart_history[&ChartId::Hot100].peak_position, 4);
        let album = &snapshot.items[1];
        assert_eq!(album.weekly_metric, 0);
        assert_eq!(album.release_date, None);
        assert!(!album.has_charted());
    }

    #[test]
    fn negative_metric_fails_fast() {
        let raw = SNAPSHOT.replace("1500000.0", "-3");
        let err = CatalogSnapshot::from_json(&raw, "inline").expect_err("negative");
        match err {
            AggregateError::InvalidMetric { item_id, field, .. } => {
                assert_eq!(item_id, "song-1");
                assert_eq!(field, "weekly_metric");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fractional_metric_and_zero_peak_are_invalid() {
        let raw = SNAPSHOT.replace("1500000.0", "12.5");
        assert!(matches!(
            CatalogSnapshot::from_json(&raw, "inline"),
            Err(AggregateError::InvalidMetric { field: "weekly_metric", .. })
        ));

        let raw = SNAPSHOT.replace("\"peak_position\": 4", "\"peak_position\": 0");
        assert!(matches!(
            CatalogSnapshot::from_json(&raw, "inline"),
            Err(AggregateError::InvalidMetric { field: "peak_position", .. })
        ));
    }

    #[test]
    fn unknown_chart_is_a_parse_error() {
        let raw = SNAPSHOT.replace("\"hot100\"", "\"hot200\"");
        assert!(matches!(
            CatalogSnapshot::from_json(&raw, "inline"),
            Err(AggregateError::Json { .. })
        ));
    }

    #[test]
    fn snapshot_save_and_load_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("week.json");
        let snapshot = CatalogSnapshot::from_json(SNAPSHOT, "inline").expect("parse");

        snapshot.save(&path).expect("save");
        let loaded = CatalogSnapshot::load(&path).expect("load");

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn large_integers_survive_round_trip() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("week.json");
        let mut snapshot = CatalogSnapshot::from_json(SNAPSHOT, "inline").expect("parse");
        snapshot.items[0].lifetime_metric = 9_007_199_254_740_993;

        snapshot.save(&path).expect("save");
        let loaded = CatalogSnapshot::load(&path).expect("load");

        assert_eq!(loaded.items[0].lifetime_metric, 9_007_199_254_740_993);
    }

    #[test]
    fn inexact_float_metric_is_invalid() {
        let raw = SNAPSHOT.replace("1500000.0", "9007199254740993.0");
        assert!(matches!(
            CatalogSnapshot::from_json(&raw, "inline"),
            Err(AggregateError::InvalidMetric { field: "weekly_metric", .. })
        ));
    }

    #[test]
    fn missing_prior_is_empty() {
        let dir = tempdir().expect("tempdir");
        let prior = load_prior(&dir.path().join("prior.json")).expect("load");
        assert!(prior.is_empty());
    }

    #[test]
    fn prior_round_trip_keeps_backup() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("prior.json");
        let mut positions = PriorPositions::new();
        positions.insert("song-1", 3);
        let mut prior = PriorCharts::default();
        prior.set(ChartId::Hot100, positions);

        save_prior(&path, &prior).expect("save");
        save_prior(&path, &prior).expect("save again");
        let loaded = load_prior(&path).expect("load");

        assert_eq!(loaded, prior);
        assert_eq!(loaded.for_chart(ChartId::Hot100).get("song-1"), Some(3));
        assert!(loaded.for_chart(ChartId::Billboard200).is_empty());
        assert!(dir.path().join("prior.json.bak").exists());
    }

    #[test]
    fn failed_backup_keeps_previous_prior() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("prior.json");
        let backup = dir.path().join("prior.json.bak");
        fs::write(&path, "{}").expect("write");
        fs::create_dir(&backup).expect("blocking dir");

        let mut positions = PriorPositions::new();
        positions.insert("song-1", 3);
        let mut prior = PriorCharts::default();
        prior.set(ChartId::Hot100, positions);
        let err = save_prior(&path, &prior).expect_err("backup fails");

        assert!(matches!(err, AggregateError::Io { path: ref failed, .. } if *failed == backup));
        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
    }

    #[test]
    fn history_is_ordered_by_cycle_date() {
        let dir = tempdir().expect("tempdir");
        let later = SNAPSHOT.replace("2026-03-06", "2026-03-13");
        fs::write(dir.path().join("a.json"), later).expect("write");
        fs::write(dir.path().join("b.json"), SNAPSHOT).expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let history = load_history(dir.path()).expect("history");

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].cycle_date, date!(2026 - 03 - 06));
        assert_eq!(history[1].cycle_date, date!(2026 - 03 - 13));
    }
}
