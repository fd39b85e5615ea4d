use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Song,
    Album,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Song => "Song",
            Self::Album => "Album",
        }
    }

    /// Name of the consumption metric shown next to the item.
    pub fn metric_label(self) -> &'static str {
        match self {
            Self::Song => "streams",
            Self::Album => "units",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChartId {
    #[serde(rename = "hot100")]
    Hot100,
    #[serde(rename = "billboard200")]
    Billboard200,
    #[serde(rename = "bubblingUnderHot50")]
    BubblingUnderHot50,
}

impl ChartId {
    pub const ALL: [ChartId; 3] = [Self::Hot100, Self::Billboard200, Self::BubblingUnderHot50];

    pub fn key(self) -> &'static str {
        match self {
            Self::Hot100 => "hot100",
            Self::Billboard200 => "billboard200",
            Self::BubblingUnderHot50 => "bubblingUnderHot50",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hot100 => "Hot 100",
            Self::Billboard200 => "Billboard 200",
            Self::BubblingUnderHot50 => "Bubbling Under Hot 50",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|chart| chart.key() == key)
    }

    pub fn eligible_kind(self) -> ItemKind {
        match self {
            Self::Hot100 | Self::BubblingUnderHot50 => ItemKind::Song,
            Self::Billboard200 => ItemKind::Album,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub peak_position: u32,
    #[serde(default)]
    pub peak_date: Option<Date>,
    pub weeks_on_chart: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    pub artist_name: String,
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub release_date: Option<Date>,
    pub weekly_metric: u64,
    #[serde(default)]
    pub last_weekly_metric: Option<u64>,
    pub lifetime_metric: u64,
    #[serde(default)]
    pub chart_history: BTreeMap<ChartId, ChartRecord>,
}

impl CatalogItem {
    pub fn has_charted(&self) -> bool {
        !self.chart_history.is_empty()
    }

    /// Scheduled items carry no release date and are never released.
    pub fn is_released(&self, on: Date) -> bool {
        self.release_date.is_some_and(|date| date <= on)
    }

    /// Best peak across every chart the item has appeared on.
    pub fn overall_peak(&self) -> Option<u32> {
        self.chart_history
            .values()
            .map(|record| record.peak_position)
            .min()
    }

    /// Latest date on which any of the item's peaks was reached.
    pub fn latest_peak_date(&self) -> Option<Date> {
        self.chart_history
            .values()
            .filter_map(|record| record.peak_date)
            .max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Up,
    Down,
    New,
    Same,
}

impl EntryStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::New => "new",
            Self::Same => "same",
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Self::Up => "▲",
            Self::Down => "▼",
            Self::New => "NEW",
            Self::Same => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    pub position: u32,
    pub item_id: String,
    pub title: String,
    pub artist: String,
    pub cover_art: Option<String>,
    pub status: EntryStatus,
    pub peak_position: u32,
    pub weeks_on_chart: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn item_with_history(history: &[(ChartId, u32, Option<Date>)]) -> CatalogItem {
        CatalogItem {
            id: String::from("song-1"),
            kind: ItemKind::Song,
            title: String::from("Cold Summer"),
            artist_name: String::from("Lil Test"),
            cover_art: None,
            release_date: Some(date!(2026 - 01 - 02)),
            weekly_metric: 10,
            last_weekly_metric: None,
            lifetime_metric: 10,
            chart_history: history
                .iter()
                .map(|(chart, peak, peak_date)| {
                    (
                        *chart,
                        ChartRecord {
                            peak_position: *peak,
                            peak_date: *peak_date,
                            weeks_on_chart: 1,
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn chart_keys_round_trip() {
        for chart in ChartId::ALL {
            assert_eq!(ChartId::from_key(chart.key()), Some(chart));
        }
        assert_eq!(ChartId::from_key("hot200"), None);
    }

    #[test]
    fn chart_history_serializes_with_chart_keys() {
        let item = item_with_history(&[(ChartId::BubblingUnderHot50, 4, None)]);
        let json = serde_json::to_string(&item).expect("serialize");
        assert!(json.contains("\"bubblingUnderHot50\""));
        let back: CatalogItem = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, item);
    }

    #[test]
    fn overall_peak_takes_best_chart() {
        let item = item_with_history(&[
            (ChartId::Hot100, 12, None),
            (ChartId::BubblingUnderHot50, 3, None),
        ]);
        assert_eq!(item.overall_peak(), Some(3));
        assert!(item.has_charted());
    }

    #[test]
    fn unreleased_without_date() {
        let mut item = item_with_history(&[]);
        assert!(item.is_released(date!(2026 - 01 - 02)));
        assert!(!item.is_released(date!(2026 - 01 - 01)));
        item.release_date = None;
        assert!(!item.is_released(date!(2030 - 01 - 01)));
        assert_eq!(item.overall_peak(), None);
    }

    #[test]
    fn latest_peak_date_ignores_missing_dates() {
        let item = item_with_history(&[
            (ChartId::Hot100, 12, Some(date!(2026 - 03 - 01))),
            (ChartId::BubblingUnderHot50, 3, None),
        ]);
        assert_eq!(item.latest_peak_date(), Some(date!(2026 - 03 - 01)));
    }
}
