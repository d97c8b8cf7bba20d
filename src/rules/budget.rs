use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Limit applied when no row or bucket resolves.
pub const DEFAULT_POWER_LIMIT: u32 = 4;

/// Power limits keyed by rank, then by a selection-diversity bucket. Buckets
/// are exact counts ("1".."5"), the open low bucket "<=1" or open high
/// buckets like "3+". Loadable from JSON; `default()` is the reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PowerLimitMatrix {
    rows: BTreeMap<u8, BTreeMap<String, u32>>,
}

impl Default for PowerLimitMatrix {
    fn default() -> Self {
        let mut rows = BTreeMap::new();
        rows.insert(1, row(&[("<=1", 4)]));
        rows.insert(2, row(&[("1", 9), ("2+", 8)]));
        rows.insert(3, row(&[("1", 14), ("2", 13), ("3+", 12)]));
        rows.insert(4, row(&[("1", 19), ("2", 18), ("3", 17), ("4+", 16)]));
        rows.insert(
            5,
            row(&[("1", 24), ("2", 23), ("3", 22), ("4", 21), ("5+", 20)]),
        );
        rows.insert(
            6,
            row(&[
                ("1", 26),
                ("2", 25),
                ("3", 24),
                ("4", 23),
                ("5", 22),
                ("6+", 21),
            ]),
        );
        Self { rows }
    }
}

fn row(buckets: &[(&str, u32)]) -> BTreeMap<String, u32> {
    buckets
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

impl PowerLimitMatrix {
    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    /// Maximum number of powers for a rank and a count of distinct non-Basic
    /// power sets already chosen. Bucket precedence: exact count, then the
    /// "<=1" bucket when the count is 1 or less, then the largest satisfied
    /// "N+" bucket, then whatever bucket the row has, then the default of 4.
    pub fn power_limit(&self, rank: u8, distinct_group_count: usize) -> u32 {
        let Some(buckets) = self.rows.get(&rank) else {
            return DEFAULT_POWER_LIMIT;
        };

        if let Some(limit) = buckets.get(&distinct_group_count.to_string()) {
            return *limit;
        }
        if distinct_group_count <= 1 {
            if let Some(limit) = buckets.get("<=1") {
                return *limit;
            }
        }
        let mut open: Vec<(usize, u32)> = buckets
            .iter()
            .filter_map(|(key, limit)| {
                key.strip_suffix('+')
                    .and_then(|n| n.parse().ok())
                    .map(|threshold| (threshold, *limit))
            })
            .collect();
        open.sort_by(|a, b| b.0.cmp(&a.0));
        for (threshold, limit) in open {
            if distinct_group_count >= threshold {
                return limit;
            }
        }
        buckets
            .values()
            .next()
            .copied()
            .unwrap_or(DEFAULT_POWER_LIMIT)
    }
}
