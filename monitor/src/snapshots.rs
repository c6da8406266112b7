//! Reduction of irregularly dated snapshots to one snapshot per month.
//!
//! Snapshot keys start with an ISO date (`YYYY-MM-DD`), optionally followed
//! by a path. ISO dates sort chronologically as plain strings, so the latest
//! snapshot of a month is simply the lexicographic maximum of its keys.

use std::collections::BTreeMap;

/// Length of the `YYYY-MM` prefix.
const MONTH_PREFIX_LEN: usize = 7;

/// Returns the `YYYY-MM` prefix of a snapshot key, if it has one.
pub fn month_of(key: &str) -> Option<&str> {
    key.get(..MONTH_PREFIX_LEN)
}

/// Maps every month present in `keys` to the latest key of that month.
///
/// Keys shorter than a month prefix are ignored. The returned map iterates in
/// chronological order.
pub fn latest_day_of_each_month<I, S>(keys: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut latest: BTreeMap<String, String> = BTreeMap::new();

    for key in keys {
        let key = key.as_ref();
        let Some(month) = month_of(key) else {
            tracing::debug!(key, "Skipping snapshot key without a month prefix");
            continue;
        };

        match latest.get_mut(month) {
            Some(current) if current.as_str() >= key => {}
            Some(current) => *current = key.to_string(),
            None => {
                latest.insert(month.to_string(), key.to_string());
            }
        }
    }

    latest
}

/// `YYYY-MM-DD...` → `YYYY-MM-01`, used to align monthly x axes.
pub fn first_day_same_month(key: &str) -> String {
    match month_of(key) {
        Some(month) => format!("{month}-01"),
        None => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_latest_day_per_month() {
        let latest = latest_day_of_each_month(["2024-01-05", "2024-01-20", "2024-02-01"]);

        assert_eq!(latest.len(), 2);
        assert_eq!(latest["2024-01"], "2024-01-20");
        assert_eq!(latest["2024-02"], "2024-02-01");
    }

    #[test]
    fn input_order_is_irrelevant() {
        let forward = latest_day_of_each_month(["2023-12-01", "2023-12-31", "2024-01-02"]);
        let backward = latest_day_of_each_month(["2024-01-02", "2023-12-31", "2023-12-01"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        let latest = latest_day_of_each_month(Vec::<String>::new());
        assert!(latest.is_empty());
    }

    #[test]
    fn path_keys_keep_their_suffix() {
        let latest = latest_day_of_each_month([
            "2024-03-01/stats.json",
            "2024-03-15/stats.json",
            "2024-04-02/stats.json",
        ]);
        assert_eq!(latest["2024-03"], "2024-03-15/stats.json");
        assert_eq!(latest["2024-04"], "2024-04-02/stats.json");
    }

    #[test]
    fn iterates_months_chronologically() {
        let latest = latest_day_of_each_month(["2024-02-10", "2023-11-03", "2024-01-07"]);
        let months: Vec<_> = latest.keys().cloned().collect();
        assert_eq!(months, vec!["2023-11", "2024-01", "2024-02"]);
    }

    #[test]
    fn one_entry_per_distinct_month_and_it_is_the_maximum() {
        let days: Vec<String> = (1..=28)
            .rev()
            .flat_map(|d| {
                ["2022-06", "2022-07", "2023-06"]
                    .into_iter()
                    .map(move |m| format!("{m}-{d:02}"))
            })
            .collect();

        let latest = latest_day_of_each_month(&days);
        assert_eq!(latest.len(), 3);
        for (month, day) in &latest {
            let max = days.iter().filter(|d| d.starts_with(month.as_str())).max();
            assert_eq!(Some(day), max);
        }
    }

    #[test]
    fn short_keys_are_skipped() {
        let latest = latest_day_of_each_month(["2024", "2024-05-01"]);
        assert_eq!(latest.len(), 1);
    }

    #[test]
    fn first_day_of_month() {
        assert_eq!(first_day_same_month("2024-05-17"), "2024-05-01");
        assert_eq!(first_day_same_month("2024-05-17T10:00:00"), "2024-05-01");
    }
}
