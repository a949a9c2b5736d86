use crate::{DoseLogEntry, LogsByMedication};
use chrono::{DateTime, Utc};

/// Entries taken within `[from, to]` (either bound optional, both inclusive),
/// newest first. Entries sharing an instant are ordered by id.
pub fn logs_between(
    logs: &[DoseLogEntry],
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Vec<DoseLogEntry> {
    let mut selected: Vec<DoseLogEntry> = logs
        .iter()
        .filter(|log| within(log.taken_at, from, to))
        .cloned()
        .collect();

    selected.sort_by(|a, b| {
        b.taken_at
            .cmp(&a.taken_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    selected
}

fn within(
    instant: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if matches!(from, Some(from) if instant < from) {
        return false;
    }
    !matches!(to, Some(to) if instant > to)
}

/// Split a flat log export into per-medication log sets.
pub fn group_by_medication(logs: impl IntoIterator<Item = DoseLogEntry>) -> LogsByMedication {
    let mut grouped = LogsByMedication::new();
    for log in logs {
        grouped
            .entry(log.medication_id.clone())
            .or_default()
            .push(log);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogId, MedicationId};

    fn instant(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn dose(id: i64, medication: i64, taken_at: &str) -> DoseLogEntry {
        DoseLogEntry::new(id, medication, instant(taken_at))
    }

    #[test]
    fn test_logs_between_inclusive_bounds() {
        let logs = vec![
            dose(1, 1, "2024-06-10T08:00:00Z"),
            dose(2, 1, "2024-06-12T08:00:00Z"),
            dose(3, 1, "2024-06-14T08:00:00Z"),
        ];
        let selected = logs_between(
            &logs,
            Some(instant("2024-06-10T08:00:00Z")),
            Some(instant("2024-06-12T08:00:00Z")),
        );

        let ids: Vec<String> = selected.iter().map(|l| l.id.to_string()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_logs_between_open_bounds_newest_first() {
        let logs = vec![
            dose(1, 1, "2024-06-10T08:00:00Z"),
            dose(3, 1, "2024-06-14T08:00:00Z"),
            dose(2, 1, "2024-06-12T08:00:00Z"),
        ];

        let all = logs_between(&logs, None, None);
        let ids: Vec<String> = all.iter().map(|l| l.id.to_string()).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);

        let since = logs_between(&logs, Some(instant("2024-06-11T00:00:00Z")), None);
        assert_eq!(since.len(), 2);

        let until = logs_between(&logs, None, Some(instant("2024-06-11T00:00:00Z")));
        assert_eq!(until.len(), 1);
    }

    #[test]
    fn test_logs_between_ties_ordered_by_id() {
        let logs = vec![
            dose(5, 1, "2024-06-10T08:00:00Z"),
            dose(2, 1, "2024-06-10T08:00:00Z"),
        ];
        let selected = logs_between(&logs, None, None);
        assert_eq!(selected[0].id, LogId::Int(2));
        assert_eq!(selected[1].id, LogId::Int(5));
    }

    #[test]
    fn test_group_by_medication() {
        let grouped = group_by_medication(vec![
            dose(1, 2, "2024-06-10T08:00:00Z"),
            dose(2, 1, "2024-06-11T08:00:00Z"),
            dose(3, 2, "2024-06-12T08:00:00Z"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&MedicationId::Int(1)].len(), 1);
        assert_eq!(grouped[&MedicationId::Int(2)].len(), 2);
    }
}
