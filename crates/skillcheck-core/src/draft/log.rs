//! Ordered log of pending diffs with coalescing.
//!
//! Appending never reorders existing entries. It only removes or replaces
//! them, so the log stays minimal and free of contradicting directives:
//!
//! - `UpdateSession` supersedes every earlier `UpdateSession`.
//! - `Add*(id)` cancels a pending `Remove*(id)` (and vice versa) instead of
//!   being appended. Assessees and skills are separate namespaces.
//! - `UpdateCheck` supersedes an earlier `UpdateCheck` with the same check id.

use serde::{Deserialize, Serialize};

use skillcheck_types::diff::Diff;

/// Pending diffs in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffLog {
    entries: Vec<Diff>,
}

impl DiffLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diff, coalescing it against the pending entries.
    pub fn append(&mut self, diff: Diff) {
        match diff {
            Diff::UpdateSession(_) => {
                self.entries.retain(|d| !matches!(d, Diff::UpdateSession(_)));
                self.entries.push(diff);
            }
            Diff::AddAssessee(ref id) => {
                let cancels = |d: &Diff| matches!(d, Diff::RemoveAssessee(other) if other == id);
                if !self.cancel(cancels) {
                    self.entries.push(diff);
                }
            }
            Diff::RemoveAssessee(ref id) => {
                let cancels = |d: &Diff| matches!(d, Diff::AddAssessee(other) if other == id);
                if !self.cancel(cancels) {
                    self.entries.push(diff);
                }
            }
            Diff::AddSkill(ref id) => {
                let cancels = |d: &Diff| matches!(d, Diff::RemoveSkill(other) if other == id);
                if !self.cancel(cancels) {
                    self.entries.push(diff);
                }
            }
            Diff::RemoveSkill(ref id) => {
                let cancels = |d: &Diff| matches!(d, Diff::AddSkill(other) if other == id);
                if !self.cancel(cancels) {
                    self.entries.push(diff);
                }
            }
            Diff::UpdateCheck(ref check) => {
                let id = check.id;
                self.entries.retain(|d| d.check_id() != Some(&id));
                self.entries.push(diff);
            }
        }
    }

    /// Remove every entry matching `opposite`. Returns whether any was removed.
    fn cancel(&mut self, opposite: impl Fn(&Diff) -> bool) -> bool {
        let before = self.entries.len();
        self.entries.retain(|d| !opposite(d));
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diff> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diff] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take all entries, leaving the log empty.
    pub fn take(&mut self) -> Vec<Diff> {
        std::mem::take(&mut self.entries)
    }
}

impl From<Vec<Diff>> for DiffLog {
    /// Build a log by appending each diff in order, so the result is coalesced.
    fn from(diffs: Vec<Diff>) -> Self {
        let mut log = DiffLog::new();
        for diff in diffs {
            log.append(diff);
        }
        log
    }
}

impl<'a> IntoIterator for &'a DiffLog {
    type Item = &'a Diff;
    type IntoIter = std::slice::Iter<'a, Diff>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Pure form of [`DiffLog::append`].
pub fn append_diff(log: &DiffLog, diff: Diff) -> DiffLog {
    let mut next = log.clone();
    next.append(diff);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use proptest::prelude::*;
    use skillcheck_types::check::{Check, CheckId, CompetenceLevel};
    use skillcheck_types::session::{PersonId, Session, SessionId, SessionStatus, SkillId};

    fn session(name: &str) -> Session {
        Session {
            id: SessionId::from_uuid(uuid::Uuid::nil()),
            team_id: "team-1".to_string(),
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            status: SessionStatus::Draft,
        }
    }

    fn check(id: CheckId, result: CompetenceLevel) -> Check {
        Check {
            id,
            skill_id: SkillId::from("s1"),
            assessee_id: PersonId::from("a1"),
            result,
            notes: String::new(),
            timestamp: DateTime::from_timestamp(1_773_500_000, 0).unwrap(),
        }
    }

    fn add(id: &str) -> Diff {
        Diff::AddAssessee(PersonId::from(id))
    }

    fn remove(id: &str) -> Diff {
        Diff::RemoveAssessee(PersonId::from(id))
    }

    #[test]
    fn test_session_updates_keep_only_latest() {
        let mut log = DiffLog::new();
        log.append(add("p1"));
        log.append(Diff::UpdateSession(session("first")));
        log.append(add("p2"));
        log.append(Diff::UpdateSession(session("second")));

        assert_eq!(log.len(), 3);
        assert_eq!(log.as_slice()[0], add("p1"));
        assert_eq!(log.as_slice()[1], add("p2"));
        assert_eq!(log.as_slice()[2], Diff::UpdateSession(session("second")));
    }

    #[test]
    fn test_remove_then_add_cancels() {
        let mut log = DiffLog::new();
        log.append(remove("p1"));
        log.append(add("p1"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_add_then_remove_cancels() {
        let mut log = DiffLog::new();
        log.append(add("p3"));
        log.append(remove("p3"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_assessee_and_skill_namespaces_are_independent() {
        let mut log = DiffLog::new();
        log.append(Diff::RemoveSkill(SkillId::from("x")));
        log.append(add("x"));
        assert_eq!(log.len(), 2);

        log.append(Diff::AddSkill(SkillId::from("x")));
        assert_eq!(log.as_slice(), &[add("x")]);
    }

    #[test]
    fn test_check_update_replaces_same_id_and_moves_to_end() {
        let c1 = CheckId::new();
        let c2 = CheckId::new();
        let mut log = DiffLog::new();
        log.append(Diff::UpdateCheck(check(c1, CompetenceLevel::NotCompetent)));
        log.append(Diff::UpdateCheck(check(c2, CompetenceLevel::Competent)));
        log.append(Diff::UpdateCheck(check(c1, CompetenceLevel::HighlyConfident)));

        assert_eq!(log.len(), 2);
        assert_eq!(log.as_slice()[0].check_id(), Some(&c2));
        match &log.as_slice()[1] {
            Diff::UpdateCheck(c) => {
                assert_eq!(c.id, c1);
                assert_eq!(c.result, CompetenceLevel::HighlyConfident);
            }
            other => panic!("unexpected diff: {other:?}"),
        }
    }

    #[test]
    fn test_append_diff_leaves_input_untouched() {
        let log = DiffLog::from(vec![add("p1")]);
        let next = append_diff(&log, remove("p1"));
        assert_eq!(log.len(), 1);
        assert!(next.is_empty());
    }

    #[test]
    fn test_from_vec_coalesces() {
        let log = DiffLog::from(vec![add("p1"), add("p2"), remove("p1")]);
        assert_eq!(log.as_slice(), &[add("p2")]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let log = DiffLog::from(vec![add("p1")]);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"kind": "add_assessee", "payload": "p1"}])
        );
    }

    // --- Property tests ---

    /// Small id pool so generated sequences collide often.
    fn arb_id() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
    }

    fn arb_check_ids() -> Vec<CheckId> {
        (1..=3u128).map(|n| CheckId::from_uuid(uuid::Uuid::from_u128(n))).collect()
    }

    fn arb_diff() -> impl Strategy<Value = Diff> {
        prop_oneof![
            arb_id().prop_map(|id| Diff::AddAssessee(PersonId::new(id))),
            arb_id().prop_map(|id| Diff::RemoveAssessee(PersonId::new(id))),
            arb_id().prop_map(|id| Diff::AddSkill(SkillId::new(id))),
            arb_id().prop_map(|id| Diff::RemoveSkill(SkillId::new(id))),
            "[a-z]{1,8}".prop_map(|name| Diff::UpdateSession(session(&name))),
            (prop::sample::select(arb_check_ids()), prop::sample::select(CompetenceLevel::ALL.to_vec()))
                .prop_map(|(id, level)| Diff::UpdateCheck(check(id, level))),
        ]
    }

    fn directives_for(log: &DiffLog, assessee: &PersonId) -> usize {
        log.iter()
            .filter(|d| {
                matches!(d, Diff::AddAssessee(id) | Diff::RemoveAssessee(id) if id == assessee)
            })
            .count()
    }

    proptest! {
        #[test]
        fn prop_length_never_exceeds_appends(diffs in prop::collection::vec(arb_diff(), 0..40)) {
            let n = diffs.len();
            let log = DiffLog::from(diffs);
            prop_assert!(log.len() <= n);
        }

        #[test]
        fn prop_no_conflicting_directives(diffs in prop::collection::vec(arb_diff(), 0..40)) {
            let log = DiffLog::from(diffs);
            for d in log.iter() {
                let conflict = match d {
                    Diff::AddAssessee(id) => log.iter().any(|o| matches!(o, Diff::RemoveAssessee(x) if x == id)),
                    Diff::AddSkill(id) => log.iter().any(|o| matches!(o, Diff::RemoveSkill(x) if x == id)),
                    _ => false,
                };
                prop_assert!(!conflict, "conflicting directives in {:?}", log);
            }
            let sessions = log.iter().filter(|d| matches!(d, Diff::UpdateSession(_))).count();
            prop_assert!(sessions <= 1);
            for id in arb_check_ids() {
                let updates = log.iter().filter(|d| d.check_id() == Some(&id)).count();
                prop_assert!(updates <= 1);
            }
        }

        #[test]
        fn prop_remove_then_add_is_noop(
            diffs in prop::collection::vec(arb_diff(), 0..30),
            id in arb_id(),
        ) {
            let person = PersonId::new(id);
            // Start from a log that holds at most one directive for `person`.
            let mut log = DiffLog::from(diffs);
            prop_assume!(directives_for(&log, &person) <= 1);

            let mut without_remove = log.clone();
            without_remove.entries.retain(|d| !matches!(d, Diff::RemoveAssessee(x) if *x == person));

            let had_add = log.iter().any(|d| matches!(d, Diff::AddAssessee(x) if *x == person));
            log.append(Diff::RemoveAssessee(person.clone()));
            log.append(Diff::AddAssessee(person.clone()));

            if had_add {
                // Remove cancelled the pending add, then the add is appended at the end.
                let mut expected: Vec<Diff> = without_remove
                    .iter()
                    .filter(|d| !matches!(d, Diff::AddAssessee(x) if *x == person))
                    .cloned()
                    .collect();
                expected.push(Diff::AddAssessee(person.clone()));
                prop_assert_eq!(log.as_slice(), expected.as_slice());
            } else {
                prop_assert_eq!(log, without_remove);
            }
        }

        #[test]
        fn prop_check_updates_last_write_wins(
            diffs in prop::collection::vec(arb_diff(), 0..30),
            levels in prop::collection::vec(prop::sample::select(CompetenceLevel::ALL.to_vec()), 1..6),
        ) {
            let target = CheckId::from_uuid(uuid::Uuid::from_u128(1));
            let mut log = DiffLog::from(diffs);
            let others: Vec<Diff> = log.iter().filter(|d| d.check_id() != Some(&target)).cloned().collect();

            for level in &levels {
                log.append(Diff::UpdateCheck(check(target, *level)));
            }

            let last = log.as_slice().last().cloned();
            prop_assert_eq!(last, Some(Diff::UpdateCheck(check(target, *levels.last().unwrap()))));
            let rest: Vec<Diff> = log.as_slice()[..log.len() - 1].to_vec();
            prop_assert_eq!(rest, others);
        }
    }
}
