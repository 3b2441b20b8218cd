//! Allocation arena.
//!
//! [`Roster`] owns every participant and activity instance of a run and is
//! the only place where assignments change. Each mutation updates both the
//! participant record and the instance enrollment, so the two views never
//! drift apart.
//!
//! Participants are addressed by their position (stable for the life of a
//! run) or by ID; instances by [`InstanceKey`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

use super::{
    ActivityCatalog, ActivityInstance, Assignment, AssignmentMethod, InstanceKey, Participant,
};
use crate::error::{AllocationError, AllocationResult};

/// Participants and activity instances for one allocation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RosterData")]
pub struct Roster {
    participants: Vec<Participant>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(with = "instance_list")]
    instances: BTreeMap<InstanceKey, ActivityInstance>,
}

/// Serialized form; the ID index is rebuilt on load.
#[derive(Deserialize)]
struct RosterData {
    participants: Vec<Participant>,
    #[serde(with = "instance_list")]
    instances: BTreeMap<InstanceKey, ActivityInstance>,
}

impl From<RosterData> for Roster {
    fn from(data: RosterData) -> Self {
        let mut roster = Self {
            participants: data.participants,
            index: HashMap::new(),
            instances: data.instances,
        };
        roster.reindex();
        roster
    }
}

/// Instances serialize as a list; keys are rebuilt on load.
mod instance_list {
    use super::*;

    pub fn serialize<S: Serializer>(
        instances: &BTreeMap<InstanceKey, ActivityInstance>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(instances.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<InstanceKey, ActivityInstance>, D::Error> {
        let list = Vec::<ActivityInstance>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|i| (i.key(), i)).collect())
    }
}

impl Roster {
    /// Builds a roster from a catalog and participants.
    ///
    /// Duplicate participant IDs keep the first record. Pre-existing
    /// assignments are enrolled when the instance exists and has room and
    /// the activity is not repeated; otherwise they are dropped.
    pub fn new(catalog: &ActivityCatalog, participants: Vec<Participant>) -> Self {
        let mut instances = BTreeMap::new();
        for (period, activities) in &catalog.periods {
            for (activity, spec) in activities {
                let instance = ActivityInstance::new(activity, period, *spec);
                instances.insert(instance.key(), instance);
            }
        }

        let mut roster = Self {
            participants: Vec::with_capacity(participants.len()),
            index: HashMap::new(),
            instances,
        };

        for mut participant in participants {
            if roster.index.contains_key(&participant.id) {
                warn!(participant = %participant.id, "duplicate participant ignored");
                continue;
            }
            let carried = std::mem::take(&mut participant.assignments);
            let idx = roster.participants.len();
            roster.index.insert(participant.id.clone(), idx);
            roster.participants.push(participant);

            for (period, assignment) in carried {
                if !assignment.method.is_assigned() {
                    continue;
                }
                if let Err(err) = roster.assign(idx, &period, &assignment.activity, assignment.method) {
                    warn!(%err, "pre-existing assignment dropped");
                }
            }
        }

        roster
    }

    fn reindex(&mut self) {
        self.index = self
            .participants
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id.clone(), idx))
            .collect();
    }

    // --- Participants ---

    /// All participants in insertion order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Participant at a position.
    ///
    /// # Panics
    /// Panics if `idx` is out of range; use [`Roster::get_participant`]
    /// for a checked lookup.
    pub fn participant(&self, idx: usize) -> &Participant {
        &self.participants[idx]
    }

    /// Participant at a position, if any.
    pub fn get_participant(&self, idx: usize) -> Option<&Participant> {
        self.participants.get(idx)
    }

    /// Position of a participant by ID.
    pub fn participant_index(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Participant by ID.
    pub fn participant_by_id(&self, id: &str) -> Option<&Participant> {
        self.participant_index(id).map(|idx| &self.participants[idx])
    }

    /// Number of participants.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Removes a participant, withdrawing all enrollments.
    pub fn remove_participant(&mut self, id: &str) -> Option<Participant> {
        let idx = self.participant_index(id)?;
        let periods: Vec<String> = self.participants[idx].assignments.keys().cloned().collect();
        for period in periods {
            self.unassign(idx, &period);
        }
        let removed = self.participants.remove(idx);
        self.reindex();
        Some(removed)
    }

    /// Longest preference list of any participant in any period.
    pub fn max_preference_len(&self) -> usize {
        self.participants
            .iter()
            .map(Participant::max_preference_len)
            .max()
            .unwrap_or(0)
    }

    fn participant_mut(&mut self, idx: usize) -> AllocationResult<&mut Participant> {
        self.participants
            .get_mut(idx)
            .ok_or_else(|| AllocationError::UnknownParticipant(format!("#{idx}")))
    }

    /// Appends a weekly score to a participant's history.
    pub fn push_score(&mut self, idx: usize, score: u32) -> AllocationResult<()> {
        self.participant_mut(idx)?.score_history.push(score);
        Ok(())
    }

    /// Replaces the most recent weekly score (appends when history is empty).
    pub fn replace_latest_score(&mut self, idx: usize, score: u32) -> AllocationResult<()> {
        let history = &mut self.participant_mut(idx)?.score_history;
        match history.last_mut() {
            Some(last) => *last = score,
            None => history.push(score),
        }
        Ok(())
    }

    /// Sets the missed-first-choice flag read by the next run.
    pub fn set_missed_first_choice(&mut self, idx: usize, missed: bool) -> AllocationResult<()> {
        self.participant_mut(idx)?.missed_first_choice = missed;
        Ok(())
    }

    /// Relabels the method of an existing assignment; no-op when the period is empty.
    pub fn set_method(
        &mut self,
        idx: usize,
        period: &str,
        method: AssignmentMethod,
    ) -> AllocationResult<()> {
        if let Some(assignment) = self.participant_mut(idx)?.assignments.get_mut(period) {
            assignment.method = method;
        }
        Ok(())
    }

    // --- Instances ---

    /// All instances, ordered by period then activity.
    pub fn instances(&self) -> impl Iterator<Item = &ActivityInstance> {
        self.instances.values()
    }

    /// Instances offered in a period, ordered by activity.
    pub fn instances_in<'a>(&'a self, period: &'a str) -> impl Iterator<Item = &'a ActivityInstance> + 'a {
        self.instances.values().filter(move |i| i.period == period)
    }

    /// Instances of an activity across periods.
    pub fn instances_of<'a>(&'a self, activity: &'a str) -> impl Iterator<Item = &'a ActivityInstance> + 'a {
        self.instances.values().filter(move |i| i.activity == activity)
    }

    /// Instance lookup.
    pub fn instance(&self, period: &str, activity: &str) -> Option<&ActivityInstance> {
        self.instances.get(&InstanceKey::new(period, activity))
    }

    /// Whether the activity is offered in the period.
    pub fn is_offered(&self, period: &str, activity: &str) -> bool {
        self.instance(period, activity).is_some()
    }

    /// Whether the activity is offered in the period and has a free seat.
    pub fn has_room(&self, period: &str, activity: &str) -> bool {
        self.instance(period, activity)
            .is_some_and(|i| !i.is_full())
    }

    /// Distinct activity identifiers across all periods, sorted.
    pub fn activity_names(&self) -> BTreeSet<String> {
        self.instances.keys().map(|k| k.activity.clone()).collect()
    }

    // --- Mutation ---

    /// Assigns a participant to an activity for a period.
    ///
    /// # Errors
    /// Fails if the instance does not exist or is full, the participant is
    /// already assigned in the period, or holds the activity elsewhere.
    pub fn assign(
        &mut self,
        idx: usize,
        period: &str,
        activity: &str,
        method: AssignmentMethod,
    ) -> AllocationResult<()> {
        let participant = self
            .get_participant(idx)
            .ok_or_else(|| AllocationError::UnknownParticipant(format!("#{idx}")))?;

        if participant.is_assigned(period) {
            return Err(AllocationError::AlreadyAssigned {
                participant: participant.id.clone(),
                period: period.to_string(),
            });
        }
        if participant.holds_elsewhere(activity, period) {
            return Err(AllocationError::RepeatedActivity {
                participant: participant.id.clone(),
                activity: activity.to_string(),
            });
        }

        let participant_id = participant.id.clone();
        let key = InstanceKey::new(period, activity);
        let instance = self
            .instances
            .get_mut(&key)
            .ok_or_else(|| AllocationError::UnknownInstance {
                activity: activity.to_string(),
                period: period.to_string(),
            })?;
        if instance.is_full() {
            return Err(AllocationError::CapacityExceeded {
                activity: activity.to_string(),
                period: period.to_string(),
                capacity: instance.capacity,
            });
        }

        instance.enrolled.insert(participant_id);
        self.participants[idx]
            .assignments
            .insert(period.to_string(), Assignment::new(activity, method));
        Ok(())
    }

    /// Clears a participant's assignment for a period.
    pub fn unassign(&mut self, idx: usize, period: &str) -> Option<Assignment> {
        let participant = self.participants.get_mut(idx)?;
        let removed = participant.assignments.remove(period)?;
        let key = InstanceKey::new(period, &removed.activity);
        if let Some(instance) = self.instances.get_mut(&key) {
            instance.enrolled.remove(&participant.id);
        }
        Some(removed)
    }

    /// Removes an instance and clears every assignment to it.
    ///
    /// Returns the positions of the displaced participants.
    pub fn cancel_instance(&mut self, key: &InstanceKey) -> AllocationResult<Vec<usize>> {
        let instance = self
            .instances
            .remove(key)
            .ok_or_else(|| AllocationError::UnknownInstance {
                activity: key.activity.clone(),
                period: key.period.clone(),
            })?;

        let mut displaced = Vec::with_capacity(instance.enrolled.len());
        for id in &instance.enrolled {
            let idx = self
                .participant_index(id)
                .ok_or_else(|| AllocationError::UnknownParticipant(id.clone()))?;
            self.participants[idx].assignments.remove(&key.period);
            displaced.push(idx);
        }
        Ok(displaced)
    }

    /// Replaces a participant's assignment for a period from outside the engine.
    ///
    /// `None` clears the period. The new assignment is labeled
    /// `ManualOverride`; capacity and cross-period uniqueness still apply,
    /// and the previous assignment is restored when the override is refused.
    pub fn override_assignment(
        &mut self,
        participant_id: &str,
        period: &str,
        activity: Option<&str>,
    ) -> AllocationResult<Option<Assignment>> {
        let idx = self
            .participant_index(participant_id)
            .ok_or_else(|| AllocationError::UnknownParticipant(participant_id.to_string()))?;

        let previous = self.unassign(idx, period);
        if let Some(activity) = activity {
            if let Err(err) = self.assign(idx, period, activity, AssignmentMethod::ManualOverride) {
                if let Some(prev) = &previous {
                    self.assign(idx, period, &prev.activity, prev.method)?;
                }
                return Err(err);
            }
        }
        Ok(previous)
    }

    /// Verifies capacity, uniqueness, and participant/instance agreement.
    ///
    /// # Errors
    /// Returns the first violation found. Any error here is a logic defect.
    pub fn check_invariants(&self) -> AllocationResult<()> {
        for instance in self.instances.values() {
            if instance.enrolled_count() > instance.capacity {
                return Err(AllocationError::InvariantViolation(format!(
                    "{} enrolls {} over capacity {}",
                    instance.key(),
                    instance.enrolled_count(),
                    instance.capacity
                )));
            }
            for id in &instance.enrolled {
                let holds = self
                    .participant_by_id(id)
                    .and_then(|p| p.assignment(&instance.period))
                    .is_some_and(|a| a.activity == instance.activity);
                if !holds {
                    return Err(AllocationError::InvariantViolation(format!(
                        "{} enrolls '{id}' without a matching assignment",
                        instance.key()
                    )));
                }
            }
        }

        for participant in &self.participants {
            let mut seen = BTreeSet::new();
            for (period, assignment) in &participant.assignments {
                if !seen.insert(assignment.activity.as_str()) {
                    return Err(AllocationError::InvariantViolation(format!(
                        "'{}' holds '{}' in more than one period",
                        participant.id, assignment.activity
                    )));
                }
                let enrolled = self
                    .instance(period, &assignment.activity)
                    .is_some_and(|i| i.enrolled.contains(&participant.id));
                if !enrolled || !assignment.method.is_assigned() {
                    return Err(AllocationError::InvariantViolation(format!(
                        "'{}' assignment to {}@{period} is not enrolled",
                        participant.id, assignment.activity
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivitySpec;

    fn sample_roster() -> Roster {
        let catalog = ActivityCatalog::new()
            .with_activity("Art", ["Aleph", "Beth"], ActivitySpec::new(1, 0))
            .with_activity("Swim", ["Aleph"], ActivitySpec::new(2, 1));
        let participants = vec![
            Participant::new("C1").with_preferences("Aleph", ["Art", "Swim"]),
            Participant::new("C2").with_preferences("Aleph", ["Art"]),
        ];
        Roster::new(&catalog, participants)
    }

    #[test]
    fn test_roster_new() {
        let roster = sample_roster();
        assert_eq!(roster.participant_count(), 2);
        assert_eq!(roster.instances().count(), 3);
        assert_eq!(roster.instances_in("Aleph").count(), 2);
        assert_eq!(roster.instances_of("Art").count(), 2);
        assert_eq!(roster.participant_index("C2"), Some(1));
        assert_eq!(roster.max_preference_len(), 2);
        assert_eq!(roster.activity_names().len(), 2);
    }

    #[test]
    fn test_assign_and_unassign() {
        let mut roster = sample_roster();
        roster
            .assign(0, "Aleph", "Art", AssignmentMethod::Preference(1))
            .unwrap();

        assert!(roster.instance("Aleph", "Art").unwrap().enrolled.contains("C1"));
        assert!(!roster.has_room("Aleph", "Art"));
        assert!(roster.check_invariants().is_ok());

        let removed = roster.unassign(0, "Aleph").unwrap();
        assert_eq!(removed.activity, "Art");
        assert!(roster.has_room("Aleph", "Art"));
        assert!(roster.unassign(0, "Aleph").is_none());
    }

    #[test]
    fn test_assign_rejects_violations() {
        let mut roster = sample_roster();
        roster.assign(0, "Aleph", "Art", AssignmentMethod::Random).unwrap();

        let full = roster.assign(1, "Aleph", "Art", AssignmentMethod::Random);
        assert!(matches!(full, Err(AllocationError::CapacityExceeded { .. })));

        let twice = roster.assign(0, "Aleph", "Swim", AssignmentMethod::Random);
        assert!(matches!(twice, Err(AllocationError::AlreadyAssigned { .. })));

        let repeat = roster.assign(0, "Beth", "Art", AssignmentMethod::Random);
        assert!(matches!(repeat, Err(AllocationError::RepeatedActivity { .. })));

        let missing = roster.assign(1, "Beth", "Swim", AssignmentMethod::Random);
        assert!(matches!(missing, Err(AllocationError::UnknownInstance { .. })));
    }

    #[test]
    fn test_cancel_instance() {
        let mut roster = sample_roster();
        roster.assign(0, "Aleph", "Swim", AssignmentMethod::Preference(2)).unwrap();
        roster.assign(1, "Aleph", "Swim", AssignmentMethod::Random).unwrap();

        let displaced = roster.cancel_instance(&InstanceKey::new("Aleph", "Swim")).unwrap();
        assert_eq!(displaced, vec![0, 1]);
        assert!(!roster.is_offered("Aleph", "Swim"));
        assert!(!roster.participant(0).is_assigned("Aleph"));
        assert!(roster.check_invariants().is_ok());

        assert!(roster.cancel_instance(&InstanceKey::new("Aleph", "Swim")).is_err());
    }

    #[test]
    fn test_preexisting_assignments_enrolled() {
        let catalog = ActivityCatalog::new().with_offering("Aleph", "Art", ActivitySpec::new(1, 0));
        let mut first = Participant::new("C1");
        first
            .assignments
            .insert("Aleph".into(), Assignment::new("Art", AssignmentMethod::ManualOverride));
        let mut second = Participant::new("C2");
        second
            .assignments
            .insert("Aleph".into(), Assignment::new("Art", AssignmentMethod::ManualOverride));

        let roster = Roster::new(&catalog, vec![first, second]);
        assert!(roster.participant(0).is_assigned("Aleph"));
        // Capacity 1: the second carried assignment is dropped.
        assert!(!roster.participant(1).is_assigned("Aleph"));
        assert!(roster.check_invariants().is_ok());
    }

    #[test]
    fn test_duplicate_participant_ignored() {
        let catalog = ActivityCatalog::new();
        let roster = Roster::new(
            &catalog,
            vec![Participant::new("C1").with_name("first"), Participant::new("C1")],
        );
        assert_eq!(roster.participant_count(), 1);
        assert_eq!(roster.participant(0).name, "first");
    }

    #[test]
    fn test_override_assignment() {
        let mut roster = sample_roster();
        roster.assign(0, "Aleph", "Swim", AssignmentMethod::Random).unwrap();

        let previous = roster.override_assignment("C1", "Aleph", Some("Art")).unwrap();
        assert_eq!(previous.unwrap().activity, "Swim");
        assert_eq!(roster.participant(0).method("Aleph"), AssignmentMethod::ManualOverride);

        // Art is full now: the override is refused and C2 keeps nothing.
        assert!(roster.override_assignment("C2", "Aleph", Some("Art")).is_err());
        assert!(!roster.participant(1).is_assigned("Aleph"));

        roster.override_assignment("C1", "Aleph", None).unwrap();
        assert!(!roster.participant(0).is_assigned("Aleph"));
        assert!(roster.override_assignment("C9", "Aleph", None).is_err());
        assert!(roster.check_invariants().is_ok());
    }

    #[test]
    fn test_refused_override_restores_previous() {
        let mut roster = sample_roster();
        roster.assign(0, "Aleph", "Art", AssignmentMethod::Preference(1)).unwrap();
        roster.assign(1, "Aleph", "Swim", AssignmentMethod::Random).unwrap();

        assert!(roster.override_assignment("C2", "Aleph", Some("Art")).is_err());
        assert_eq!(roster.participant(1).assignment("Aleph").unwrap().activity, "Swim");
        assert!(roster.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_participant() {
        let mut roster = sample_roster();
        roster.assign(0, "Aleph", "Art", AssignmentMethod::Preference(1)).unwrap();

        let removed = roster.remove_participant("C1").unwrap();
        assert_eq!(removed.id, "C1");
        assert!(roster.has_room("Aleph", "Art"));
        assert_eq!(roster.participant_index("C2"), Some(0));
        assert!(roster.remove_participant("C1").is_none());
    }

    #[test]
    fn test_serde_roundtrip_restores_index() {
        let mut roster = sample_roster();
        roster.assign(1, "Aleph", "Art", AssignmentMethod::Preference(1)).unwrap();

        let json = serde_json::to_string(&roster).unwrap();
        let restored: Roster = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.participant_index("C2"), Some(1));
        assert_eq!(restored.instances().count(), 3);
        assert!(!restored.has_room("Aleph", "Art"));
        assert!(restored.check_invariants().is_ok());
    }

    #[test]
    fn test_scores_and_methods() {
        let mut roster = sample_roster();
        roster.push_score(0, 5).unwrap();
        roster.push_score(0, 3).unwrap();
        roster.replace_latest_score(0, 9).unwrap();
        roster.replace_latest_score(1, 2).unwrap();
        assert_eq!(roster.participant(0).score_history, vec![5, 9]);
        assert_eq!(roster.participant(1).score_history, vec![2]);

        roster.assign(1, "Aleph", "Swim", AssignmentMethod::Random).unwrap();
        roster.set_method(1, "Aleph", AssignmentMethod::ManualOverride).unwrap();
        roster.set_missed_first_choice(1, true).unwrap();
        assert_eq!(roster.participant(1).method("Aleph"), AssignmentMethod::ManualOverride);
        assert!(roster.participant(1).missed_first_choice);
    }

    #[test]
    fn test_bad_position_is_an_error() {
        let mut roster = sample_roster();
        assert!(roster.get_participant(7).is_none());
        assert!(matches!(
            roster.push_score(7, 1),
            Err(AllocationError::UnknownParticipant(_))
        ));
        assert!(roster.replace_latest_score(7, 1).is_err());
        assert!(roster.set_missed_first_choice(7, true).is_err());
        assert!(roster.set_method(7, "Aleph", AssignmentMethod::Random).is_err());
    }
}
