//! Arena of comment records with synchronized, append-only side-effect
//! annotations.

use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use sefx_core::{group_by_drug, CommentRecord};

use crate::error::EngineError;

/// Stable handle to a comment inside an [`AnnotationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CommentId(usize);

impl CommentId {
    /// Position of the comment in the store's input order.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Slot {
    drug_name: String,
    raw_text: String,
    cleaned_text: String,
    side_effects: Mutex<Vec<String>>,
}

/// Owns the comment records of a run.
///
/// Text fields are immutable; each comment's `side_effects` list sits behind
/// its own lock, so keyword tasks can append concurrently without contending
/// on unrelated comments.
pub struct AnnotationStore {
    slots: Vec<Slot>,
    drugs: Vec<(String, Vec<CommentId>)>,
}

impl AnnotationStore {
    #[must_use]
    pub fn new(records: Vec<CommentRecord>) -> Self {
        let drugs = group_by_drug(&records)
            .into_iter()
            .map(|(drug, indices)| (drug, indices.into_iter().map(CommentId).collect()))
            .collect();

        let slots = records
            .into_iter()
            .map(|r| Slot {
                drug_name: r.drug_name,
                raw_text: r.raw_text,
                cleaned_text: r.cleaned_text,
                side_effects: Mutex::new(r.side_effects),
            })
            .collect();

        Self { slots, drugs }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The id of the comment at `index` in input order.
    #[must_use]
    pub fn id(&self, index: usize) -> Option<CommentId> {
        (index < self.slots.len()).then_some(CommentId(index))
    }

    /// Comment ids grouped by drug, drugs in first-seen order.
    #[must_use]
    pub fn drugs(&self) -> &[(String, Vec<CommentId>)] {
        &self.drugs
    }

    #[must_use]
    pub fn drug_name(&self, id: CommentId) -> Option<&str> {
        self.slots.get(id.0).map(|s| s.drug_name.as_str())
    }

    #[must_use]
    pub fn raw_text(&self, id: CommentId) -> Option<&str> {
        self.slots.get(id.0).map(|s| s.raw_text.as_str())
    }

    #[must_use]
    pub fn cleaned_text(&self, id: CommentId) -> Option<&str> {
        self.slots.get(id.0).map(|s| s.cleaned_text.as_str())
    }

    /// Snapshot of the comment's annotations.
    #[must_use]
    pub fn side_effects(&self, id: CommentId) -> Option<Vec<String>> {
        self.slots.get(id.0).map(|s| {
            s.side_effects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }

    /// Append `keyword` to the comment's side effects.
    ///
    /// Not idempotent: appending the same keyword twice records it twice.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownComment`] if `id` is not in this store.
    pub fn append(&self, id: CommentId, keyword: &str) -> Result<(), EngineError> {
        let slot = self.slots.get(id.0).ok_or(EngineError::UnknownComment(id))?;
        slot.side_effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(keyword.to_string());
        Ok(())
    }

    /// Consume the store, returning the records in input order.
    #[must_use]
    pub fn into_records(self) -> Vec<CommentRecord> {
        self.slots
            .into_iter()
            .map(|s| CommentRecord {
                drug_name: s.drug_name,
                raw_text: s.raw_text,
                cleaned_text: s.cleaned_text,
                side_effects: s
                    .side_effects
                    .into_inner()
                    .unwrap_or_else(PoisonError::into_inner),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AnnotationStore {
        AnnotationStore::new(vec![
            CommentRecord::new("A", "first"),
            CommentRecord::new("B", "second"),
            CommentRecord::new("A", "third"),
        ])
    }

    #[test]
    fn drugs_group_ids_in_input_order() {
        let store = store();
        let drugs = store.drugs();
        assert_eq!(drugs.len(), 2);
        assert_eq!(drugs[0].0, "A");
        assert_eq!(
            drugs[0].1.iter().map(|id| id.index()).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert_eq!(drugs[1].0, "B");
    }

    #[test]
    fn append_is_visible_and_ordered() {
        let store = store();
        let id = store.id(2).unwrap();
        store.append(id, "nausea").unwrap();
        store.append(id, "headache").unwrap();
        assert_eq!(
            store.side_effects(id).unwrap(),
            vec!["nausea".to_string(), "headache".to_string()]
        );
        let records = store.into_records();
        assert_eq!(records[2].side_effects, vec!["nausea", "headache"]);
        assert!(records[0].side_effects.is_empty());
    }

    #[test]
    fn append_does_not_deduplicate() {
        let store = store();
        let id = store.id(0).unwrap();
        store.append(id, "nausea").unwrap();
        store.append(id, "nausea").unwrap();
        assert_eq!(store.side_effects(id).unwrap().len(), 2);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let big = store();
        let foreign = big.id(2).unwrap();
        let small = AnnotationStore::new(vec![CommentRecord::new("A", "only")]);
        assert!(small.id(2).is_none());
        assert!(matches!(
            small.append(foreign, "rash"),
            Err(EngineError::UnknownComment(_))
        ));
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let store = store();
        let id = store.id(1).unwrap();
        std::thread::scope(|scope| {
            for n in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    store.append(id, &format!("kw{n}")).unwrap();
                });
            }
        });
        assert_eq!(store.side_effects(id).unwrap().len(), 8);
    }

    #[test]
    fn existing_annotations_are_kept() {
        let mut record = CommentRecord::new("A", "text");
        record.side_effects.push("insomnia".to_string());
        let store = AnnotationStore::new(vec![record]);
        let id = store.id(0).unwrap();
        store.append(id, "anxiety").unwrap();
        assert_eq!(
            store.into_records()[0].side_effects,
            vec!["insomnia", "anxiety"]
        );
    }
}
