//! Per-call merge state for deduplicating extraction output.
//!
//! Entities merge by case/whitespace-normalized name; relationships merge by
//! the (source, target, type) triple. Description lists concatenate in
//! first-seen order. The state lives only for the duration of one extraction
//! call, so concurrent calls stay isolated; the store-level MERGE statements
//! handle races between calls.

use std::collections::HashMap;

use crate::types::{
    ExtractedEntity, ExtractedRelationship, ExtractionOutput, MergedEntity, MergedRelationship,
};

/// Normalize an entity name for display: trim and collapse inner whitespace.
pub fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The deduplication key for an entity name.
pub fn name_key(raw: &str) -> String {
    normalize_name(raw).to_uppercase()
}

type RelKey = (String, String, String);

/// In-memory merge buffers for one extraction call.
#[derive(Debug, Default)]
pub struct MergeState {
    entities: HashMap<String, MergedEntity>,
    entity_order: Vec<String>,
    /// Distinct types observed per entity key, in first-seen order.
    observed_types: HashMap<String, Vec<String>>,
    relationships: HashMap<RelKey, MergedRelationship>,
    rel_order: Vec<RelKey>,
}

impl MergeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed completion into the merge buffers.
    pub fn absorb(&mut self, output: ExtractionOutput) {
        for entity in output.entities {
            self.add_entity(entity);
        }
        for rel in output.relationships {
            self.add_relationship(rel);
        }
    }

    /// Merge one entity mention. First mention creates the record; later
    /// mentions append their description and record any type disagreement.
    pub fn add_entity(&mut self, entity: ExtractedEntity) {
        let key = name_key(&entity.name);
        if key.is_empty() {
            return;
        }

        let entity_type = entity.entity_type.trim().to_string();
        let observed = self.observed_types.entry(key.clone()).or_default();
        if !entity_type.is_empty() && !observed.iter().any(|t| t.eq_ignore_ascii_case(&entity_type))
        {
            observed.push(entity_type.clone());
        }

        match self.entities.get_mut(&key) {
            Some(existing) => {
                let description = entity.description.trim();
                if !description.is_empty() {
                    existing.descriptions.push(description.to_string());
                }
            }
            None => {
                let mut descriptions = Vec::new();
                let description = entity.description.trim();
                if !description.is_empty() {
                    descriptions.push(description.to_string());
                }
                self.entities.insert(
                    key.clone(),
                    MergedEntity {
                        name: normalize_name(&entity.name),
                        entity_type,
                        descriptions,
                    },
                );
                self.entity_order.push(key);
            }
        }
    }

    /// Merge one relationship mention, keyed by (source, target, type).
    pub fn add_relationship(&mut self, rel: ExtractedRelationship) {
        let source_key = name_key(&rel.source);
        let target_key = name_key(&rel.target);
        if source_key.is_empty() || target_key.is_empty() || rel.rel_type.is_empty() {
            return;
        }

        let key = (source_key, target_key, rel.rel_type.clone());
        match self.relationships.get_mut(&key) {
            Some(existing) => {
                let description = rel.description.trim();
                if !description.is_empty() {
                    existing.descriptions.push(description.to_string());
                }
                if rel.strength.is_some() {
                    existing.weight = rel.strength;
                }
            }
            None => {
                let mut descriptions = Vec::new();
                let description = rel.description.trim();
                if !description.is_empty() {
                    descriptions.push(description.to_string());
                }
                self.relationships.insert(
                    key.clone(),
                    MergedRelationship {
                        source: normalize_name(&rel.source),
                        target: normalize_name(&rel.target),
                        rel_type: rel.rel_type,
                        descriptions,
                        weight: rel.strength,
                    },
                );
                self.rel_order.push(key);
            }
        }
    }

    /// Entities whose mentions disagreed on the type, with the observed
    /// candidates in first-seen order.
    pub fn type_conflicts(&self) -> Vec<(String, Vec<String>)> {
        let mut conflicts: Vec<(String, Vec<String>)> = Vec::new();
        for key in &self.entity_order {
            if let Some(observed) = self.observed_types.get(key) {
                if observed.len() > 1 {
                    let name = self.entities[key].name.clone();
                    conflicts.push((name, observed.clone()));
                }
            }
        }
        conflicts
    }

    /// Override the resolved type for an entity (reconciliation pass).
    pub fn set_entity_type(&mut self, name: &str, entity_type: String) {
        if let Some(entity) = self.entities.get_mut(&name_key(name)) {
            entity.entity_type = entity_type;
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Consume the state into upsert-ready lists, in first-seen order.
    ///
    /// Relationship endpoints are rewritten to the merged entity display
    /// name when the endpoint matches a known entity, so the store MERGE
    /// lands on the same node the entity upsert created.
    pub fn into_parts(mut self) -> (Vec<MergedEntity>, Vec<MergedRelationship>) {
        let entities: Vec<MergedEntity> = self
            .entity_order
            .iter()
            .filter_map(|key| self.entities.remove(key))
            .collect();

        let display: HashMap<String, String> = entities
            .iter()
            .map(|e| (name_key(&e.name), e.name.clone()))
            .collect();

        let relationships: Vec<MergedRelationship> = self
            .rel_order
            .iter()
            .filter_map(|key| self.relationships.remove(key))
            .map(|mut rel| {
                if let Some(name) = display.get(&name_key(&rel.source)) {
                    rel.source = name.clone();
                }
                if let Some(name) = display.get(&name_key(&rel.target)) {
                    rel.target = name.clone();
                }
                rel
            })
            .collect();

        (entities, relationships)
    }
}
