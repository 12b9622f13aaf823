/// Reference repository
///
/// Fixtures publish the ids of the rows they create under symbolic names
/// (`user-03`, `membership-12`) and later fixtures read them back. Every read
/// across fixtures is recorded, which yields the reference graph of a load:
/// which fixture read references owned by which other fixture.
///
/// Names are zero padded so that listing by prefix returns them in creation
/// order.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::fixture::{FixtureError, FixtureResult};

/// Fixture name -> fixtures it read references from
pub type ReferenceGraph = BTreeMap<&'static str, BTreeSet<&'static str>>;

#[derive(Debug, Clone, Copy)]
struct Reference {
    id: Uuid,
    owner: &'static str,
}

#[derive(Debug, Default)]
pub struct ReferenceRepository {
    references: BTreeMap<String, Reference>,
    current: &'static str,
    graph: ReferenceGraph,
}

impl ReferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes the following adds and reads to `fixture`
    pub fn enter(&mut self, fixture: &'static str) {
        self.current = fixture;
        self.graph.entry(fixture).or_default();
    }

    pub fn add(&mut self, name: impl Into<String>, id: Uuid) -> FixtureResult<()> {
        let name = name.into();
        if self.references.contains_key(&name) {
            return Err(FixtureError::DuplicateReference(name));
        }

        self.references.insert(
            name,
            Reference {
                id,
                owner: self.current,
            },
        );
        Ok(())
    }

    pub fn get(&mut self, name: &str) -> FixtureResult<Uuid> {
        let reference = *self
            .references
            .get(name)
            .ok_or_else(|| FixtureError::MissingReference(name.to_string()))?;

        self.record(reference.owner);
        Ok(reference.id)
    }

    /// Ids of every reference whose name starts with `prefix`, in name order
    pub fn with_prefix(&mut self, prefix: &str) -> Vec<Uuid> {
        let found: Vec<Reference> = self
            .references
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(_, reference)| *reference)
            .collect();

        for reference in &found {
            self.record(reference.owner);
        }

        found.into_iter().map(|reference| reference.id).collect()
    }

    /// Number of references owned by `fixture`
    pub fn count_owned_by(&self, fixture: &str) -> usize {
        self.references
            .values()
            .filter(|reference| reference.owner == fixture)
            .count()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    fn record(&mut self, owner: &'static str) {
        if owner != self.current {
            self.graph.entry(self.current).or_default().insert(owner);
        }
    }
}

/// `prefix-07`
pub fn reference_name(prefix: &str, index: usize) -> String {
    format!("{}-{:03}", prefix, index)
}
