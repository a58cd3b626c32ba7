use super::{Resolver, State};
use crate::graph::{Embeddables, TypeNamePolicy};
use crate::schema::Embeddable;
use crate::validate::Diagnostics;
use indexmap::IndexMap;
use std::sync::Arc;

/// Configures a [`Resolver`].
#[derive(Debug, Clone)]
pub struct Builder {
    /// Hard ceiling on the number of resolution rounds
    max_rounds: usize,

    type_name_policy: TypeNamePolicy,

    /// Placed between the two table names of a derived junction table name
    junction_separator: String,

    /// Synthesize default junctions for many-to-many attributes declared on
    /// one side only
    synthesize_one_sided: bool,

    embeddables: Embeddables,
}

impl Builder {
    pub const DEFAULT_MAX_ROUNDS: usize = 64;

    pub fn new() -> Self {
        Self {
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            type_name_policy: TypeNamePolicy::default(),
            junction_separator: "_".to_string(),
            synthesize_one_sided: true,
            embeddables: IndexMap::new(),
        }
    }

    pub fn max_rounds(&mut self, max_rounds: usize) -> &mut Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn type_name_policy(&mut self, policy: TypeNamePolicy) -> &mut Self {
        self.type_name_policy = policy;
        self
    }

    pub fn junction_separator(&mut self, separator: &str) -> &mut Self {
        self.junction_separator = separator.to_string();
        self
    }

    pub fn synthesize_one_sided(&mut self, enabled: bool) -> &mut Self {
        self.synthesize_one_sided = enabled;
        self
    }

    /// Registers an embeddable type. Attributes of that type are flattened
    /// into their entity when it enters the graph.
    pub fn embeddable(&mut self, embeddable: Embeddable) -> &mut Self {
        self.embeddables.insert(embeddable.ty.clone(), embeddable);
        self
    }

    pub fn build(&self) -> Resolver {
        Resolver {
            max_rounds: self.max_rounds,
            type_name_policy: self.type_name_policy,
            junction_separator: self.junction_separator.clone(),
            synthesize_one_sided: self.synthesize_one_sided,
            embeddables: Arc::new(self.embeddables.clone()),
            graphs: IndexMap::new(),
            pending: vec![],
            diagnostics: Diagnostics::new(),
            round: 0,
            state: State::Resolving,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
