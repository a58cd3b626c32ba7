//! The fixed-point resolution loop
//!
//! A [`Resolver`] accumulates submitted entities and repeatedly validates
//! every model's [`EntityGraph`]. Junction entities requested by a round are
//! inserted at the start of the next one. Once a round synthesizes nothing
//! the resolver is [`State::Stable`] and the graphs can be handed downstream
//! as a [`Resolution`].

mod builder;
pub use builder::Builder;

mod link;
pub use link::Link;

use crate::graph::{Embeddables, EntityGraph, TypeNamePolicy};
use crate::junction::{JunctionKey, JunctionSynthesizer};
use crate::schema::{AttributeRef, Entity, TypePath};
use crate::validate::{Diagnostic, Diagnostics, Validator};
use crate::{Error, Result};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// More rounds are needed
    Resolving,

    /// The last round added nothing new
    Stable,
}

#[derive(Debug)]
pub struct Resolver {
    max_rounds: usize,
    type_name_policy: TypeNamePolicy,
    junction_separator: String,
    synthesize_one_sided: bool,
    embeddables: Arc<Embeddables>,

    /// One graph per model, in first-seen order
    graphs: IndexMap<String, EntityGraph>,

    /// Entities inserted at the start of the next round
    pending: Vec<Entity>,

    /// Diagnostics not yet retired by a later round
    diagnostics: Diagnostics,

    round: usize,
    state: State,
}

/// Summary of a single resolution round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// 1-based round number
    pub round: usize,

    /// Number of entities that entered a graph this round
    pub inserted: usize,

    /// Junction entities synthesized this round, inserted on the next
    pub synthesized: Vec<TypePath>,

    /// Diagnostics produced by this round's validation
    pub diagnostics: Diagnostics,
}

/// Frozen graphs and the final diagnostics.
#[derive(Debug, Clone)]
pub struct Resolution {
    graphs: IndexMap<String, EntityGraph>,
    links: IndexMap<AttributeRef, Link>,
    diagnostics: Diagnostics,
    rounds: usize,
}

impl Resolver {
    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn new() -> Self {
        Builder::new().build()
    }

    /// Queues an entity for insertion on the next round.
    ///
    /// Submitting to a stable resolver reopens it.
    pub fn submit(&mut self, entity: Entity) {
        log::trace!(
            "entity `{}` submitted to model `{}`",
            entity.ty,
            entity.model
        );
        self.pending.push(entity);
        self.state = State::Resolving;
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of rounds run so far
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn graph(&self, model: &str) -> Option<&EntityGraph> {
        self.graphs.get(model)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &EntityGraph> + '_ {
        self.graphs.values()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Runs one round: inserts pending entities, validates every graph and
    /// synthesizes the junctions the graphs still need.
    ///
    /// Validation findings are diagnostics, not errors. An error is returned
    /// only when a submitted entity conflicts with the graph or the round
    /// limit is exceeded.
    pub fn run_round(&mut self) -> Result<RoundReport> {
        if self.round >= self.max_rounds {
            log::warn!(
                "resolution still not stable after {} rounds; giving up",
                self.max_rounds
            );
            return Err(Error::round_limit(self.max_rounds));
        }

        self.round += 1;
        let inserted = self.insert_pending()?;

        let mut report = RoundReport {
            round: self.round,
            inserted,
            synthesized: vec![],
            diagnostics: Diagnostics::new(),
        };

        let mut junctions: Vec<Entity> = vec![];

        for graph in self.graphs.values() {
            let validation = Validator::new(graph)
                .synthesize_one_sided(self.synthesize_one_sided)
                .validate();

            report.diagnostics.extend(validation.diagnostics);

            let synthesizer =
                JunctionSynthesizer::new(graph).separator(&self.junction_separator);

            for key in &validation.requests {
                match synthesizer.synthesize(key) {
                    Ok(Some(junction)) => {
                        if junctions.iter().any(|pending| {
                            pending.model == junction.model
                                && pending.table_name.eq_ignore_ascii_case(&junction.table_name)
                        }) {
                            log::trace!("junction `{}` already requested this round", junction.ty);
                            continue;
                        }
                        junctions.push(junction);
                    }
                    Ok(None) => {}
                    Err(err) => report.diagnostics.push(synthesis_failed(key, err)),
                }
            }
        }

        self.retire_validated();
        self.diagnostics.extend(report.diagnostics.iter().cloned());

        report.synthesized = junctions.iter().map(|junction| junction.ty.clone()).collect();

        if junctions.is_empty() {
            self.state = State::Stable;
            log::info!(
                "resolution stable after {} round(s): {} entities, {} error(s), {} warning(s)",
                self.round,
                self.graphs.values().map(EntityGraph::len).sum::<usize>(),
                self.diagnostics.errors().count(),
                self.diagnostics.warnings().count()
            );
        } else {
            log::debug!(
                "round {}: inserted {}, synthesized {} junction(s)",
                self.round,
                inserted,
                junctions.len()
            );
            self.pending.extend(junctions);
            self.state = State::Resolving;
        }

        Ok(report)
    }

    /// Runs rounds until the resolver is stable and freezes the graphs.
    pub fn resolve(mut self) -> Result<Resolution> {
        while self.state == State::Resolving || !self.pending.is_empty() {
            self.run_round()?;
        }

        let mut links = IndexMap::new();

        for graph in self.graphs.values() {
            let synthesizer = JunctionSynthesizer::new(graph).separator(&self.junction_separator);

            for link in link::link_graph(graph, &synthesizer) {
                links.insert(link.attribute.clone(), link);
            }
        }

        Ok(Resolution {
            graphs: self.graphs,
            links,
            diagnostics: self.diagnostics,
            rounds: self.round,
        })
    }

    /// Inserts queued entities in submission order. An entity that fails to
    /// insert is dropped; the ones queued after it stay queued.
    fn insert_pending(&mut self) -> Result<usize> {
        let mut inserted = 0;
        let mut pending = std::mem::take(&mut self.pending).into_iter();

        while let Some(entity) = pending.next() {
            let graph = self
                .graphs
                .entry(entity.model.clone())
                .or_insert_with_key(|model| {
                    log::debug!("new model `{model}`");
                    EntityGraph::new(model.clone())
                        .with_embeddables(self.embeddables.clone())
                        .with_type_name_policy(self.type_name_policy)
                });

            match graph.add(entity) {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(err) => {
                    self.pending.extend(pending);
                    return Err(err);
                }
            }
        }

        Ok(inserted)
    }

    /// Every attribute in the graphs is validated each round, so earlier
    /// findings about them are superseded.
    fn retire_validated(&mut self) {
        for graph in self.graphs.values() {
            for entity in graph.entities() {
                for attribute in entity.attributes() {
                    self.diagnostics.retire(&entity.attribute_ref(attribute));
                }
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolution {
    pub fn graph(&self, model: &str) -> Option<&EntityGraph> {
        self.graphs.get(model)
    }

    pub fn graphs(&self) -> impl Iterator<Item = &EntityGraph> + '_ {
        self.graphs.values()
    }

    pub fn link(&self, attribute: &AttributeRef) -> Option<&Link> {
        self.links.get(attribute)
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.values()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of rounds it took to reach a fixed point
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Fails if any error diagnostic survived resolution. Warnings never fail.
    pub fn into_result(self) -> Result<Self> {
        let Some(first) = self.diagnostics.errors().next().cloned() else {
            return Ok(self);
        };

        Err(Error::invalid_schema(format!(
            "resolution finished with {} error(s); first: {first}",
            self.diagnostics.errors().count()
        )))
    }
}

fn synthesis_failed(key: &JunctionKey, err: Error) -> Diagnostic {
    Diagnostic::error(
        AttributeRef::new(&key.from, key.attribute.clone()),
        format!("couldn't synthesize junction: {err}"),
    )
}
