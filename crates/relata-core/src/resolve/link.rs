use crate::graph::EntityGraph;
use crate::junction::JunctionSynthesizer;
use crate::schema::{Attribute, AttributeRef, Cardinality, Entity, TypePath};

/// What an association or foreign-key attribute resolved to.
///
/// Links are computed from the frozen graph; the attributes themselves are
/// never annotated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Link {
    pub attribute: AttributeRef,

    /// `None` for plain foreign-key columns
    pub cardinality: Option<Cardinality>,

    /// The referenced entity, if it is part of the graph
    pub target: Option<TypePath>,

    /// The referenced column on the target
    pub target_attribute: Option<String>,

    /// Inverse attributes on the target, first match first
    pub inverse: Vec<AttributeRef>,

    /// Junction entity backing a many-to-many relationship
    pub junction: Option<TypePath>,
}

pub(super) fn link_graph(graph: &EntityGraph, synthesizer: &JunctionSynthesizer<'_>) -> Vec<Link> {
    let mut links = vec![];

    for entity in graph.entities() {
        for attribute in entity.attributes() {
            if attribute.is_association() || attribute.foreign_key {
                links.push(link_attribute(graph, synthesizer, entity, attribute));
            }
        }
    }

    links
}

fn link_attribute(
    graph: &EntityGraph,
    synthesizer: &JunctionSynthesizer<'_>,
    entity: &Entity,
    attribute: &Attribute,
) -> Link {
    let mut link = Link {
        attribute: entity.attribute_ref(attribute),
        cardinality: attribute.cardinality,
        target: None,
        target_attribute: None,
        inverse: vec![],
        junction: None,
    };

    let Some(target) = graph.referencing_entity(attribute) else {
        return link;
    };

    link.target = Some(target.ty.clone());
    link.target_attribute = graph
        .referencing_attribute(attribute, target)
        .map(|referenced| referenced.name.clone());

    if !attribute.is_association() {
        return link;
    }

    let inverse: Vec<_> = graph
        .mapped_attributes(entity, attribute, target)
        .into_iter()
        .filter(|mapped| !(target.ty == entity.ty && mapped.name == attribute.name))
        .collect();

    if attribute.is_many_to_many() {
        // The junction is named by whichever side declares it
        let owner = inverse
            .iter()
            .find(|mapped| mapped.associative_entity.is_some() && attribute.associative_entity.is_none())
            .map(|mapped| synthesizer.table_name(target, entity, mapped))
            .unwrap_or_else(|| synthesizer.table_name(entity, target, attribute));

        link.junction = graph.entity_by_table(&owner).map(|junction| junction.ty.clone());

        // An undeclared pair shares the junction named from the other side
        if link.junction.is_none() && attribute.associative_entity.is_none() {
            if let [mapped] = inverse[..] {
                if mapped.associative_entity.is_none() {
                    let other = synthesizer.table_name(target, entity, mapped);
                    link.junction = graph.entity_by_table(&other).map(|junction| junction.ty.clone());
                }
            }
        }
    }

    link.inverse = inverse
        .into_iter()
        .map(|mapped| target.attribute_ref(mapped))
        .collect();

    link
}
