use pretty_assertions::assert_eq;
use relata_core::schema::*;
use relata_core::{EntityGraph, Resolution, Resolver, Validator};

fn id() -> Attribute {
    Attribute::new("id", Type::I64).key().generated()
}

fn make_entity(ty: &str, attributes: Vec<Attribute>) -> Entity {
    attributes
        .into_iter()
        .fold(Entity::builder(ty).attribute(id()), |builder, attribute| {
            builder.attribute(attribute)
        })
        .build()
        .unwrap()
}

fn resolve(entities: Vec<Entity>) -> Resolution {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut resolver = Resolver::new();
    for entity in entities {
        resolver.submit(entity);
    }
    resolver.resolve().unwrap()
}

fn messages(resolution: &Resolution) -> Vec<String> {
    resolution
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.to_string())
        .collect()
}

fn person_and_group() -> Vec<Entity> {
    vec![
        make_entity(
            "Person",
            vec![Attribute::new("groups", Type::list(Type::path("Group")))
                .many_to_many()
                .junction(AssociativeEntity::explicit("Person_Group"))],
        ),
        make_entity(
            "Group",
            vec![Attribute::new("members", Type::list(Type::path("Person")))
                .many_to_many()
                .mapped_by("groups")],
        ),
    ]
}

#[test]
fn scenario_a_many_to_many_with_declared_junction() {
    let resolution = resolve(person_and_group());

    assert_eq!(messages(&resolution), Vec::<String>::new());
    assert_eq!(resolution.rounds(), 2);

    let graph = resolution.graph(DEFAULT_MODEL).unwrap();
    let person = graph.entity(&"Person".into()).unwrap();
    let group = graph.entity(&"Group".into()).unwrap();

    let mapped = graph.mapped_attributes(group, group.attribute("members").unwrap(), person);
    assert_eq!(mapped.len(), 1);
    assert_eq!(mapped[0].name, "groups");

    let junction = graph.entity_by_table("person_group").unwrap();
    assert_eq!(junction.ty, TypePath::new("PersonGroup"));
    assert!(junction.synthesized);
    assert_eq!(
        junction
            .attributes()
            .map(|attribute| attribute.name.as_str())
            .collect::<Vec<_>>(),
        ["PersonId", "GroupId"]
    );

    let groups = resolution
        .link(&AttributeRef::new("Person", "groups"))
        .unwrap();
    assert_eq!(groups.cardinality, Some(Cardinality::ManyToMany));
    assert_eq!(groups.target, Some(TypePath::new("Group")));
    assert_eq!(groups.inverse, [AttributeRef::new("Group", "members")]);
    assert_eq!(groups.junction, Some(TypePath::new("PersonGroup")));

    // Both sides resolve to the same junction
    let members = resolution
        .link(&AttributeRef::new("Group", "members"))
        .unwrap();
    assert_eq!(members.inverse, [AttributeRef::new("Person", "groups")]);
    assert_eq!(members.junction, Some(TypePath::new("PersonGroup")));
}

#[test]
fn scenario_b_one_sided_many_to_one() {
    let resolution = resolve(vec![
        make_entity("Person", vec![]),
        make_entity(
            "Phone",
            vec![Attribute::new("owner", Type::path("Person"))
                .many_to_one()
                .foreign_key()],
        ),
    ]);

    assert!(resolution.diagnostics().is_empty());
    assert_eq!(resolution.rounds(), 1);

    let graph = resolution.graph(DEFAULT_MODEL).unwrap();
    let phone = graph.entity(&"Phone".into()).unwrap();
    let person = graph.entity(&"Person".into()).unwrap();
    assert!(graph
        .mapped_attributes(phone, phone.attribute("owner").unwrap(), person)
        .is_empty());

    let owner = resolution
        .link(&AttributeRef::new("Phone", "owner"))
        .unwrap();
    assert_eq!(owner.target, Some(TypePath::new("Person")));
    assert_eq!(owner.target_attribute.as_deref(), Some("id"));
    assert!(owner.inverse.is_empty());
    assert_eq!(owner.junction, None);
}

#[test]
fn scenario_c_one_to_one_without_foreign_key() {
    let resolution = resolve(vec![
        make_entity(
            "Address",
            vec![Attribute::new("person", Type::path("Person")).one_to_one()],
        ),
        make_entity(
            "Person",
            vec![Attribute::new("address", Type::path("Address")).one_to_one()],
        ),
    ]);

    assert_eq!(
        messages(&resolution),
        ["error: Address::person: OneToOne must specify ForeignKey on one side"]
    );

    let err = resolution.into_result().unwrap_err();
    assert!(err.is_invalid_schema());
    assert_eq!(
        err.to_string(),
        "invalid schema: resolution finished with 1 error(s); first: \
         error: Address::person: OneToOne must specify ForeignKey on one side"
    );
}

#[test]
fn scenario_c_with_foreign_key_on_one_side() {
    let resolution = resolve(vec![
        make_entity(
            "Address",
            vec![Attribute::new("person", Type::path("Person"))
                .one_to_one()
                .foreign_key()],
        ),
        make_entity(
            "Person",
            vec![Attribute::new("address", Type::path("Address")).one_to_one()],
        ),
    ]);

    assert!(resolution.diagnostics().is_empty());
    assert!(resolution.into_result().is_ok());
}

#[test]
fn scenario_d_inverse_named_after_the_entity() {
    let resolution = resolve(vec![
        make_entity(
            "Parent",
            vec![Attribute::new("children", Type::list(Type::path("Child"))).one_to_many()],
        ),
        make_entity(
            "Child",
            vec![
                Attribute::new("parent", Type::path("Parent")).many_to_one(),
                Attribute::new("grandparent", Type::path("Parent")).many_to_one(),
            ],
        ),
    ]);

    assert!(resolution.diagnostics().is_empty());

    let graph = resolution.graph(DEFAULT_MODEL).unwrap();
    let parent = graph.entity(&"Parent".into()).unwrap();
    let child = graph.entity(&"Child".into()).unwrap();

    let mapped = graph.mapped_attributes(parent, parent.attribute("children").unwrap(), child);
    assert_eq!(
        mapped.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
        ["parent"]
    );

    let children = resolution
        .link(&AttributeRef::new("Parent", "children"))
        .unwrap();
    assert_eq!(children.inverse, [AttributeRef::new("Child", "parent")]);
}

#[test]
fn pairing_holds_when_no_mismatch_is_reported() {
    let mut graph = EntityGraph::new(DEFAULT_MODEL);
    for entity in person_and_group() {
        graph.add(entity).unwrap();
    }
    graph
        .add(make_entity(
            "Author",
            vec![Attribute::new("books", Type::list(Type::path("Book")))
                .one_to_many()
                .mapped_by("author")],
        ))
        .unwrap();
    graph
        .add(make_entity(
            "Book",
            vec![Attribute::new("author", Type::path("Author"))
                .many_to_one()
                .foreign_key()],
        ))
        .unwrap();

    let validation = Validator::new(&graph).validate();
    assert!(validation.diagnostics.is_empty());

    for entity in graph.entities() {
        for attribute in entity.associations() {
            let target = graph.referencing_entity(attribute).unwrap();
            let mapped = graph.mapped_attributes(entity, attribute, target);
            assert_eq!(mapped.len(), 1);
            assert_eq!(
                mapped[0].cardinality,
                attribute.cardinality.map(Cardinality::inverse)
            );
        }
    }
}
