use pretty_assertions::assert_eq;
use relata_core::resolve::State;
use relata_core::schema::*;
use relata_core::{Resolution, Resolver};

fn id() -> Attribute {
    Attribute::new("id", Type::I64).key()
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

fn many_to_many(name: &str, target: &str) -> Attribute {
    Attribute::new(name, Type::list(Type::path(target))).many_to_many()
}

/// A catalog with three one-sided many-to-many attributes, each missing its
/// junction.
fn catalog() -> Vec<Entity> {
    vec![
        make_entity("Tag", vec![]),
        make_entity("Category", vec![]),
        make_entity(
            "Product",
            vec![
                many_to_many("tags", "Tag"),
                many_to_many("categories", "Category"),
                many_to_many("related", "Product"),
            ],
        ),
        make_entity(
            "Supplier",
            vec![Attribute::new("products", Type::list(Type::path("Product")))
                .one_to_many()
                .mapped_by("supplier")],
        ),
    ]
}

fn resolve(resolver: &mut Resolver, entities: Vec<Entity>) {
    for entity in entities {
        resolver.submit(entity);
    }
}

fn tables(resolution: &Resolution) -> Vec<String> {
    resolution
        .graph(DEFAULT_MODEL)
        .unwrap()
        .entities()
        .map(|entity| entity.table_name.clone())
        .collect()
}

#[test]
fn reaches_a_fixed_point_within_missing_junctions_plus_one() {
    let mut resolver = Resolver::new();
    resolve(&mut resolver, catalog());

    let first = resolver.run_round().unwrap();
    assert_eq!(first.round, 1);
    assert_eq!(first.inserted, 4);
    assert_eq!(
        first
            .synthesized
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        ["ProductTag", "ProductCategory", "ProductProduct"]
    );
    assert_eq!(resolver.state(), State::Resolving);

    let second = resolver.run_round().unwrap();
    assert_eq!(second.inserted, 3);
    assert!(second.synthesized.is_empty());
    assert_eq!(resolver.state(), State::Stable);

    let resolution = resolver.resolve().unwrap();
    assert!(resolution.rounds() <= 3 + 1);
    assert_eq!(
        tables(&resolution),
        [
            "Tag",
            "Category",
            "Product",
            "Supplier",
            "Product_Tag",
            "Product_Category",
            "Product_Product",
        ]
    );
}

#[test]
fn self_referencing_junction_columns_are_distinct() {
    let mut resolver = Resolver::new();
    resolve(&mut resolver, catalog());
    let resolution = resolver.resolve().unwrap();

    let graph = resolution.graph(DEFAULT_MODEL).unwrap();
    let junction = graph.entity_by_table("Product_Product").unwrap();

    assert_eq!(
        junction
            .attributes()
            .map(|attribute| attribute.name.as_str())
            .collect::<Vec<_>>(),
        ["ProductId", "ProductRelatedId"]
    );
}

#[test]
fn errors_do_not_stop_synthesis() {
    let mut resolver = Resolver::new();
    resolve(&mut resolver, catalog());
    let resolution = resolver.resolve().unwrap();

    // `Supplier.products` names an inverse that does not exist
    let errors: Vec<_> = resolution
        .diagnostics()
        .errors()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        errors,
        ["error: Supplier::products: no matching ManyToOne found on `Product`"]
    );

    assert_eq!(tables(&resolution).len(), 7);
    assert!(resolution.into_result().is_err());
}

#[test]
fn resolution_is_deterministic() {
    let run = || {
        let mut resolver = Resolver::new();
        resolve(&mut resolver, catalog());
        resolver.resolve().unwrap()
    };

    let a = run();
    let b = run();

    assert_eq!(a.diagnostics().to_string(), b.diagnostics().to_string());
    assert_eq!(a.rounds(), b.rounds());
    assert_eq!(
        a.graph(DEFAULT_MODEL)
            .unwrap()
            .entities()
            .collect::<Vec<_>>(),
        b.graph(DEFAULT_MODEL)
            .unwrap()
            .entities()
            .collect::<Vec<_>>()
    );
    assert_eq!(a.links().collect::<Vec<_>>(), b.links().collect::<Vec<_>>());
}

#[test]
fn junction_requested_twice_is_synthesized_once() {
    let mut resolver = Resolver::new();
    resolve(
        &mut resolver,
        vec![
            make_entity("Club", vec![]),
            make_entity(
                "Member",
                vec![
                    many_to_many("clubs", "Club").junction(AssociativeEntity::explicit("membership")),
                    many_to_many("former_clubs", "Club")
                        .junction(AssociativeEntity::explicit("Membership")),
                ],
            ),
        ],
    );

    let first = resolver.run_round().unwrap();
    assert_eq!(first.synthesized, [TypePath::new("Membership")]);

    let resolution = resolver.resolve().unwrap();
    let graph = resolution.graph(DEFAULT_MODEL).unwrap();

    assert_eq!(
        graph
            .entities()
            .filter(|entity| entity.table_name.eq_ignore_ascii_case("membership"))
            .count(),
        1
    );

    let clubs = resolution
        .link(&AttributeRef::new("Member", "clubs"))
        .unwrap();
    let former = resolution
        .link(&AttributeRef::new("Member", "former_clubs"))
        .unwrap();
    assert_eq!(clubs.junction, Some(TypePath::new("Membership")));
    assert_eq!(former.junction, clubs.junction);
}

#[test]
fn declared_junction_entity_is_not_synthesized_again() {
    let mut resolver = Resolver::new();
    resolve(
        &mut resolver,
        vec![
            make_entity("Tag", vec![]),
            make_entity("Post", vec![many_to_many("tags", "Tag")]),
            Entity::builder("PostTagLink")
                .table("post_tag")
                .attribute(
                    Attribute::new("post_id", Type::I64)
                        .key()
                        .foreign_key()
                        .references_type(Type::path("Post")),
                )
                .attribute(
                    Attribute::new("tag_id", Type::I64)
                        .key()
                        .foreign_key()
                        .references_type(Type::path("Tag")),
                )
                .build()
                .unwrap(),
        ],
    );

    let first = resolver.run_round().unwrap();
    assert!(first.synthesized.is_empty());
    assert_eq!(resolver.state(), State::Stable);

    let resolution = resolver.resolve().unwrap();
    assert_eq!(resolution.rounds(), 1);

    let tags = resolution
        .link(&AttributeRef::new("Post", "tags"))
        .unwrap();
    assert_eq!(tags.junction, Some(TypePath::new("PostTagLink")));
}

#[test]
fn undeclared_pair_still_gets_one_junction() {
    let mut resolver = Resolver::new();
    resolve(
        &mut resolver,
        vec![
            make_entity("Post", vec![many_to_many("tags", "Tag")]),
            make_entity("Tag", vec![many_to_many("posts", "Post")]),
        ],
    );

    let resolution = resolver.resolve().unwrap();
    assert_eq!(resolution.rounds(), 2);
    assert_eq!(tables(&resolution), ["Post", "Tag", "Post_Tag"]);

    let errors: Vec<_> = resolution
        .diagnostics()
        .errors()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        errors,
        ["error: Post::tags: ManyToMany must declare the junction on one side \
          (`Post::tags` or `Tag::posts`)"]
    );

    let tags = resolution.link(&AttributeRef::new("Post", "tags")).unwrap();
    let posts = resolution.link(&AttributeRef::new("Tag", "posts")).unwrap();
    assert_eq!(tags.junction, Some(TypePath::new("PostTag")));
    assert_eq!(posts.junction, tags.junction);
}

#[test]
fn one_sided_synthesis_disabled() {
    let mut resolver = Resolver::builder().synthesize_one_sided(false).build();
    resolve(
        &mut resolver,
        vec![make_entity("Tag", vec![]), make_entity("Post", vec![many_to_many("tags", "Tag")])],
    );

    let resolution = resolver.resolve().unwrap();
    assert_eq!(resolution.rounds(), 1);
    assert_eq!(tables(&resolution), ["Tag", "Post"]);
}

#[test]
fn junction_separator() {
    let mut resolver = Resolver::builder().junction_separator("__").build();
    resolve(
        &mut resolver,
        vec![make_entity("Tag", vec![]), make_entity("Post", vec![many_to_many("tags", "Tag")])],
    );

    let resolution = resolver.resolve().unwrap();
    let graph = resolution.graph(DEFAULT_MODEL).unwrap();
    let junction = graph.entity_by_table("Post__Tag").unwrap();

    assert_eq!(junction.ty, TypePath::new("PostTag"));
}

#[test]
fn round_limit() {
    let mut resolver = Resolver::builder().max_rounds(1).build();
    resolve(
        &mut resolver,
        vec![make_entity("Tag", vec![]), make_entity("Post", vec![many_to_many("tags", "Tag")])],
    );

    let err = resolver.resolve().unwrap_err();
    assert!(err.is_round_limit());
    assert_eq!(
        err.to_string(),
        "resolution did not reach a fixed point within 1 rounds"
    );
}

#[test]
fn later_rounds_retire_earlier_diagnostics() {
    let mut resolver = Resolver::new();
    resolver.submit(make_entity(
        "Phone",
        vec![Attribute::new("owner", Type::path("Person")).many_to_one()],
    ));

    let first = resolver.run_round().unwrap();
    assert_eq!(
        first.diagnostics.to_string(),
        "warning: Phone::owner: couldn't find referenced element `Person`\n"
    );
    assert_eq!(resolver.state(), State::Stable);
    assert_eq!(resolver.diagnostics().len(), 1);

    resolver.submit(make_entity("Person", vec![]));
    assert_eq!(resolver.state(), State::Resolving);

    let second = resolver.run_round().unwrap();
    assert_eq!(second.inserted, 1);
    assert!(second.diagnostics.is_empty());
    assert!(resolver.diagnostics().is_empty());
}

#[test]
fn identical_resubmission_is_ignored() {
    let mut resolver = Resolver::new();
    resolver.submit(make_entity("Tag", vec![]));
    resolver.submit(make_entity("Tag", vec![]));

    let report = resolver.run_round().unwrap();
    assert_eq!(report.inserted, 1);
}

#[test]
fn conflicting_declarations_fail() {
    let mut resolver = Resolver::new();
    resolver.submit(make_entity("Tag", vec![]));
    resolver.submit(make_entity(
        "Tag",
        vec![Attribute::new("label", Type::String)],
    ));

    let err = resolver.resolve().unwrap_err();
    assert!(err.is_duplicate_entity());
}

#[test]
fn entities_queued_after_a_conflict_are_kept() {
    let mut resolver = Resolver::new();
    resolver.submit(make_entity("Tag", vec![]));
    resolver.submit(make_entity(
        "Tag",
        vec![Attribute::new("label", Type::String)],
    ));
    resolver.submit(make_entity("Post", vec![]));

    let err = resolver.run_round().unwrap_err();
    assert!(err.is_duplicate_entity());

    let report = resolver.run_round().unwrap();
    assert_eq!(report.inserted, 1);

    let graph = resolver.graph(DEFAULT_MODEL).unwrap();
    assert_eq!(graph.len(), 2);
    assert!(graph.entity(&"Post".into()).is_some());
    assert!(graph.entity(&"Tag".into()).unwrap().attribute("label").is_none());
}

#[test]
fn models_are_resolved_independently() {
    let mut resolver = Resolver::new();
    resolver.submit(
        Entity::builder("Person")
            .model("people")
            .attribute(id())
            .build()
            .unwrap(),
    );
    resolver.submit(
        Entity::builder("Phone")
            .model("devices")
            .attribute(id())
            .attribute(Attribute::new("owner", Type::path("Person")).many_to_one())
            .build()
            .unwrap(),
    );

    let resolution = resolver.resolve().unwrap();

    assert_eq!(
        resolution
            .graphs()
            .map(|graph| graph.model())
            .collect::<Vec<_>>(),
        ["people", "devices"]
    );
    assert_eq!(
        resolution.diagnostics().to_string(),
        "warning: Phone::owner: couldn't find referenced element `Person`\n"
    );
    assert_eq!(
        resolution
            .link(&AttributeRef::new("Phone", "owner"))
            .unwrap()
            .target,
        None
    );
}

#[test]
fn embedded_attributes_are_flattened() {
    let mut resolver = Resolver::builder()
        .embeddable(
            Embeddable::new("Geo")
                .attribute(Attribute::new("lat", Type::F64))
                .attribute(Attribute::new("lng", Type::F64)),
        )
        .embeddable(
            Embeddable::new("Address")
                .attribute(Attribute::new("street", Type::String))
                .attribute(Attribute::new("location", Type::path("Geo"))),
        )
        .build();

    resolver.submit(make_entity(
        "Customer",
        vec![Attribute::new("billing", Type::path("Address")).nullable()],
    ));

    let resolution = resolver.resolve().unwrap();
    let customer = resolution
        .graph(DEFAULT_MODEL)
        .unwrap()
        .entity(&"Customer".into())
        .unwrap();

    assert_eq!(
        customer
            .attributes()
            .map(|attribute| attribute.name.as_str())
            .collect::<Vec<_>>(),
        ["id", "billing_street", "billing_location_lat", "billing_location_lng"]
    );
    assert!(customer
        .attribute("billing_location_lat")
        .unwrap()
        .nullable);
    assert!(resolution.diagnostics().is_empty());
}
