mod common;

use instantia::ast::{ClassRef, ElementRef, EnumEntryRef};
use instantia::runtime::{ElementKind, InstanceRegistry, TypeReferenceId, TypeRegistry};
use proptest::prelude::*;

#[test]
fn fresh_registries_per_run_are_independent() {
    let mut first = InstanceRegistry::new(1);
    let mut second = InstanceRegistry::new(1);
    let a = first.register(common::item(), TypeReferenceId::unknown());
    let b = second.register(common::item(), TypeReferenceId::unknown());
    assert_eq!(a, b);
    assert_eq!(first.len(), 1);
    assert!(second.resolve(a).is_some());
}

#[test]
fn registration_order_is_kept() {
    let mut registry = InstanceRegistry::new(42);
    let ids: Vec<_> = (0..10)
        .map(|_| registry.register(common::cart(), TypeReferenceId::unknown()))
        .collect();
    let iterated: Vec<_> = registry.iter().map(|i| i.id).collect();
    assert_eq!(ids, iterated);
}

#[test]
fn type_entries_describe_elements() {
    let model = common::load_fixture("shop.json").model;
    let mut types = TypeRegistry::new();
    let relation = types
        .resolve(&model, &ElementRef::relation(&common::cart(), "items"))
        .unwrap();
    let entry = types.entry(&relation).unwrap();
    assert_eq!(entry.kind, ElementKind::Relation);
    assert_eq!(entry.qualified_name, "shop.Cart.items");
    assert_eq!(entry.target.as_deref(), Some("shop.Item"));

    let named = types
        .resolve(&model, &ElementRef::class(&ClassRef::new("shop", "Named")))
        .unwrap();
    assert_eq!(types.entry(&named).unwrap().kind, ElementKind::Interface);

    let fruit = types
        .resolve(&model, &ElementRef::enum_entry(&EnumEntryRef::new("shop", "Category", "Fruit")))
        .unwrap();
    assert_eq!(fruit.as_str(), "shop.mm#/enum_entry/Category/Fruit");

    let graph: Vec<(&str, ElementKind)> = types.entries().map(|(k, e)| (k.as_str(), e.kind)).collect();
    assert_eq!(
        graph,
        vec![
            ("shop.mm#/enum_entry/Category/Fruit", ElementKind::EnumEntry),
            ("shop.mm#/interface/Named", ElementKind::Interface),
            ("shop.mm#/relation/Cart/items", ElementKind::Relation),
        ]
    );
}

fn element() -> impl Strategy<Value = ElementRef> {
    let class = prop::sample::select(vec!["Item", "Cart", "Named", "Ghost"])
        .prop_map(|c| ClassRef::new("shop", c));
    let member = prop::sample::select(vec!["name", "price", "total", "items", "related", "nope"]);
    prop_oneof![
        class.clone().prop_map(|c| ElementRef::class(&c)),
        (class.clone(), member.clone()).prop_map(|(c, m)| ElementRef::attribute(&c, m)),
        (class, member).prop_map(|(c, m)| ElementRef::relation(&c, m)),
    ]
}

proptest! {
    #[test]
    fn resolving_twice_yields_identical_key(elements in prop::collection::vec(element(), 1..16)) {
        let model = common::load_fixture("shop.json").model;
        let mut types = TypeRegistry::new();
        let first: Vec<_> = elements.iter().map(|e| types.resolve(&model, e).ok()).collect();
        let second: Vec<_> = elements.iter().map(|e| types.resolve(&model, e).ok()).collect();
        prop_assert_eq!(&first, &second);

        // A fresh registry computes the same keys.
        let mut fresh = TypeRegistry::new();
        let third: Vec<_> = elements.iter().map(|e| fresh.resolve(&model, e).ok()).collect();
        prop_assert_eq!(first, third);
    }
}
