//! End-to-end conversion tests
//!
//! Exercise the converter through the public API: templates, live values,
//! scripts and type resolution working together.

use std::sync::Arc;

use classwiz::form::{cast_type, parse_entry, Entry};
use classwiz::{
    ClassId, ClassSpec, ClasswizConfig, Converter, DynObject, InfoValue, Instance, ObjectInfo,
    Registry, StaleField, TypeExpr, TypeSet, Value,
};

fn converter() -> Converter {
    Converter::new(Arc::new(Registry::new()), ClasswizConfig::default())
}

struct Net {
    client: ClassId,
    server: ClassId,
}

fn register_net(registry: &Registry) -> Net {
    let client = registry.register_class(
        ClassSpec::structure("net", "Client")
            .param("name", TypeExpr::STR)
            .optional_param("retries", TypeExpr::INT)
            .dynamic(),
    );
    let server = registry.register_class(
        ClassSpec::structure("net", "Server")
            .param("host", TypeExpr::STR)
            .optional_param("port", TypeExpr::optional(TypeExpr::INT))
            .optional_param("clients", TypeExpr::list_of(TypeExpr::class(client)))
            .optional_param("labels", TypeExpr::DICT)
            .dynamic(),
    );
    Net { client, server }
}

fn sample_server(net: &Net) -> ObjectInfo {
    let alice = ObjectInfo::from_fields(net.client, [("name", InfoValue::from("alice"))]);
    let bob = ObjectInfo::from_fields(
        net.client,
        [("name", InfoValue::from("bob")), ("retries", InfoValue::Int(3))],
    )
    .with_nickname(Some("backup".into()));
    let labels = ObjectInfo::from_fields(ClassId::DICT, [("zone", InfoValue::from("eu"))]);

    ObjectInfo::from_fields(
        net.server,
        [
            ("host", InfoValue::from("example.org")),
            ("port", InfoValue::Int(8080)),
            ("clients", InfoValue::List(vec![alice.into_value(), bob.into_value()])),
            ("labels", labels.into_value()),
        ],
    )
    .with_nickname(Some("primary".into()))
}

#[test]
fn test_template_round_trip_keeps_nicknames() {
    let converter = converter();
    let net = register_net(converter.registry());
    let original = sample_server(&net).into_value();

    let json = converter.to_dict(&original).unwrap();
    assert_eq!(json["type"], "net.Server");
    assert_eq!(json["nickname"], "primary");

    let decoded = converter.from_dict(&json).unwrap();
    assert!(decoded.warnings.is_empty());
    assert!(decoded.value.identical(&original));

    let clients = decoded.info().unwrap().get("clients").unwrap().as_list().unwrap();
    assert_eq!(clients[1].as_info().unwrap().nickname(), Some("backup"));
}

#[test]
fn test_live_round_trip_reproduces_data() {
    let converter = converter();
    let net = register_net(converter.registry());
    let original = sample_server(&net).into_value();

    let live = converter.materialize(&original).unwrap();
    let instance = live.as_instance().unwrap();
    assert_eq!(instance.type_name(), "net.Server");
    assert_eq!(instance.attribute("port"), Some(Value::Int(8080)));

    let described = converter.decompose(&live);
    assert_eq!(described, original);
}

#[test]
fn test_stale_field_dropped_with_one_warning() {
    let converter = converter();
    register_net(converter.registry());

    let decoded = converter
        .from_json_str(
            r#"{"type": "net.Client", "data": {"name": "carol", "ghost_field": true}, "nickname": null}"#,
        )
        .unwrap();
    let info = decoded.info().unwrap();
    assert_eq!(info.get("name"), Some(&InfoValue::from("carol")));
    assert!(info.get("ghost_field").is_none());
    assert_eq!(
        decoded.warnings,
        vec![StaleField {
            class: "net.Client".into(),
            field: "ghost_field".into(),
        }]
    );

    // The decoded info still builds
    assert!(converter.materialize(&decoded.value).is_ok());
}

#[test]
fn test_self_reference_kept_live() {
    let converter = converter();
    let registry = converter.registry();
    let node = registry.register_class(ClassSpec::structure("tree", "Node").param("name", TypeExpr::STR));
    registry.register_class(
        ClassSpec::structure("tree", "Node")
            .param("name", TypeExpr::STR)
            .param("parent", TypeExpr::optional(TypeExpr::class(node))),
    );

    let root = Arc::new(DynObject::new("tree.Node", Default::default()));
    let instance: Instance = root.clone();
    root.set("name", Value::Str("root".into()));
    root.set("parent", Value::Object(instance.clone()));

    let described = converter.decompose(&Value::Object(instance.clone()));
    let info = described.as_info().unwrap();
    assert_eq!(info.class(), node);
    assert_eq!(info.get("name"), Some(&InfoValue::from("root")));
    assert_eq!(info.get("parent"), Some(&InfoValue::Live(instance)));
    assert!(described.contains_live());

    // Break the cycle so the instance is freed
    root.remove("parent");
}

#[test]
fn test_union_cast_takes_first_declared() {
    let converter = converter();
    let types = converter
        .registry()
        .resolve(&TypeExpr::union([TypeExpr::INT, TypeExpr::STR]))
        .unwrap();
    assert_eq!(cast_type("5", &types, &converter).unwrap(), InfoValue::Int(5));
    assert_eq!(cast_type("five", &types, &converter).unwrap(), InfoValue::from("five"));
}

#[test]
fn test_empty_optional_entry_is_absent() {
    let converter = converter();
    let types: TypeSet = converter
        .registry()
        .resolve(&TypeExpr::optional(TypeExpr::INT))
        .unwrap();
    assert_eq!(parse_entry(&Entry::Text(String::new()), &types, &converter).unwrap(), None);
    assert_eq!(
        parse_entry(&Entry::Text("12".into()), &types, &converter).unwrap(),
        Some(InfoValue::Int(12))
    );
}

#[test]
fn test_resolution_skips_abstract_implementations() {
    let registry = Registry::new();
    let transport = registry.register_class(ClassSpec::structure("net", "Transport"));
    let stream = registry.register_class(
        ClassSpec::structure("net", "Stream")
            .extends(transport)
            .abstract_class(),
    );
    let tcp = registry.register_class(ClassSpec::structure("net", "Tcp").extends(stream));

    let set = registry.resolve(&TypeExpr::class(transport)).unwrap();
    assert!(set.contains(&TypeExpr::class(transport)));
    assert!(set.contains(&TypeExpr::class(tcp)));
    assert!(!set.contains(&TypeExpr::class(stream)));
}

#[test]
fn test_script_lists_imports_once() {
    let converter = converter();
    let net = register_net(converter.registry());
    let script = converter.to_script(&sample_server(&net).into_value()).unwrap();

    assert_eq!(
        script.imports.iter().filter(|line| line.contains("Client")).count(),
        1
    );
    assert!(script.code.starts_with("Server {"));
    assert!(script.render().contains("host: \"example.org\""));
}
