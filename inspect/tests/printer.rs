use inspect::value::ObjectKind;
use inspect::{ObjectRef, Value, print};

fn printed(value: &Value) -> String {
    print(value, false).expect("value should print")
}

#[test]
fn primitives_print_as_their_string_form() {
    assert_eq!(printed(&Value::from(5)), "5");
    assert_eq!(printed(&Value::from(2.5)), "2.5");
    assert_eq!(printed(&Value::from("text")), "text");
    assert_eq!(printed(&Value::from(true)), "true");
    assert_eq!(printed(&Value::Number(f64::NAN)), "NaN");
    assert_eq!(printed(&Value::Number(f64::NEG_INFINITY)), "-Infinity");
}

#[test]
fn absent_input_is_returned_unchanged() {
    assert_eq!(print(&Value::Null, false), None);
    assert_eq!(print(&Value::Undefined, true), None);
}

#[test]
fn record_keys_are_sorted() {
    let ba = Value::record([("b", Value::from(1)), ("a", Value::from(2))]);
    let ab = Value::record([("a", Value::from(2)), ("b", Value::from(1))]);
    assert_eq!(printed(&ba), "{ a: 2, b: 1 }");
    assert_eq!(printed(&ba), printed(&ab));
}

#[test]
fn nested_composites() {
    let value = Value::record([
        ("list", Value::array([Value::from(1), Value::from("two")])),
        ("inner", Value::record([("z", Value::Null), ("y", Value::Undefined)])),
    ]);
    assert_eq!(
        printed(&value),
        "{ inner: { y: undefined, z: null }, list: [ 1, two ] }"
    );
}

#[test]
fn empty_composites() {
    assert_eq!(printed(&Value::object()), "{}");
    assert_eq!(printed(&Value::array([])), "[]");
}

#[test]
fn array_elements_keep_index_order() {
    let items: Vec<Value> = (0..12).map(Value::from).collect();
    assert_eq!(
        printed(&Value::array(items)),
        "[ 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11 ]"
    );
}

#[test]
fn callables_and_pending_values_become_markers() {
    let value = Value::record([
        ("run", Value::function("run", |_| Value::Undefined)),
        ("later", Value::Pending),
    ]);
    assert_eq!(printed(&value), "{ later: [Promise], run: [Function] }");
    assert_eq!(printed(&Value::function("f", |_| Value::Null)), "[Function]");
}

#[test]
fn primitive_conversion_applies_first() {
    let date = ObjectRef::new(ObjectKind::Plain);
    date.set("ignored", Value::from(1));
    date.set_primitive(Some(Value::from(1_700_000_000_000i64)));

    assert_eq!(printed(&Value::Object(date.clone())), "1700000000000");

    let wrapper = Value::record([("at", Value::Object(date))]);
    assert_eq!(printed(&wrapper), "{ at: 1700000000000 }");
}

#[test]
fn hidden_properties_toggle() {
    let object = ObjectRef::new(ObjectKind::Plain);
    object.set("shown", Value::from(1));
    object.define("x", Value::from(2), false);
    let value = Value::Object(object);

    assert_eq!(print(&value, false).as_deref(), Some("{ shown: 1 }"));
    assert_eq!(print(&value, true).as_deref(), Some("{ shown: 1, x: 2 }"));
}

#[test]
fn prototype_chain_is_walked_for_hidden_properties() {
    let base = ObjectRef::new(ObjectKind::Plain);
    base.define("kind", Value::from("base"), false);
    base.set("shared", Value::from("from base"));

    let middle = ObjectRef::new(ObjectKind::Plain);
    middle.set("shared", Value::from("from middle"));
    middle.set_prototype(Some(base));

    let object = ObjectRef::new(ObjectKind::Plain);
    object.set("own", Value::from(1));
    object.set_prototype(Some(middle));
    let value = Value::Object(object);

    assert_eq!(print(&value, false).as_deref(), Some("{ own: 1 }"));
    assert_eq!(
        print(&value, true).as_deref(),
        Some("{ kind: base, own: 1, shared: from middle }")
    );
}

#[test]
fn self_reference_prints_a_cycle_marker() {
    let object = ObjectRef::new(ObjectKind::Plain);
    object.set("name", Value::from("loop"));
    object.set("me", Value::Object(object.clone()));

    assert_eq!(
        printed(&Value::Object(object)),
        "{ me: [Circular], name: loop }"
    );
}

#[test]
fn indirect_cycle_through_an_array() {
    let list = ObjectRef::new(ObjectKind::Array);
    let holder = Value::record([("list", Value::Object(list.clone()))]);
    list.push(Value::from(1));
    list.push(holder.clone());

    assert_eq!(printed(&holder), "{ list: [ 1, [Circular] ] }");
}

#[test]
fn shared_references_print_in_full() {
    let shared = Value::record([("v", Value::from(1))]);
    let value = Value::array([shared.clone(), shared]);
    assert_eq!(printed(&value), "[ { v: 1 }, { v: 1 } ]");
}

#[test]
fn named_array_properties_follow_the_elements() {
    let list = ObjectRef::new(ObjectKind::Array);
    list.push(Value::from("a"));
    list.set("tag", Value::from("t"));
    list.define("secret", Value::from("s"), false);
    let value = Value::Object(list);

    assert_eq!(print(&value, false).as_deref(), Some("[ a, tag: t ]"));
    assert_eq!(print(&value, true).as_deref(), Some("[ a, secret: s, tag: t ]"));
}

#[test]
fn errors_print_their_fields() {
    let error = Value::Error(inspect::ErrorObject::new("boom").with_stack("at test (1:1)"));
    assert_eq!(
        print(&error, false).as_deref(),
        Some("{ message: boom, stack: at test (1:1) }")
    );
    assert_eq!(
        print(&error, true).as_deref(),
        Some("{ message: boom, name: Error, stack: at test (1:1) }")
    );
}
