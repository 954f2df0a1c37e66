use hookstack_context::{
    Access, ContextError, ContextSlot, Dispatch, DispatchError, READ_PREFERENCE, ReadPreference,
    Visibility,
};
use serde_json::{Value, json};

static REGION: ContextSlot<String> = ContextSlot::new("region");

struct Sportsevent {
    name: String,
}

fn preference_now() -> Value {
    READ_PREFERENCE
        .current()
        .map_or(Value::Null, |p| Value::String(p.to_string()))
}

fn sportsevent_dispatch() -> Dispatch<Sportsevent> {
    let mut dispatch: Dispatch<Sportsevent> = Dispatch::new("Sportsevent");
    dispatch
        .define("primary_method", Visibility::Public, |_, _| preference_now())
        .define("other_method", Visibility::Public, |_, _| preference_now())
        .define("multi_1", Visibility::Public, |_, _| preference_now())
        .define("multi_2", Visibility::Public, |_, _| preference_now())
        .define("audit", Visibility::Protected, |_, _| preference_now())
        .define("reindex", Visibility::Private, |_, _| preference_now());
    dispatch
}

fn event() -> Sportsevent {
    Sportsevent {
        name: "final".to_string(),
    }
}

// ── Wrapping ─────────────────────────────────────────────────────

#[test]
fn wrapped_operation_runs_under_override() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Primary, &["primary_method"])
        .unwrap();

    let out = dispatch
        .invoke(&event(), Access::External, "primary_method", &[])
        .unwrap();
    assert_eq!(out, json!("primary"));
    assert_eq!(READ_PREFERENCE.current(), None);
}

#[test]
fn unwrapped_operation_sees_no_override() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Primary, &["primary_method"])
        .unwrap();

    let out = dispatch
        .invoke(&event(), Access::External, "other_method", &[])
        .unwrap();
    assert_eq!(out, Value::Null);
}

#[test]
fn several_operations_wrapped_at_once() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Secondary, &["multi_1", "multi_2"])
        .unwrap();

    for name in ["multi_1", "multi_2"] {
        let out = dispatch.invoke(&event(), Access::External, name, &[]).unwrap();
        assert_eq!(out, json!("secondary"));
    }
}

#[test]
fn wrapped_operation_overrides_caller_scope_and_restores_it() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Primary, &["primary_method"])
        .unwrap();

    hookstack_context::with_secondary(|| {
        let out = dispatch
            .invoke(&event(), Access::External, "primary_method", &[])
            .unwrap();
        assert_eq!(out, json!("primary"));
        assert_eq!(READ_PREFERENCE.current(), Some(ReadPreference::Secondary));
    });
}

#[test]
fn wrapping_preserves_arguments_and_return_value() {
    let mut dispatch: Dispatch<Sportsevent> = Dispatch::new("Sportsevent");
    dispatch.define("describe", Visibility::Public, |event, args| {
        json!({
            "name": event.name,
            "args": args,
            "region": REGION.current(),
        })
    });
    dispatch
        .wrap(&["describe"], REGION, "eu-west".to_string())
        .unwrap();

    let out = dispatch
        .invoke(&event(), Access::External, "describe", &[json!(1), json!("two")])
        .unwrap();
    assert_eq!(
        out,
        json!({"name": "final", "args": [1, "two"], "region": "eu-west"})
    );
    assert_eq!(REGION.current(), None);
}

#[test]
fn wrapping_twice_nests_outer_last() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Primary, &["other_method"])
        .unwrap();
    dispatch
        .read_preference(ReadPreference::Secondary, &["other_method"])
        .unwrap();

    // the second wrap surrounds the first, so the first is innermost
    let out = dispatch
        .invoke(&event(), Access::External, "other_method", &[])
        .unwrap();
    assert_eq!(out, json!("primary"));
}

// ── Visibility ───────────────────────────────────────────────────

#[test]
fn wrapping_keeps_protected_visibility() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Named("analytics".into()), &["audit"])
        .unwrap();

    assert_eq!(dispatch.visibility("audit"), Some(Visibility::Protected));
    let err = dispatch
        .invoke(&event(), Access::External, "audit", &[])
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::AccessDenied {
            operation: "audit".into(),
            visibility: Visibility::Protected,
            caller: Access::External,
        }
    );

    let out = dispatch
        .invoke(&event(), Access::Subtype, "audit", &[])
        .unwrap();
    assert_eq!(out, json!("analytics"));
}

#[test]
fn wrapping_keeps_private_visibility() {
    let mut dispatch = sportsevent_dispatch();
    dispatch
        .read_preference(ReadPreference::Primary, &["reindex"])
        .unwrap();

    assert!(dispatch
        .invoke(&event(), Access::External, "reindex", &[])
        .is_err());
    assert!(dispatch
        .invoke(&event(), Access::Subtype, "reindex", &[])
        .is_err());
    let out = dispatch
        .invoke(&event(), Access::Owner, "reindex", &[])
        .unwrap();
    assert_eq!(out, json!("primary"));
}

#[test]
fn visibility_rules() {
    assert!(Visibility::Public.permits(Access::External));
    assert!(Visibility::Protected.permits(Access::Owner));
    assert!(Visibility::Protected.permits(Access::Subtype));
    assert!(!Visibility::Protected.permits(Access::External));
    assert!(Visibility::Private.permits(Access::Owner));
    assert!(!Visibility::Private.permits(Access::Subtype));
}

#[test]
fn access_denied_message_names_operation() {
    let err = DispatchError::AccessDenied {
        operation: "reindex".into(),
        visibility: Visibility::Private,
        caller: Access::External,
    };
    let msg = format!("{err}");
    assert!(msg.contains("private"));
    assert!(msg.contains("reindex"));
}

// ── Configuration errors ─────────────────────────────────────────

#[test]
fn wrapping_nothing_is_a_configuration_error() {
    let mut dispatch = sportsevent_dispatch();
    let err = dispatch
        .read_preference(ReadPreference::Primary, &[])
        .unwrap_err();
    assert!(matches!(err, ContextError::Configuration(_)));
}

#[test]
fn wrapping_unknown_operation_changes_nothing() {
    let mut dispatch = sportsevent_dispatch();
    let err = dispatch
        .read_preference(ReadPreference::Primary, &["multi_1", "missing"])
        .unwrap_err();
    match err {
        ContextError::Configuration(msg) => assert!(msg.contains("missing")),
        other => panic!("unexpected error: {other:?}"),
    }

    // multi_1 was named before the bad entry but must not have been wrapped
    let out = dispatch
        .invoke(&event(), Access::External, "multi_1", &[])
        .unwrap();
    assert_eq!(out, Value::Null);
}

#[test]
fn unknown_operation_call_fails() {
    let dispatch = sportsevent_dispatch();
    let err = dispatch
        .invoke(&event(), Access::Owner, "nope", &[])
        .unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnknownOperation {
            type_name: "Sportsevent",
            operation: "nope".into(),
        }
    );
}

#[test]
fn debug_lists_operations_sorted() {
    let mut dispatch: Dispatch<Sportsevent> = Dispatch::new("Sportsevent");
    dispatch
        .define("b", Visibility::Public, |_, _| Value::Null)
        .define("a", Visibility::Public, |_, _| Value::Null);
    assert_eq!(
        format!("{dispatch:?}"),
        r#"Dispatch { type_name: "Sportsevent", operations: ["a", "b"] }"#
    );
}
