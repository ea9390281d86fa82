//! Tests for installing overrides: signature checks, replacement and
//! dispatch argument checking through override subclasses.

use eigenclass::{
    ClassBuilder, ClassRef, DispatchError, Implementation, Method, ObjectRef, Runtime, Selector, Signature,
    TypeEncoding, Value,
};
use pretty_assertions::assert_eq;

fn counter(runtime: &Runtime) -> ClassRef {
    ClassBuilder::new("Counter")
        .typed_method(Selector::new("count"), |_: &ObjectRef| 0_i64)
        .typed_method(Selector::new("add:"), |this: &ObjectRef, amount: i64| {
            let current = this.ivar("total").and_then(|value| value.as_int()).unwrap_or(0);
            this.set_ivar("total", current + amount);
            current + amount
        })
        .register(runtime)
        .unwrap()
}

fn constant(value: i64) -> Implementation {
    Implementation::new(move |_, _, _| Ok(Value::Int(value)))
}

// =============================================================================
// 1. Signature Checks
// =============================================================================

/// Replacing an override with an incompatible signature fails and leaves the
/// installed override in place.
#[test]
fn incompatible_replacement_is_rejected() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let count = Selector::new("count");

    eigen
        .set_method(count.clone(), Signature::parse("q@:").unwrap(), constant(5))
        .unwrap();
    let installed = eigen.override_for(&count).unwrap();

    let err = eigen
        .set_method(count.clone(), Signature::parse("*@:").unwrap(), constant(6))
        .unwrap_err();
    assert_eq!(err.selector, count);
    assert_eq!(err.existing.to_string(), "q@:");
    assert_eq!(err.requested.to_string(), "*@:");

    assert_eq!(eigen.override_for(&count), Some(installed));
    assert_eq!(object.send(&count, &[]), Ok(Value::Int(5)));
}

/// Argument types count toward compatibility, not just arity.
#[test]
fn argument_types_must_match() {
    let runtime = Runtime::new();
    let eigen = runtime.eigen(&counter(&runtime).instantiate()).unwrap();
    let add = Selector::new("add:");

    eigen.set_typed(add.clone(), |_: &ObjectRef, amount: i64| amount).unwrap();
    assert!(eigen.set_typed(add.clone(), |_: &ObjectRef, amount: f64| amount).is_err());
    assert!(eigen.set_typed(add.clone(), |_: &ObjectRef, amount: i64| amount + 1).is_ok());
}

/// Compatible replacement swaps the entry and returns the previous one.
#[test]
fn compatible_replacement_returns_previous() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let count = Selector::new("count");
    let signature = Signature::parse("q@:").unwrap();

    let first = constant(1);
    assert_eq!(eigen.set_method(count.clone(), signature.clone(), first.clone()), Ok(None));
    let replaced = eigen
        .set_method(count.clone(), signature.clone(), constant(2))
        .unwrap()
        .unwrap();
    assert_eq!(replaced.implementation(), &first);
    assert_eq!(object.send(&count, &[]), Ok(Value::Int(2)));
    assert_eq!(eigen.overrides().len(), 1);
}

/// Signature checks apply to the override subclass's own entries: a first
/// override may change the shape of an inherited selector.
#[test]
fn first_override_may_reshape_inherited_selector() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let count = Selector::new("count");

    eigen
        .set_typed(count.clone(), |_: &ObjectRef| "many".to_owned())
        .unwrap();
    assert_eq!(object.send(&count, &[]), Ok(Value::from("many")));
    assert_eq!(eigen.original_method(&count).unwrap().signature().ret(), TypeEncoding::Int);
}

/// Prepared methods install like any other override.
#[test]
fn install_accepts_prepared_method() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let method = Method::typed(Selector::new("count"), |_: &ObjectRef| 42_i64);

    assert_eq!(eigen.install(method), Ok(None));
    assert_eq!(object.send(&Selector::new("count"), &[]), Ok(Value::Int(42)));
}

// =============================================================================
// 2. Dispatch Through Overrides
// =============================================================================

/// Overrides receive checked arguments and may keep per-object state.
#[test]
fn override_receives_arguments_and_state() {
    let runtime = Runtime::new();
    let class = counter(&runtime);
    let a = class.instantiate();
    let b = class.instantiate();
    let eigen = runtime.eigen(&a).unwrap();
    let add = Selector::new("add:");

    let original = eigen.original_implementation(&add).unwrap();
    eigen
        .set_typed(
            add.clone(),
            move |this: &ObjectRef, amount: i64| -> eigenclass::DispatchResult<i64> {
                let total = original.invoke(this, &Selector::new("add:"), &[Value::Int(amount * 10)])?;
                total.as_int().ok_or_else(|| DispatchError::raised("add: returned a non-integer"))
            },
        )
        .unwrap();

    assert_eq!(a.send(&add, &[Value::Int(2)]), Ok(Value::Int(20)));
    assert_eq!(a.send(&add, &[Value::Int(1)]), Ok(Value::Int(30)));
    assert_eq!(b.send(&add, &[Value::Int(2)]), Ok(Value::Int(2)));
}

/// Sends to an override with the wrong arguments fail before it runs.
#[test]
fn override_arguments_are_checked() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let add = Selector::new("add:");
    eigen.set_typed(add.clone(), |_: &ObjectRef, amount: i64| amount).unwrap();

    assert_eq!(
        object.send(&add, &[Value::from("one")]),
        Err(DispatchError::ArgumentType {
            selector: add.clone(),
            position: 0,
            expected: TypeEncoding::Int,
            given: TypeEncoding::Str,
        })
    );
    assert_eq!(
        object.send(&add, &[]),
        Err(DispatchError::ArgumentCount {
            selector: add.clone(),
            expected: 1,
            given: 0,
        })
    );
}

/// Untyped overrides returning the wrong type are caught at dispatch.
#[test]
fn override_return_type_is_checked() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let count = Selector::new("count");
    eigen
        .set_method(
            count.clone(),
            Signature::parse("q@:").unwrap(),
            Implementation::new(|_, _, _| Ok(Value::Bool(true))),
        )
        .unwrap();

    assert!(matches!(
        object.send(&count, &[]),
        Err(DispatchError::ReturnType {
            expected: TypeEncoding::Int,
            given: TypeEncoding::Bool,
            ..
        })
    ));
}

/// Failures raised by an override reach the sender unchanged.
#[test]
fn override_errors_propagate() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    let count = Selector::new("count");
    eigen
        .set_typed(count.clone(), |_: &ObjectRef| -> eigenclass::DispatchResult<i64> {
            Err(DispatchError::raised("counter is broken"))
        })
        .unwrap();

    let err = object.send(&count, &[]).unwrap_err();
    assert_eq!(err.to_string(), "counter is broken");
}

/// Unknown selectors name the class dispatch started from.
#[test]
fn unknown_selector_names_override_subclass() {
    let runtime = Runtime::new();
    let object = counter(&runtime).instantiate();
    runtime.eigen(&object).unwrap();

    assert_eq!(
        object.send(&Selector::new("reset"), &[]),
        Err(DispatchError::UnrecognizedSelector {
            class_name: "Eigen_Counter".to_owned(),
            selector: Selector::new("reset"),
        })
    );
}
