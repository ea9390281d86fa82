//! Tests for runtime tracers: the event stream recorded for a bind and
//! override sequence, and the logging tracer running without a subscriber.

use eigenclass::{
    ClassBuilder, LogTracer, ObjectRef, RecordingTracer, Runtime, RuntimeConfig, Selector, TraceEvent, Value,
};
use pretty_assertions::assert_eq;

fn area() -> Selector {
    Selector::new("area")
}

/// Binding, rebinding and installing emit events in call order.
#[test]
fn recording_tracer_captures_bind_sequence() {
    let runtime = Runtime::with_tracer(RuntimeConfig::new(), RecordingTracer::new());
    let shape = ClassBuilder::new("Shape")
        .typed_method(area(), |_: &ObjectRef| 10_i64)
        .register(&runtime)
        .unwrap();
    let a = shape.instantiate();
    let b = shape.instantiate();

    let eigen = runtime.eigen(&a).unwrap();
    runtime.eigen(&b).unwrap();
    runtime.eigen(&a).unwrap();
    eigen.set_typed(area(), |_: &ObjectRef| 99_i64).unwrap();
    eigen.set_typed(area(), |_: &ObjectRef| 98_i64).unwrap();

    let subclass = eigen.subclass();
    let expected = vec![
        TraceEvent::ClassRegistered {
            class: "Object".to_owned(),
            id: runtime.root_class().id(),
            synthesized: false,
        },
        TraceEvent::ClassRegistered {
            class: "Shape".to_owned(),
            id: shape.id(),
            synthesized: false,
        },
        TraceEvent::ClassRegistered {
            class: "Eigen_Shape".to_owned(),
            id: subclass.id(),
            synthesized: true,
        },
        TraceEvent::SubclassSynthesized {
            original: "Shape".to_owned(),
            subclass: "Eigen_Shape".to_owned(),
        },
        TraceEvent::ObjectBound {
            object: a.id(),
            subclass: "Eigen_Shape".to_owned(),
            rebind: false,
        },
        TraceEvent::SubclassReused {
            original: "Shape".to_owned(),
            subclass: "Eigen_Shape".to_owned(),
        },
        TraceEvent::ObjectBound {
            object: b.id(),
            subclass: "Eigen_Shape".to_owned(),
            rebind: false,
        },
        TraceEvent::ObjectBound {
            object: a.id(),
            subclass: "Eigen_Shape".to_owned(),
            rebind: true,
        },
        TraceEvent::MethodInstalled {
            class: "Eigen_Shape".to_owned(),
            selector: area(),
            replaced: false,
        },
        TraceEvent::MethodInstalled {
            class: "Eigen_Shape".to_owned(),
            selector: area(),
            replaced: true,
        },
    ];
    assert_eq!(runtime.tracer().events(), expected);
}

/// A rejected registration is recorded once; replays are silent.
#[test]
fn recording_tracer_captures_failure_once() {
    let runtime = Runtime::with_tracer(RuntimeConfig::new(), RecordingTracer::new());
    let widget = ClassBuilder::new("Widget").register(&runtime).unwrap();
    ClassBuilder::new("Eigen_Widget").register(&runtime).unwrap();
    runtime.tracer().take_events();

    assert!(runtime.eigen(&widget.instantiate()).is_err());
    assert!(runtime.eigen(&widget.instantiate()).is_err());

    assert_eq!(
        runtime.tracer().events(),
        vec![TraceEvent::RegistrationFailed {
            class: "Widget".to_owned(),
            reason: "the name is already taken by another class".to_owned(),
        }]
    );
}

/// Failed installs emit nothing.
#[test]
fn rejected_install_is_not_traced() {
    let runtime = Runtime::with_tracer(RuntimeConfig::new(), RecordingTracer::new());
    let object = runtime.root_class().instantiate();
    let eigen = runtime.eigen(&object).unwrap();
    eigen.set_typed(area(), |_: &ObjectRef| 1_i64).unwrap();
    let before = runtime.tracer().event_count();

    assert!(eigen.set_typed(area(), |_: &ObjectRef| true).is_err());
    assert_eq!(runtime.tracer().event_count(), before);
}

/// The logging tracer works with no subscriber installed.
#[test]
fn log_tracer_runs_shape_scenario() {
    let runtime = Runtime::with_tracer(RuntimeConfig::new(), LogTracer);
    let shape = ClassBuilder::new("Shape")
        .typed_method(area(), |_: &ObjectRef| 10_i64)
        .register(&runtime)
        .unwrap();
    let a = shape.instantiate();
    let eigen = runtime.eigen(&a).unwrap();
    eigen.set_typed(area(), |_: &ObjectRef| 99_i64).unwrap();

    assert_eq!(a.send(&area(), &[]), Ok(Value::Int(99)));
    assert_eq!(shape.instantiate().send(&area(), &[]), Ok(Value::Int(10)));
}
