use std::{env, fs, process::ExitCode};

use eigenclass::{
    ClassBuilder, EigenError, Implementation, ObjectRef, RecordingTracer, Runtime, RuntimeConfig, Selector, Signature,
    Value,
};

/// Runs the `Shape` walk-through: one bound instance with an `area` override,
/// one untouched instance, and a call through to the original implementation.
///
/// An optional argument names a JSON runtime configuration file.
fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1).map(|path| load_config(path)).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = Runtime::with_tracer(config, RecordingTracer::new());
    if let Err(err) = run(&runtime) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    println!("\nevents:");
    for event in runtime.tracer().events() {
        println!("  {event:?}");
    }
    match runtime.stats().to_json() {
        Ok(json) => println!("\nstats:\n{json}"),
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn load_config(path: &str) -> Result<RuntimeConfig, String> {
    let json = fs::read_to_string(path).map_err(|err| format!("reading {path}: {err}"))?;
    RuntimeConfig::from_json(&json).map_err(|err| format!("parsing {path}: {err}"))
}

fn run(runtime: &Runtime<RecordingTracer>) -> Result<(), EigenError> {
    let area = Selector::new("area");
    let shape = ClassBuilder::new("Shape")
        .typed_method(area.clone(), |_: &ObjectRef| 10_i64)
        .register(runtime)?;

    let a = shape.instantiate();
    let b = shape.instantiate();

    let eigen = runtime.eigen(&a)?;
    println!("a is now {} (was {})", eigen.subclass().name(), eigen.original_class().name());

    eigen.set_method(
        area.clone(),
        Signature::parse("q@:")?,
        Implementation::new(|_, _, _| Ok(Value::Int(99))),
    )?;
    let original = eigen.original_implementation(&area)?;

    println!("a.area()          = {:?}", a.send(&area, &[])?);
    println!("original(a).area  = {:?}", original.invoke(&a, &area, &[])?);
    println!("b.area()          = {:?}", b.send(&area, &[])?);
    println!("a.description     = {:?}", a.send(&Selector::new("description"), &[])?);
    Ok(())
}
