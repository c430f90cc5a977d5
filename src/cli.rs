//! fsm-studio CLI - inspect and validate state machine documents

use std::env;
use std::process::ExitCode;

use fsm_studio::{EditorConfig, Initializer, PlatformRegistry};

fn usage() {
    println!("fsm-studio CLI - State machine document checker");
    println!("Usage: fsm-studio-cli <document.json> [--platforms <platforms.json>] [--config <config.json>]");
    println!();
    println!("Example: fsm-studio-cli tests/fixtures/blinker.json --platforms tests/fixtures/platforms.json");
}

struct Args {
    document: String,
    platforms: Option<String>,
    config: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut document = None;
    let mut platforms = None;
    let mut config = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--platforms" => platforms = Some(args.next()?),
            "--config" => config = Some(args.next()?),
            _ if document.is_none() => document = Some(arg.clone()),
            _ => return None,
        }
    }
    Some(Args {
        document: document?,
        platforms,
        config,
    })
}

fn main() -> ExitCode {
    env_logger::init();

    let Some(args) = parse_args(env::args().skip(1)) else {
        usage();
        return ExitCode::FAILURE;
    };

    let config = match &args.config {
        Some(path) => match EditorConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Could not load config '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => EditorConfig::default(),
    };

    let controller = match Initializer::new(config)
        .with_structure_check(true)
        .open_file(&args.document)
    {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("❌ Could not open '{}': {}", args.document, e);
            return ExitCode::FAILURE;
        }
    };

    let elements = controller.elements();
    println!("✅ Loaded {} state machine(s):", elements.state_machines.len());
    for (sm_id, sm) in &elements.state_machines {
        println!();
        println!("  Machine: {} ({})", sm.name.as_deref().unwrap_or(sm_id.as_str()), sm.platform);
        println!("  States: {}", sm.states.len());
        for (id, state) in &sm.states {
            let depth = sm.depth(id);
            println!("    {}- {} [{}]", "  ".repeat(depth), state.name, id);
        }
        println!("  Transitions: {}", sm.transitions.len());
        for (id, t) in &sm.transitions {
            let layer = controller
                .transition_layer(sm_id, id)
                .flatten()
                .unwrap_or("top level");
            println!("    {} --> {} (layer: {})", t.source, t.target, layer);
        }
        println!("  Components: {}", sm.components.len());
        for (name, component) in &sm.components {
            println!("    - {}: {}", name, component.component_type);
        }
        if !sm.notes.is_empty() {
            println!("  Notes: {}", sm.notes.len());
        }
    }

    let Some(path) = &args.platforms else {
        return ExitCode::SUCCESS;
    };
    let platforms = match PlatformRegistry::from_file(path) {
        Ok(platforms) => platforms,
        Err(e) => {
            eprintln!("❌ Could not load platforms '{}': {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    println!();
    match controller.validate(&platforms) {
        Ok(()) => {
            println!("✅ Document is valid for its platform(s)");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ Validation error: {}", e);
            ExitCode::FAILURE
        }
    }
}
