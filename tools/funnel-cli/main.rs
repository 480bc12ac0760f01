use clap::{Parser, Subcommand};
use funnel_logic::evaluator::explain_visibility;
use funnel_logic::prelude::*;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Inspect, evaluate and simulate funnel definitions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional path to a session config JSON file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the pages and rules of a funnel definition
    Inspect {
        /// Path to the funnel definition (JSON, or an artifact with --artifact)
        definition: String,
        #[arg(long)]
        artifact: bool,
    },
    /// Show visible elements and the next page for a given form state
    Evaluate {
        definition: String,
        /// Path to a JSON object with the form state
        #[arg(short, long)]
        state: Option<String>,
        /// Field assignments, e.g. `--set plan=pro`
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
        /// Zero-based index of the current page
        #[arg(short, long, default_value_t = 0)]
        page: usize,
    },
    /// Compile a JSON definition into a binary artifact
    Compile { definition: String, output: String },
    /// Play the funnel front to back and submit against an in-memory store
    Simulate {
        definition: String,
        #[arg(short, long)]
        state: Option<String>,
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => SessionConfig::default(),
    };

    match cli.command {
        Command::Inspect {
            definition,
            artifact,
        } => run_inspect(&load_definition(&definition, artifact)),
        Command::Evaluate {
            definition,
            state,
            assignments,
            page,
        } => {
            let definition = load_definition(&definition, false);
            let state = load_state(state.as_deref(), &assignments);
            run_evaluate(&definition, &state, page, &config);
        }
        Command::Compile { definition, output } => run_compile(&definition, &output),
        Command::Simulate {
            definition,
            state,
            assignments,
        } => {
            let definition = load_definition(&definition, false);
            let state = load_state(state.as_deref(), &assignments);
            run_simulate(definition, state, config).await;
        }
    }
}

fn run_inspect(definition: &FunnelDefinition) {
    println!("Funnel '{}'", definition.funnel_id);
    println!("\n--- Pages ---");
    for (index, page) in definition.pages.iter().enumerate() {
        println!(
            "  {:>2}. {} ({:?}, order {}) - {} elements{}",
            index,
            page.id,
            page.page_type,
            page.order_index,
            page.content.elements.len(),
            if page.content.has_errors() {
                " [contains malformed elements]"
            } else {
                ""
            }
        );
    }
    println!("\n--- Rules ---");
    for rule in &definition.rules {
        let condition = rule.condition.as_ref().map_or_else(
            || "always".to_string(),
            |c| format!("{} {} {}", c.field, c.operator, c.value),
        );
        println!(
            "  [{}] on {}: if {} then {:?}",
            rule.id,
            rule.element_id.as_deref().unwrap_or("-"),
            condition,
            rule.action
        );
    }
}

fn run_evaluate(
    definition: &FunnelDefinition,
    state: &FormState,
    page: usize,
    config: &SessionConfig,
) {
    let Some(current) = definition.pages.get(page) else {
        exit_with_error(&format!(
            "Page index {} is out of range ({} pages)",
            page,
            definition.pages.len()
        ));
    };

    let eval_start = Instant::now();
    println!("Page {} '{}'", page, current.id);
    for element in &current.content.elements {
        let decision =
            explain_visibility(&element.id, &definition.rules, state, &config.evaluation);
        println!(
            "  {:<8} {} ({})",
            if decision.visible { "visible" } else { "hidden" },
            element.id,
            TraceFormatter::format_rules(&decision.matched)
        );
    }

    let evaluator = Evaluator::new(definition.rules.clone(), config.evaluation);
    let mut projected = state.clone();
    evaluator.apply_set_values(&mut projected);
    let next = evaluator.decide_next_page(page, &definition.pages, &projected);
    println!(
        "\n  -> Next page: {} '{}'",
        next.index,
        definition
            .pages
            .get(next.index)
            .map_or("-", |p| p.id.as_str())
    );
    println!("  -> Reason: {}", next.reason);
    println!("\nEvaluation: {:?}", eval_start.elapsed());
}

fn run_compile(definition_path: &str, output: &str) {
    let definition = load_definition(definition_path, false);
    definition
        .save(output)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to write artifact: {}", e)));
    println!(
        "Compiled '{}' ({} pages, {} rules) to {}",
        definition.funnel_id,
        definition.pages.len(),
        definition.rules.len(),
        output
    );
}

async fn run_simulate(definition: FunnelDefinition, answers: FormState, config: SessionConfig) {
    let store = Arc::new(InMemoryStore::with_definition(definition.clone()));
    let services = SubmitServices::new(
        Arc::new(BasicContactValidator),
        store.clone(),
        store.clone(),
    );
    let mut session = FunnelSession::new(definition, services, config);

    for (field, value) in answers.iter() {
        session.update_form_value(field, value.clone());
    }

    let mut trail = vec![session.current_page_index()];
    loop {
        let at = session.current_page_index();
        if session.current_page().is_some_and(Page::is_thank_you)
            || trail.len() > session.pages().len()
        {
            break;
        }
        let next = session.navigate_to_next_page();
        if next == at {
            break;
        }
        trail.push(next);
    }
    let visited: Vec<_> = trail
        .iter()
        .filter_map(|i| session.pages().get(*i).map(|p| p.id.as_str()))
        .collect();
    println!("Visited: {}", visited.join(" -> "));

    match session.submit_form(None).await {
        Some(lead) => {
            println!("  -> Lead {} for {}", lead.id, lead.email);
            println!("  -> Scoring: {:?}", lead.scoring);
            println!(
                "  -> Final page: {}",
                session.current_page().map_or("-", |p| p.id.as_str())
            );
        }
        None => {
            for notification in session.take_notifications() {
                println!("  -> {:?}: {}", notification.level, notification.message);
            }
        }
    }
}

fn load_definition(path: &str, artifact: bool) -> FunnelDefinition {
    let result = if artifact {
        FunnelDefinition::from_artifact_file(path)
    } else {
        FunnelDefinition::from_file(path)
    };
    result.unwrap_or_else(|e| exit_with_error(&format!("Failed to load '{}': {}", path, e)))
}

fn load_state(path: Option<&str>, assignments: &[String]) -> FormState {
    let mut state = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
            let json: serde_json::Value = serde_json::from_str(&content)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to parse state JSON: {}", e)));
            FormState::from_json_value(&json)
        }
        None => FormState::new(),
    };
    for assignment in assignments {
        let Some((field, raw)) = assignment.split_once('=') else {
            exit_with_error(&format!("Expected FIELD=VALUE, got '{}'", assignment));
        };
        // Values that parse as JSON keep their type; anything else is text.
        let value = serde_json::from_str::<serde_json::Value>(raw)
            .map(|v| FieldValue::from(&v))
            .unwrap_or_else(|_| FieldValue::text(raw));
        state.set(field.trim(), value);
    }
    state
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
