//! Interactive REPL for the house price estimator.
//!
//! Launch with `house-price-server repl` to enter interactive mode.
//! Type `/help` for available commands, Tab for completion.

use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};

use house_price::{FormFields, Page, Predictor};

use crate::config::resolve_model_path;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/estimate", "Enter a house page by page and estimate its price"),
    ("/schema", "List the form fields and model columns"),
    ("/model", "Show which model is loaded"),
    ("/load", "Load an .onnx model"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
#[derive(Default)]
struct EstimatorHelper;

impl Completer for EstimatorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        // .onnx file completion
        let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
        if cmd == "/load" {
            let prefix_start = input.len() - args.len();
            let matches: Vec<Pair> = onnx_files_in_cwd()
                .into_iter()
                .filter(|f| f.starts_with(args.trim()))
                .map(|f| Pair {
                    display: f.clone(),
                    replacement: format!("{f} "),
                })
                .collect();
            return Ok((prefix_start, matches));
        }

        Ok((pos, Vec::new()))
    }
}

fn onnx_files_in_cwd() -> Vec<String> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "onnx") {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    files.push(name.to_string());
                }
            }
        }
    }
    files.sort();
    files
}

impl Hinter for EstimatorHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for EstimatorHelper {}
impl Validator for EstimatorHelper {}
impl Helper for EstimatorHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

type EstimatorEditor = Editor<EstimatorHelper, DefaultHistory>;

/// Session state.
struct ReplState {
    predictor: Predictor,
    model_path: PathBuf,
}

/// Run the interactive REPL, loading the model from `model` or the usual
/// search locations.
pub fn run(model: Option<&str>) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m$\x1b[0m \x1b[1mhouse-price v{}\x1b[0m \x1b[90m- house price estimator\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Type \x1b[36m/estimate\x1b[0m to price a house, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: EstimatorEditor = Editor::with_config(config)?;
    rl.set_helper(Some(EstimatorHelper));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = PathBuf::from(&home).join(".house_price_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let model_path = resolve_model_path(model);
    let mut state = ReplState {
        predictor: Predictor::load(&model_path),
        model_path,
    };
    cmd_model(&state);

    let prompt = " \x1b[36mhouse>\x1b[0m ";

    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let (cmd, args) = input.split_once(' ').unwrap_or((input, ""));
                let args = args.trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "estimate" | "e" => cmd_estimate(&mut rl, &state),
                    "schema" => cmd_schema(),
                    "model" => cmd_model(&state),
                    "load" => cmd_load(args, &mut state),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completion works for commands and .onnx files.");
    eprintln!();
}

fn cmd_schema() {
    for page in Page::ALL {
        eprintln!();
        eprintln!("  Page {}: {}", page.number(), page.title());
        for field in page.fields() {
            let choices = field
                .choices()
                .map(|c| format!(" [{}]", c.join(", ")))
                .unwrap_or_default();
            eprintln!(
                "    {:<20} {:<28} {}{choices}",
                field.key,
                field.column,
                field.kind.describe()
            );
        }
    }
    eprintln!();
}

fn cmd_model(state: &ReplState) {
    match state.predictor.model_name() {
        Some(name) => eprintln!(
            "  Model: {} ({name})",
            state.model_path.display()
        ),
        None => eprintln!(
            "  No model loaded (looked for {}). Use /load <file.onnx>.",
            state.model_path.display()
        ),
    }
}

fn cmd_load(args: &str, state: &mut ReplState) {
    if args.is_empty() {
        eprintln!("  Usage: /load <file.onnx>");
        return;
    }
    let path = PathBuf::from(args.split_whitespace().next().unwrap_or(args));
    let predictor = Predictor::load(&path);
    if predictor.has_model() {
        eprintln!("  Loaded: {}", path.display());
        state.predictor = predictor;
        state.model_path = path;
    } else {
        eprintln!("  Failed to load {}. Keeping the current model.", path.display());
    }
}

fn cmd_estimate(rl: &mut EstimatorEditor, state: &ReplState) {
    if !state.predictor.has_model() {
        eprintln!("  No model loaded. Use /load <file.onnx> first.");
        return;
    }

    let Some(form) = prompt_form(rl) else {
        eprintln!("  Estimate cancelled.");
        return;
    };

    match state.predictor.estimate(&form) {
        Ok(estimate) => {
            eprintln!();
            eprintln!("  Estimated price: \x1b[1m{}\x1b[0m", estimate.formatted);
            eprintln!();
        }
        Err(e) => eprintln!("  An error occurred: {e}"),
    }
}

/// Ask for every field page by page. `None` when the user aborts.
fn prompt_form(rl: &mut EstimatorEditor) -> Option<FormFields> {
    let mut form = FormFields::new();

    for page in Page::ALL {
        eprintln!();
        eprintln!(
            "  \x1b[1mStep {} of {}: {}\x1b[0m",
            page.number(),
            Page::ALL.len(),
            page.title()
        );
        for field in page.fields() {
            let hint = field
                .choices()
                .map(|c| c.join("/"))
                .unwrap_or_else(|| field.kind.describe().to_string());
            let prompt = format!("    {} ({hint}): ", field.label);

            let value = loop {
                match rl.readline(&prompt) {
                    Ok(line) if !line.trim().is_empty() => break line.trim().to_string(),
                    Ok(_) => eprintln!("    A value is required."),
                    Err(_) => return None,
                }
            };
            form.insert(field.key.to_string(), value);
        }
    }

    Some(form)
}
