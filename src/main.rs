//! textgauge: Text Quality Scoring CLI

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use textgauge::config::{build_ignore_set, is_ignored, load_config, Config, CONFIG_FILENAME};
use textgauge::experiment::{
    ExperimentExport, ExperimentStore, JsonFileStore, Scheduler, DEFAULT_LIST_LIMIT,
};
use textgauge::generation::{is_generation_available, ChatCompletionsClient, GenerationParams};
use textgauge::reporter::{ConsoleReporter, JsonReporter};
use textgauge::{ScoredText, TextQualityScorer};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Files above this count are scored on the rayon pool
const PARALLEL_FILE_COUNT: usize = 10;

/// Source label used for text read from stdin
const STDIN_SOURCE: &str = "<stdin>";

/// textgauge: heuristic quality scoring for generated text
#[derive(Parser, Debug)]
#[command(name = "textgauge")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Response file or directory to score, or `-` for stdin (omit when using a subcommand)
    #[arg(required = true)]
    path: Option<PathBuf>,

    /// Prompt the response was generated from
    #[arg(long, short, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the prompt from a file
    #[arg(long, value_name = "FILE")]
    prompt_file: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Minimum overall score threshold (exit 1 if below)
    #[arg(long, short)]
    threshold: Option<u8>,

    /// Quiet mode (minimal output)
    #[arg(long, short)]
    quiet: bool,

    /// Verbose output (component breakdown, debug logging)
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .textgaugerc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Score files in parallel (default for directories with many files)
    #[arg(long)]
    parallel: bool,

    /// Number of parallel threads (default: number of CPU cores)
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create .textgaugerc.json with sensible defaults
    Init {
        /// Minimum score threshold (e.g. 70)
        #[arg(long)]
        threshold: Option<u8>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Run and inspect generation experiments
    Experiment {
        #[command(subcommand)]
        command: ExperimentCommand,
    },
}

/// Options shared by every experiment subcommand
#[derive(ClapArgs, Debug)]
struct StoreArgs {
    /// Experiment store file (default: from config, or .textgauge/experiments.json)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum ExperimentCommand {
    /// Generate three responses for a prompt and score them
    Run {
        /// Prompt to send to every configuration
        #[arg(long, short)]
        prompt: String,

        /// JSON file with three {temperature, top_p, max_tokens} objects
        #[arg(long, value_name = "FILE")]
        params_file: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// List recent experiments, newest first
    List {
        /// Maximum number of experiments to show
        #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Show one experiment with its responses and comparison
    Show {
        id: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Delete an experiment
    Delete {
        id: String,

        #[command(flatten)]
        store: StoreArgs,
    },

    /// Export an experiment's results as JSON
    Export {
        id: String,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        #[command(flatten)]
        store: StoreArgs,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("TEXTGAUGE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<ExitCode> {
    let mut args = Args::parse();

    if let Some(cmd) = args.command.take() {
        return match cmd {
            Commands::Init { threshold, dir } => run_init(threshold, dir.as_deref()),
            Commands::Experiment { command } => run_experiment(command),
        };
    }

    init_tracing(args.verbose);

    let path = args
        .path
        .clone()
        .context("a path is required when not using a subcommand")?;
    let from_stdin = path.as_os_str() == "-";

    // Resolve work directory for config search
    let work_dir = if from_stdin {
        std::env::current_dir().context("Failed to get current directory")?
    } else if path.is_file() {
        path.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        path.clone()
    };

    // Load config (CLI flags override config file)
    let config = load_config(&work_dir, args.config.as_deref())?.merge_with_cli(args.threshold);

    let prompt = resolve_prompt(&args, &config)?;

    let ignore_set = if config.ignore.is_empty() {
        None
    } else {
        Some(build_ignore_set(&config.ignore)?)
    };

    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let scorer = TextQualityScorer::new();

    let (results, had_errors) = if from_stdin {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read response from stdin")?;
        let report = scorer.explain(&text, &prompt);
        (vec![ScoredText::new(STDIN_SOURCE, report)], false)
    } else {
        let extensions = config.get_extensions();
        let files = collect_text_files(&path, ignore_set.as_ref(), &extensions)?;

        if files.is_empty() {
            eprintln!("{}: No text files found", "Warning".yellow());
            return Ok(ExitCode::from(2));
        }

        let use_parallel = args.parallel || files.len() > PARALLEL_FILE_COUNT;
        tracing::debug!(files = files.len(), parallel = use_parallel, "scoring files");
        if use_parallel {
            score_files_parallel(&scorer, &files, &prompt, args.quiet)
        } else {
            score_files_sequential(&scorer, &files, &prompt, args.quiet)
        }
    };

    if results.is_empty() {
        eprintln!("{}: All files failed to score", "Error".red());
        return Ok(ExitCode::from(2));
    }

    let stats = TextQualityScorer::aggregate_stats(&results);

    if args.json {
        let mut reporter = JsonReporter::new().pretty();
        if args.verbose {
            reporter = reporter.with_breakdown();
        }
        if results.len() == 1 {
            println!("{}", reporter.report(&results[0]));
        } else {
            println!("{}", reporter.report_with_summary(&results, &stats));
        }
    } else if args.quiet {
        let reporter = ConsoleReporter::new();
        for result in &results {
            reporter.report_quiet(result);
        }
    } else {
        let mut reporter = ConsoleReporter::new();
        if args.verbose {
            reporter = reporter.verbose();
        }

        if results.len() == 1 {
            reporter.report(&results[0]);
        } else {
            reporter.report_many(&results, &stats);
        }
    }

    // Check threshold: the file's own for a single file, the average otherwise
    let (score, threshold) = if results.len() == 1 {
        let threshold = args
            .threshold
            .or_else(|| config.threshold_for_file(Path::new(&results[0].source)));
        (results[0].metrics().overall, threshold)
    } else {
        (stats.average_overall, config.threshold)
    };

    if let Some(threshold) = threshold {
        if score < f64::from(threshold) {
            if !args.quiet && !args.json {
                eprintln!(
                    "\n{}: Score {:.2} is below threshold {}",
                    "Failed".red().bold(),
                    score,
                    threshold
                );
            }
            return Ok(ExitCode::from(1));
        }
    }

    if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// `--prompt`, then `--prompt-file`, then the config's `defaultPrompt`
fn resolve_prompt(args: &Args, config: &Config) -> Result<String> {
    if let Some(ref prompt) = args.prompt {
        return Ok(prompt.clone());
    }
    if let Some(ref file) = args.prompt_file {
        let prompt = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read prompt file {}", file.display()))?;
        return Ok(prompt.trim_end().to_string());
    }
    config.default_prompt.clone().with_context(|| {
        format!(
            "a prompt is required: pass --prompt, --prompt-file, or set defaultPrompt in {}",
            CONFIG_FILENAME
        )
    })
}

fn run_init(threshold: Option<u8>, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let threshold_value = threshold.unwrap_or(70);
    if threshold_value > 100 {
        anyhow::bail!("threshold must be 0-100, got {}", threshold_value);
    }

    let [a, b, c] = GenerationParams::defaults();
    let config = serde_json::json!({
        "threshold": threshold_value,
        "extensions": [".txt", ".md"],
        "ignore": ["**/drafts/**"],
        "store": textgauge::config::DEFAULT_STORE_PATH,
        "generation": {
            "endpoint": textgauge::generation::chat::DEFAULT_ENDPOINT,
            "model": textgauge::generation::chat::DEFAULT_MODEL,
            "apiKeyEnv": textgauge::generation::chat::DEFAULT_API_KEY_ENV
        },
        "configs": [a, b, c]
    });
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;

    std::fs::write(&config_path, format!("{}\n", json))
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with threshold={}",
        "Done".green().bold(),
        config_path.display(),
        threshold_value
    );

    Ok(ExitCode::SUCCESS)
}

fn run_experiment(command: ExperimentCommand) -> Result<ExitCode> {
    match command {
        ExperimentCommand::Run {
            prompt,
            params_file,
            store,
        } => {
            init_tracing(store.verbose);
            let config = load_experiment_config(&store)?;
            let params = match params_file {
                Some(ref file) => load_params_file(file)?,
                None => config.generation_params(),
            };
            let generator = build_generator(&config)?;
            let scheduler = Scheduler::new(Arc::new(open_store(&store, &config)?), generator);

            let events = scheduler.subscribe();
            let id = scheduler.submit(&prompt, params)?;
            if !store.json {
                eprintln!(
                    "{}: Running experiment {} (3 configurations)",
                    "Info".blue(),
                    id
                );
            }
            let experiment = scheduler.run(&id)?;

            if store.verbose {
                let trail: Vec<String> = events.try_iter().map(|e| e.status.to_string()).collect();
                eprintln!("{}: {} {}", "Info".blue(), id, trail.join(" -> "));
            }

            let failures = experiment
                .responses()
                .iter()
                .filter(|r| r.generation_error)
                .count();
            if failures > 0 && !store.json {
                eprintln!(
                    "{}: {} of 3 configurations failed to generate; their error text was scored",
                    "Warning".yellow(),
                    failures
                );
            }

            if store.json {
                println!("{}", JsonReporter::new().pretty().report_experiment(&experiment));
            } else {
                report_console(&store).report_experiment(&experiment);
            }
            Ok(ExitCode::SUCCESS)
        }

        ExperimentCommand::List { limit, store } => {
            init_tracing(store.verbose);
            let config = load_experiment_config(&store)?;
            let experiments = open_store(&store, &config)?.list(limit)?;
            if store.json {
                println!(
                    "{}",
                    JsonReporter::new()
                        .pretty()
                        .report_experiment_list(&experiments)
                );
            } else {
                report_console(&store).report_experiment_list(&experiments);
            }
            Ok(ExitCode::SUCCESS)
        }

        ExperimentCommand::Show { id, store } => {
            init_tracing(store.verbose);
            let config = load_experiment_config(&store)?;
            let experiment = open_store(&store, &config)?.get(&id)?;
            if store.json {
                println!("{}", JsonReporter::new().pretty().report_experiment(&experiment));
            } else {
                report_console(&store).report_experiment(&experiment);
            }
            Ok(ExitCode::SUCCESS)
        }

        ExperimentCommand::Delete { id, store } => {
            init_tracing(store.verbose);
            let config = load_experiment_config(&store)?;
            if open_store(&store, &config)?.delete(&id)? {
                println!("{}: Deleted experiment {}", "Done".green().bold(), id);
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{}: No experiment with id {}", "Warning".yellow(), id);
                Ok(ExitCode::from(2))
            }
        }

        ExperimentCommand::Export { id, output, store } => {
            init_tracing(store.verbose);
            let config = load_experiment_config(&store)?;
            let experiment = open_store(&store, &config)?.get(&id)?;
            let export = ExperimentExport::from_experiment(&experiment)?;
            let json = export.to_json()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{}\n", json))
                        .with_context(|| format!("Failed to write export to {}", path.display()))?;
                    eprintln!(
                        "{}: Exported {} to {}",
                        "Info".blue(),
                        id,
                        path.display()
                    );
                }
                None => println!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_experiment_config(store: &StoreArgs) -> Result<Config> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    load_config(&cwd, store.config.as_deref())
}

fn open_store(store: &StoreArgs, config: &Config) -> Result<JsonFileStore> {
    let path = store.store.clone().unwrap_or_else(|| config.store_path());
    JsonFileStore::open(&path)
        .with_context(|| format!("Failed to open experiment store {}", path.display()))
}

fn report_console(store: &StoreArgs) -> ConsoleReporter {
    if store.verbose {
        ConsoleReporter::new().verbose()
    } else {
        ConsoleReporter::new()
    }
}

fn load_params_file(path: &Path) -> Result<[GenerationParams; 3]> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file {}", path.display()))?;
    let params: Vec<GenerationParams> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in params file {}", path.display()))?;
    let params: [GenerationParams; 3] = params.try_into().map_err(|v: Vec<GenerationParams>| {
        anyhow::anyhow!(
            "params file {} must hold exactly 3 configurations, got {}",
            path.display(),
            v.len()
        )
    })?;
    Ok(params)
}

fn build_generator(config: &Config) -> Result<Arc<ChatCompletionsClient>> {
    if !is_generation_available() {
        anyhow::bail!(textgauge::generation::GenerationError::Unavailable);
    }

    let key_var = config
        .generation
        .api_key_env
        .as_deref()
        .unwrap_or(textgauge::generation::chat::DEFAULT_API_KEY_ENV);
    let mut client = ChatCompletionsClient::from_env_var(key_var)?;
    if let Some(ref endpoint) = config.generation.endpoint {
        client = client.endpoint(endpoint);
    }
    if let Some(ref model) = config.generation.model {
        client = client.model(model);
    }
    Ok(Arc::new(client))
}

fn collect_text_files(
    path: &Path,
    ignore_set: Option<&globset::GlobSet>,
    extensions: &[&str],
) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if let Some(set) = ignore_set {
            if is_ignored(path, set) {
                return Ok(vec![]);
            }
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let mut files = Vec::new();

    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| e.ok())
    {
        let file_path = entry.path();
        if entry.file_type().is_file() && is_text_file(file_path, extensions) {
            if let Some(set) = ignore_set {
                if is_ignored(file_path, set) {
                    continue;
                }
            }
            files.push(file_path.to_path_buf());
        }
    }

    // Sort for consistent output
    files.sort();
    Ok(files)
}

/// Hidden entries below the root (.git, .textgauge) are never walked
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn is_text_file(path: &Path, extensions: &[&str]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    extensions.iter().any(|ext| name.ends_with(ext))
}

fn score_file(scorer: &TextQualityScorer, file: &Path, prompt: &str) -> Result<ScoredText> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(ScoredText::new(
        file.display().to_string(),
        scorer.explain(&text, prompt),
    ))
}

/// Score files one at a time
fn score_files_sequential(
    scorer: &TextQualityScorer,
    files: &[PathBuf],
    prompt: &str,
    quiet: bool,
) -> (Vec<ScoredText>, bool) {
    let mut results = Vec::new();
    let mut had_errors = false;

    for file in files {
        match score_file(scorer, file, prompt) {
            Ok(result) => results.push(result),
            Err(e) => {
                if !quiet {
                    eprintln!("{}: {:#}", "Error".red(), e);
                }
                had_errors = true;
            }
        }
    }

    (results, had_errors)
}

/// Score files on the rayon pool, keeping input order
fn score_files_parallel(
    scorer: &TextQualityScorer,
    files: &[PathBuf],
    prompt: &str,
    quiet: bool,
) -> (Vec<ScoredText>, bool) {
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    let had_errors = AtomicBool::new(false);

    let results: Vec<_> = files
        .par_iter()
        .filter_map(|file| match score_file(scorer, file, prompt) {
            Ok(result) => Some(result),
            Err(e) => {
                if !quiet {
                    eprintln!("{}: {:#}", "Error".red(), e);
                }
                had_errors.store(true, Ordering::Relaxed);
                None
            }
        })
        .collect();

    (results, had_errors.load(Ordering::Relaxed))
}
