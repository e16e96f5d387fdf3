//! PromptViz CLI - run one generation cycle from the terminal
//!
//! Usage:
//!   promptviz --prompt "Total sales per month as a line chart"
//!   promptviz --scenario "Sales Distribution Across Regions" --execute
//!
//! Prints each configured model's generated code and, with --execute, the
//! execution outcome.

use anyhow::{Context, Result};
use colored::Colorize;
use promptviz::dataset::TabularDataset;
use promptviz::orchestrator::GenerationOrchestrator;
use promptviz::provider::{GenerationRequest, OpenRouterClient};
use promptviz::safety::is_code_safe;
use promptviz::sandbox::{PlotSandbox, RenderResult};
use promptviz::{scenario, AppConfig};
use std::sync::Arc;

const SAMPLE_ROWS: usize = 5;

fn print_usage() {
    eprintln!(
        r#"
{} - Compare LLM-generated visualizations for one prompt

{}
    promptviz [OPTIONS]

{}
    -p, --prompt <TEXT>        Free-form visualization request
    -s, --scenario <NAME>      Business problem from the built-in catalog
                               (wins over --prompt when both are given)
    -l, --list                 List the catalog and exit
    -c, --config <PATH>        Config file (default: config.toml)
    -x, --execute              Execute each result in the plotting sandbox
    -h, --help                 Print this help message

{}
    promptviz --list
    promptviz -s "Monthly Sales Trend Analysis"
    promptviz -p "profit by category as a bar chart" -x
"#,
        "PromptViz CLI".bold(),
        "USAGE:".bold(),
        "OPTIONS:".bold(),
        "EXAMPLES:".bold(),
    );
}

struct CliArgs {
    prompt: Option<String>,
    scenario: Option<String>,
    config_path: String,
    list: bool,
    execute: bool,
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        std::process::exit(0);
    }

    let mut prompt = None;
    let mut scenario = None;
    let mut config_path = "config.toml".to_string();
    let mut list = false;
    let mut execute = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--prompt" | "-p" => {
                i += 1;
                prompt = args.get(i).cloned();
            }
            "--scenario" | "-s" => {
                i += 1;
                scenario = args.get(i).cloned();
            }
            "--config" | "-c" => {
                i += 1;
                if let Some(path) = args.get(i) {
                    config_path = path.clone();
                }
            }
            "--list" | "-l" => list = true,
            "--execute" | "-x" => execute = true,
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Ok(CliArgs {
        prompt,
        scenario,
        config_path,
        list,
        execute,
    })
}

fn print_catalog() {
    println!("{}", "Business problem catalog:".bold());
    for s in scenario::catalog() {
        println!(
            "  {:>2}. {} {}",
            s.problem_id,
            s.name,
            format!("[{} / {}]", s.visualization_type, s.complexity).dimmed()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;

    if args.list {
        print_catalog();
        return Ok(());
    }

    dotenvy::dotenv().ok();

    let config: AppConfig = match std::fs::read_to_string(&args.config_path) {
        Ok(contents) => toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", args.config_path))?,
        Err(_) => AppConfig::default(),
    };
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", args.config_path))?;

    let prompt_text = if let Some(name) = args.scenario.as_deref() {
        let s = scenario::find(name)
            .with_context(|| format!("Unknown business problem: {name} (see --list)"))?;
        s.prompt()
    } else {
        let text = args.prompt.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            eprintln!("{}", "A --prompt or --scenario is required.".red());
            print_usage();
            std::process::exit(1);
        }
        text
    };

    let api_key = std::env::var("OPENROUTER_API_KEY")
        .context("OPENROUTER_API_KEY is not set; export the key or put it in a .env file")?;

    let dataset = TabularDataset::load(&config.dataset_path)
        .with_context(|| format!("Failed to load dataset: {}", config.dataset_path))?;

    let generator = OpenRouterClient::new(
        &config.base_url,
        &api_key,
        config.max_tokens,
        config.temperature,
    );
    let orchestrator = GenerationOrchestrator::new(Arc::new(generator));

    println!("{} {}", "Prompt:".bold(), prompt_text);
    println!(
        "{} {} model(s), dataset {} ({} rows)\n",
        "Running:".bold(),
        config.models.len(),
        config.dataset_path,
        dataset.row_count()
    );

    let request = GenerationRequest {
        prompt_text,
        dataset_columns: dataset.columns().to_vec(),
        dataset_sample: dataset.head_preview(SAMPLE_ROWS),
    };

    let results = orchestrator.run_cycle(&request, &config.models).await;
    let sandbox = PlotSandbox::new();

    for result in results.iter() {
        println!("{}", format!("=== {} ===", result.model_name).cyan().bold());
        if !result.success {
            println!("{}\n", result.code.red());
            continue;
        }
        println!("{}\n", result.code);

        if !args.execute {
            continue;
        }
        if !is_code_safe(&result.code) {
            println!("{}\n", "Skipped: blocked by the code safety filter".yellow());
            continue;
        }
        match sandbox.execute(&result.code, &dataset) {
            Ok(RenderResult::Static { png_base64 }) => {
                println!(
                    "{} static chart rendered ({} bytes of PNG)\n",
                    "OK:".green().bold(),
                    png_base64.len() * 3 / 4
                );
            }
            Ok(RenderResult::Interactive { spec }) => {
                println!(
                    "{} interactive chart rendered ({} byte plotly spec)\n",
                    "OK:".green().bold(),
                    spec.len()
                );
            }
            Err(e) => println!("{} {}\n", "Execution failed:".red().bold(), e),
        }
    }

    Ok(())
}
