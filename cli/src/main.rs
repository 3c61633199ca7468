use std::{
    env, fs,
    io::Read,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::{ArgAction, Parser};
use console::style;
use dg_core::{Config, Diagnostic, Enhancer, Kind};
use serde::Serialize;
use walkdir::WalkDir;

/// Draftguard CLI entry point.
#[derive(Debug, Parser)]
#[command(name = "dg", about = "Check helpdesk reply drafts for spelling, grammar, and style.")]
struct Args {
    /// Path to config file (YAML). Defaults to draftguard.yml if present.
    #[arg(long, default_value = "draftguard.yml")]
    config: PathBuf,

    /// Emit JSON output for automation.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Strict mode: exit non-zero when any issue is found.
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Suppress per-issue output, print totals only.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,

    /// Print each draft with all known misspellings fixed instead of linting.
    #[arg(long, action = ArgAction::SetTrue)]
    fix: bool,

    /// Print each draft professionally formatted instead of linting.
    #[arg(long, action = ArgAction::SetTrue)]
    format: bool,

    /// Print completion options for the cursor offset in the first input.
    #[arg(long, value_name = "OFFSET")]
    complete_at: Option<usize>,

    /// List the canned suggestion catalog and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    suggestions: bool,

    /// Only report these issue kinds (comma-separated).
    #[arg(long, value_delimiter = ',', value_name = "KIND[,KIND]")]
    only: Vec<String>,

    /// Draft files or directories to check. Reads stdin when omitted.
    #[arg(value_name = "PATH", num_args = 0..)]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FileResult {
    path: String,
    word_count: usize,
    kind_counts: std::collections::BTreeMap<Kind, usize>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
struct OutputReport {
    files: Vec<FileResult>,
    total_diagnostics: usize,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("{} {err:#}", style("error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<bool> {
    let cfg = load_config(&args.config)?;
    let enhancer = Enhancer::new(cfg)?;
    let only = parse_kinds(&args.only)?;

    if args.suggestions {
        if args.json {
            println!("{}", serde_json::to_string_pretty(enhancer.suggestions())?);
        } else {
            for suggestion in enhancer.suggestions() {
                println!(
                    "{} [{}] {}",
                    style(&suggestion.text).bold(),
                    suggestion.category,
                    suggestion.description
                );
            }
        }
        return Ok(true);
    }

    let inputs = read_inputs(&args.paths)?;

    if let Some(cursor) = args.complete_at {
        let text = completion_input(&inputs)?;
        let completions = enhancer.complete(text, cursor);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&completions)?);
        } else {
            for completion in completions {
                println!("{completion}");
            }
        }
        return Ok(true);
    }

    if args.fix || args.format {
        for (_, text) in &inputs {
            let mut output = text.clone();
            if args.fix {
                output = enhancer.auto_fix(&output);
            }
            if args.format {
                output = dg_core::format_professionally(&output);
            }
            println!("{output}");
        }
        return Ok(true);
    }

    let mut files = Vec::new();
    let mut total = 0usize;
    for (name, text) in &inputs {
        let mut report = enhancer.report(text);
        if let Some(only) = &only {
            report.diagnostics.retain(|d| only.contains(&d.kind));
            report.kind_counts.retain(|kind, _| only.contains(kind));
        }
        total += report.diagnostics.len();

        if !args.json && !args.quiet {
            print_report(name, text, &report.diagnostics);
        }
        files.push(FileResult {
            path: name.clone(),
            word_count: report.word_count,
            kind_counts: report.kind_counts,
            diagnostics: report.diagnostics,
        });
    }

    if args.json {
        let output = OutputReport {
            files,
            total_diagnostics: total,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if total == 0 {
        if !args.quiet {
            println!("{}", style("No issues found.").green());
        }
    } else {
        println!(
            "{} {total} issue{} across {} input{}",
            style("Total:").bold(),
            if total == 1 { "" } else { "s" },
            files.len(),
            if files.len() == 1 { "" } else { "s" },
        );
    }

    Ok(!(args.strict && total > 0))
}

fn print_report(name: &str, text: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!("{}", style(name).cyan().bold());
    for diagnostic in diagnostics {
        let snippet = text
            .get(diagnostic.offset..diagnostic.offset + diagnostic.length)
            .unwrap_or("");
        let kind = match diagnostic.kind {
            Kind::Spelling => style("spelling").red(),
            Kind::Grammar => style("grammar").yellow(),
            Kind::Style => style("style").blue(),
        };
        if diagnostic.replacements.is_empty() {
            println!("  [{kind}] {}", diagnostic.message);
        } else {
            println!(
                "  [{kind}] {} (`{}` -> `{}`)",
                diagnostic.message,
                snippet.trim(),
                diagnostic.replacements[0]
            );
        }
    }
}

fn load_config(path: &PathBuf) -> anyhow::Result<Config> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid config structure in {}", path.display()))?;
        Ok(cfg)
    } else {
        Ok(Config::default())
    }
}

/// Completion needs one cursor against one text, so anything other than a
/// single input is refused instead of silently dropping the extras.
fn completion_input(inputs: &[(String, String)]) -> anyhow::Result<&str> {
    match inputs {
        [] => anyhow::bail!("no input to complete against"),
        [(_, text)] => Ok(text),
        more => anyhow::bail!(
            "--complete-at expects exactly one input, got {}",
            more.len()
        ),
    }
}

fn parse_kind(name: &str) -> Option<Kind> {
    match name.trim().to_lowercase().as_str() {
        "spelling" => Some(Kind::Spelling),
        "grammar" => Some(Kind::Grammar),
        "style" => Some(Kind::Style),
        _ => None,
    }
}

fn parse_kinds(names: &[String]) -> anyhow::Result<Option<Vec<Kind>>> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut kinds = Vec::new();
    for name in names {
        let kind = parse_kind(name)
            .with_context(|| format!("unknown issue kind `{name}`"))?;
        kinds.push(kind);
    }
    Ok(Some(kinds))
}

fn read_inputs(paths: &[PathBuf]) -> anyhow::Result<Vec<(String, String)>> {
    if paths.is_empty() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(vec![("<stdin>".into(), text)]);
    }

    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path) {
                let entry = entry?;
                if entry.file_type().is_file() && is_supported(entry.path()) {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files.sort();

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut inputs = Vec::new();
    for path in files {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .strip_prefix(&cwd)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        inputs.push((name, text));
    }
    Ok(inputs)
}

fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("txt") | Some("md")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, text: &str) -> (String, String) {
        (name.to_string(), text.to_string())
    }

    #[test]
    fn completion_requires_exactly_one_input() {
        assert!(completion_input(&[]).is_err());
        assert_eq!(
            completion_input(&[input("a.txt", "thank you for ")]).unwrap(),
            "thank you for "
        );
        let err = completion_input(&[input("a.txt", "x"), input("b.txt", "y")]).unwrap_err();
        assert!(err.to_string().contains("exactly one input"));
    }
}
