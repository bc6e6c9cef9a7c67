//! Hint command - load a model and stream a hint for highlighted code.

use codehint_ai::{CodeHinter, HintConfig, ModelStatus};
use indicatif::{ProgressBar, ProgressStyle};
use miette::IntoDiagnostic;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::watch;

use crate::commands::model;
use crate::snippets;

pub(crate) struct HintArgs {
    pub file: Option<PathBuf>,
    pub highlight: Option<String>,
    pub lines: Option<String>,
    pub example: Option<usize>,
    pub model: Option<String>,
}

pub(crate) async fn run(args: HintArgs) -> miette::Result<()> {
    let code = load_code(&args)?;
    let highlighted = match (&args.highlight, &args.lines) {
        (Some(text), _) => text.clone(),
        (None, Some(range)) => select_lines(&code, range)?,
        (None, None) => code.clone(),
    };
    if !code.contains(highlighted.as_str()) {
        tracing::warn!("Highlighted text does not appear in the code");
    }

    let selected = model::resolve(args.model.as_deref())?;
    let hinter = CodeHinter::local(HintConfig::from_env());

    println!("Loading {}...", selected.model_id);
    let progress = tokio::spawn(show_progress(hinter.subscribe()));
    hinter.load_model(&selected).await;
    progress.await.into_diagnostic()??;

    if let Some(error) = hinter.status().error {
        return Err(miette::miette!("Failed to load model: {}", error));
    }

    println!();
    println!("Hint:");
    let mut stdout = std::io::stdout();
    let result = hinter
        .generate_hint_streaming(&code, &highlighted, |token| {
            let _ = write!(stdout, "{}", token);
            let _ = stdout.flush();
        })
        .await;
    println!();

    if let Err(e) = hinter.models().unload().await {
        tracing::warn!("Failed to stop llama-server: {}", e);
    }

    let hint = result.map_err(|e| miette::miette!("Failed to generate hint: {}", e))?;
    tracing::debug!("Final hint: {:?}", hint);
    Ok(())
}

fn load_code(args: &HintArgs) -> miette::Result<String> {
    if let Some(number) = args.example {
        let example = snippets::get(number)
            .ok_or_else(|| miette::miette!("No example {}. See: codehint examples", number))?;
        return Ok(example.code.to_string());
    }

    let path = args
        .file
        .as_ref()
        .ok_or_else(|| miette::miette!("Give a source file or --example N"))?;
    std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))
}

/// Pick 1-based inclusive lines, `4` or `3-5`.
fn select_lines(code: &str, range: &str) -> miette::Result<String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| miette::miette!("Invalid line range '{}'", range))
    };
    let (start, end) = match range.split_once('-') {
        Some((a, b)) => (parse(a)?, parse(b)?),
        None => {
            let n = parse(range)?;
            (n, n)
        }
    };

    let total = code.lines().count();
    if start == 0 || start > end || end > total {
        return Err(miette::miette!(
            "Line range {} is outside 1-{}",
            range,
            total
        ));
    }

    Ok(code
        .lines()
        .skip(start - 1)
        .take(end - start + 1)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Drive a progress bar from status changes until the load settles.
async fn show_progress(mut rx: watch::Receiver<ModelStatus>) -> miette::Result<()> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
            .into_diagnostic()?
            .progress_chars("#>-"),
    );

    while rx.changed().await.is_ok() {
        let status = rx.borrow_and_update().clone();
        pb.set_position(status.progress.into());
        if !status.loading {
            break;
        }
    }

    pb.finish_and_clear();
    Ok(())
}
