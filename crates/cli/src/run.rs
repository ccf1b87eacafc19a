//! Batch processing of description files
//!
//! Every description is translated and handled on its own; a failure is
//! reported and counted, and processing moves on to the next file.

use anyhow::{bail, Result};
use apigen_common::{Model, Printer};
use apigen_parser::{InOut, Translator};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// File extensions recognized as API descriptions
const DESCRIPTION_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// A description file and the directory its output location is relative to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub file: PathBuf,
    pub base_dir: PathBuf,
}

/// Translation switches shared by all files of a run
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub in_out: InOut,
    pub skip_trivial: bool,
}

/// Number of files handled and failed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub succeeded: usize,
    pub failed: usize,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

fn is_description(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| DESCRIPTION_EXTENSIONS.contains(&ext))
}

/// Expand command-line inputs into description files
///
/// Directories contribute the description files directly inside them, in
/// name order, relative to the directory itself. A file is relative to
/// its parent directory.
pub fn discover_inputs(paths: &[PathBuf]) -> Result<Vec<Input>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files = Vec::new();
            for entry in fs::read_dir(path)? {
                let file = entry?.path();
                if file.is_file() && is_description(&file) {
                    files.push(file);
                }
            }
            files.sort();
            debug!(dir = %path.display(), files = files.len(), "Scanned input directory");
            inputs.extend(files.into_iter().map(|file| Input {
                file,
                base_dir: path.clone(),
            }));
        } else if path.is_file() {
            inputs.push(Input {
                file: path.clone(),
                base_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            });
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }
    Ok(inputs)
}

/// Translate each input and pass the model to `handle`
pub fn process_inputs<F>(
    translator: &Translator,
    inputs: &[Input],
    options: Options,
    mut handle: F,
) -> Outcome
where
    F: FnMut(&Input, Model) -> Result<()>,
{
    let mut outcome = Outcome::default();
    for (i, input) in inputs.iter().enumerate() {
        println!(
            "{} Processing {}/{}: {}",
            "→".cyan(),
            i + 1,
            inputs.len(),
            input.file.display()
        );

        let result = translator
            .process_file(
                &input.file,
                &input.base_dir,
                options.in_out,
                options.skip_trivial,
            )
            .map_err(anyhow::Error::from)
            .and_then(|model| handle(input, model));

        match result {
            Ok(()) => outcome.succeeded += 1,
            Err(e) => {
                error!(file = %input.file.display(), "{}", e);
                eprintln!("{} {}", "✗".red(), e);
                outcome.failed += 1;
            }
        }
    }
    outcome
}

/// Print a model and report the files written
pub fn generate(printer: &dyn Printer, model: &Model) -> Result<Vec<PathBuf>> {
    let written = printer.print(model)?;
    for path in &written {
        println!("  {} {}", "✓".green(), path.display());
    }
    Ok(written)
}

/// Print a short description of a model
pub fn summarize(model: &Model, verbose: bool) {
    println!(
        "{} {}",
        "✓".green(),
        Path::new(model.file_dir()).join(model.filename()).display()
    );
    if !model.host_address.is_empty() || !model.base_path.is_empty() {
        println!(
            "  Server: {}{}",
            model.host_address.yellow(),
            model.base_path.yellow()
        );
    }
    println!("  Schemas: {}", model.types().len());
    println!("  Calls: {}", model.calls().count());
    println!("  Imports: {}", model.imports().len());

    if verbose {
        for schema in model.types() {
            println!("  • {} ({} fields)", schema.qualified_name().cyan(), schema.fields.len());
        }
        for class in model.call_classes() {
            println!("  {}", format!("[{}]", class.name).bold());
            for call in &class.calls {
                println!(
                    "    {} {} → {}",
                    call.verb.to_uppercase(),
                    call.path,
                    call.name.cyan()
                );
            }
        }
    }
}
