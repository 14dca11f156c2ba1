use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};
use zeile_core::diagnostic::{has_errors, Diagnostic, TextPosition};
use zeile_core::ir::Story;
use zeile_core::pipeline::{Backend, Frontend, FrontendInput, FrontendOutput};
use zeile_core::project::{
    ProjectManifest, SourceFormat, TargetBackend, TargetConfig, MANIFEST_FILE_NAME,
};
use zeile_evaluator_typescript::{FunctionEvaluator, TscConfig, TscTranspiler};

#[derive(Parser)]
#[command(name = "zeile", about = "Story asset conversion toolchain")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the project manifest summary.
    Info {
        #[arg(long, default_value = MANIFEST_FILE_NAME)]
        manifest: PathBuf,
    },
    /// Convert the source asset and write the story IR as JSON.
    Convert {
        #[arg(long, default_value = MANIFEST_FILE_NAME)]
        manifest: PathBuf,
        /// Output file; stdout when absent.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert the source asset and write every target.
    Emit {
        #[arg(long, default_value = MANIFEST_FILE_NAME)]
        manifest: PathBuf,
        /// Emit from previously written IR instead of running the frontend.
        #[arg(long)]
        ir: Option<PathBuf>,
    },
    /// Render story IR as structured text.
    PrintIr {
        file: PathBuf,
        /// Render nested groups inline instead of as closures.
        #[arg(long)]
        no_closures: bool,
    },
    /// Type-check and translate one script function.
    Compile {
        script: PathBuf,
        /// Mangled function name the translation is stored under.
        #[arg(long)]
        name: String,
        /// Declaration file to compile against instead of the bundled one.
        #[arg(long)]
        library: Option<PathBuf>,
        /// TypeScript compiler to run.
        #[arg(long, default_value = "tsc")]
        tsc: String,
    },
}

fn init_tracing(verbose: u8) {
    let fallback_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Find `zeile.json` by walking up from `start` through ancestor directories.
fn find_manifest_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = if start.is_dir() {
        start.to_path_buf()
    } else {
        start.parent()?.to_path_buf()
    };
    loop {
        let candidate = dir.join(MANIFEST_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Use `path` if it exists; with the default file name, fall back to
/// searching ancestors of the working directory.
fn resolve_manifest_path(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if path.file_name().and_then(|f| f.to_str()) == Some(MANIFEST_FILE_NAME) {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        if let Some(found) = find_manifest_upward(&cwd) {
            info!(manifest = %found.display(), "found manifest");
            return Ok(found);
        }
    }
    bail!("manifest not found: {}", path.display())
}

fn load_manifest(path: &Path) -> Result<ProjectManifest> {
    let path = resolve_manifest_path(path)?;
    let file = File::open(&path)
        .with_context(|| format!("failed to open manifest: {}", path.display()))?;
    let mut manifest: ProjectManifest = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

    if let Some(base) = path.canonicalize()?.parent() {
        manifest.resolve_paths(base);
    }
    Ok(manifest)
}

fn read_ir(file: &Path) -> Result<Story> {
    let f = File::open(file)
        .with_context(|| format!("failed to open IR file: {}", file.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("failed to parse IR file: {}", file.display()))
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn find_frontend(format: &SourceFormat) -> Option<Box<dyn Frontend>> {
    match format {
        #[cfg(feature = "frontend-bandori")]
        SourceFormat::Bandori => Some(Box::new(zeile_frontend_bandori::BandoriFrontend)),
        _ => None,
    }
}

fn find_backend(target: &TargetConfig) -> Result<Option<Box<dyn Backend>>> {
    let backend: Box<dyn Backend> = match target.backend {
        #[cfg(feature = "backend-plaintext")]
        TargetBackend::PlainText => Box::new(zeile_backend_plaintext::PlainTextBackend),
        TargetBackend::Sirius => {
            let options = zeile_backend_sirius::SiriusOptions::from_value(&target.options)?;
            Box::new(zeile_backend_sirius::SiriusBackend::new(options))
        }
        #[cfg(feature = "backend-bestdori")]
        TargetBackend::Bestdori => {
            let options = zeile_backend_bestdori::BestdoriOptions::from_value(&target.options)?;
            Box::new(zeile_backend_bestdori::BestdoriBackend::new(options))
        }
        #[allow(unreachable_patterns)]
        _ => return Ok(None),
    };
    Ok(Some(backend))
}

/// An output path naming an existing directory receives
/// `<project name>.<backend extension>` inside it.
fn target_path(output: &Path, project: &str, backend: &dyn Backend) -> PathBuf {
    if output.is_dir() {
        output.join(format!("{project}.{}", backend.file_extension()))
    } else {
        output.to_path_buf()
    }
}

fn report(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn extract(manifest: &ProjectManifest) -> Result<FrontendOutput> {
    let Some(frontend) = find_frontend(&manifest.format) else {
        bail!("no frontend available for format {:?}", manifest.format);
    };
    let input = FrontendInput {
        source: manifest.source.clone(),
        locale: manifest.locale,
        options: manifest.options.clone(),
    };
    frontend
        .extract(input)
        .with_context(|| format!("failed to convert {}", manifest.source.display()))
}

/// Run the frontend and report its diagnostics. `None` when any of them
/// is an error.
fn convert_story(manifest: &ProjectManifest) -> Result<Option<Story>> {
    let FrontendOutput { story, diagnostics } = extract(manifest)?;
    report(&diagnostics);
    if has_errors(&diagnostics) {
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        eprintln!("conversion failed with {errors} error(s)");
        return Ok(None);
    }
    Ok(Some(story))
}

fn cmd_info(manifest_path: &Path) -> Result<ExitCode> {
    let manifest = load_manifest(manifest_path)?;
    println!("Project: {}", manifest.name);
    println!("Locale:  {}", manifest.locale);
    println!("Format:  {:?}", manifest.format);
    println!("Source:  {}", manifest.source.display());
    println!("Targets:");
    for target in &manifest.targets {
        println!("  - {:?} -> {}", target.backend, target.output.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_convert(manifest_path: &Path, output: Option<&Path>) -> Result<ExitCode> {
    let manifest = load_manifest(manifest_path)?;
    let Some(story) = convert_story(&manifest)? else {
        return Ok(ExitCode::FAILURE);
    };
    let json = serde_json::to_string_pretty(&story)?;
    match output {
        Some(path) => {
            write_output(path, &json)?;
            println!("Wrote IR to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_emit(manifest_path: &Path, ir: Option<&Path>) -> Result<ExitCode> {
    let manifest = load_manifest(manifest_path)?;
    let story = match ir {
        Some(file) => read_ir(file)?,
        None => match convert_story(&manifest)? {
            Some(story) => story,
            None => return Ok(ExitCode::FAILURE),
        },
    };
    if manifest.targets.is_empty() {
        warn!(project = %manifest.name, "manifest declares no targets");
    }

    for target in &manifest.targets {
        let Some(backend) = find_backend(target)? else {
            bail!("no backend available for {:?}", target.backend);
        };
        let text = backend
            .emit(&story)
            .with_context(|| format!("{} backend failed", backend.name()))?;
        let path = target_path(&target.output, &manifest.name, backend.as_ref());
        write_output(&path, &text)?;
        println!("Emitted {} output to {}", backend.name(), path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_print_ir(file: &Path, no_closures: bool) -> Result<ExitCode> {
    let story = read_ir(file)?;
    println!("{}", zeile_backend_sirius::render(&story, !no_closures));
    Ok(ExitCode::SUCCESS)
}

fn cmd_compile(
    script: &Path,
    name: &str,
    library: Option<&Path>,
    tsc: &str,
) -> Result<ExitCode> {
    let source = fs::read_to_string(script)
        .with_context(|| format!("failed to read script: {}", script.display()))?;
    let transpiler = Box::new(TscTranspiler::new(TscConfig {
        program: tsc.to_string(),
        args: Vec::new(),
    }));
    let mut evaluator = match library {
        Some(path) => {
            let library = fs::read_to_string(path)
                .with_context(|| format!("failed to read library: {}", path.display()))?;
            FunctionEvaluator::new(transpiler, library)
        }
        None => FunctionEvaluator::with_standard_library(transpiler),
    };

    let diagnostics = evaluator.compile(name, &source, TextPosition::new(1, 1));
    for diagnostic in &diagnostics {
        eprintln!("{}:{diagnostic}", script.display());
    }
    if let Some(js) = evaluator.get(name) {
        print!("{js}");
    }
    Ok(if has_errors(&diagnostics) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Command::Info { manifest } => cmd_info(manifest),
        Command::Convert { manifest, output } => cmd_convert(manifest, output.as_deref()),
        Command::Emit { manifest, ir } => cmd_emit(manifest, ir.as_deref()),
        Command::PrintIr { file, no_closures } => cmd_print_ir(file, *no_closures),
        Command::Compile {
            script,
            name,
            library,
            tsc,
        } => cmd_compile(script, name, library.as_deref(), tsc),
    }
}
