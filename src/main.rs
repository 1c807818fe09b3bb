use clap::{Parser, Subcommand};
use pixitext::assemble::{self, ExportFormat};
use pixitext::upload::JsonUploadStore;
use pixitext::{Renderer, WritingMode, config, output, preview};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixitext")]
#[command(about = "Render bracket-markup novels into paginated HTML")]
#[command(long_about = "\
Render bracket-markup novels into paginated HTML

Documents are plain text with a few bracket directives:

  [newpage]                      page break
  [chapter:Title]                chapter heading (at the start of a line)
  [uploadedimage:123456]         uploaded image, alone on its line
  [pixivimage:98765]             artwork link, alone in its block
  [jump:3]                       link to page 3
  [[rb:漢字>かんじ]]             ruby
  [[jumpuri:label>https://…]]    labeled link

Project layout (under --root):

  project/
  ├── config.toml                # Optional, overrides stock defaults
  └── uploads/
      ├── uploads.json           # Upload registry: id → stored file
      └── cover.png

Run 'pixitext gen-config' to generate a documented config.toml.")]
#[command(version = env!("PIXITEXT_VERSION"))]
struct Cli {
    /// Project root holding config.toml and the uploads directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log progress at info level (otherwise RUST_LOG applies)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the rendered document fragment, or one page of it
    Render {
        file: PathBuf,
        /// Print only this page's HTML (clamped into range)
        #[arg(long)]
        page: Option<i64>,
        /// horizontal or vertical (defaults to [export] writing_mode)
        #[arg(long)]
        writing_mode: Option<String>,
    },
    /// Print one page as a JSON preview view
    Page {
        file: PathBuf,
        /// Page number (clamped into range)
        #[arg(long, short, default_value_t = 1, allow_negative_numbers = true)]
        p: i64,
        #[arg(long)]
        writing_mode: Option<String>,
    },
    /// Export a document to a file
    Export {
        file: PathBuf,
        /// Output file
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t)]
        format: ExportFormat,
        #[arg(long)]
        writing_mode: Option<String>,
    },
    /// Export every .txt document under a directory as standalone HTML
    ExportDir {
        dir: PathBuf,
        /// Output directory
        #[arg(long, short)]
        out: PathBuf,
        #[arg(long)]
        writing_mode: Option<String>,
    },
    /// List pages, chapters, and images, reporting unresolved uploads
    Check { file: PathBuf },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Render {
            file,
            page,
            writing_mode,
        } => {
            let project = Project::load(&cli.root)?;
            let config = &project.config;
            let pages = project.renderer().render_document(&read_document(&file)?);
            match page {
                Some(requested) => {
                    let p = preview::clamp_page(requested, pages.len());
                    println!("{}", pages[p - 1].html);
                }
                None => {
                    let mode = writing_mode_or_default(writing_mode.as_deref(), config);
                    println!("{}", assemble::to_html_fragment(&pages, mode, &config.labels));
                }
            }
        }
        Command::Page {
            file,
            p,
            writing_mode,
        } => {
            let project = Project::load(&cli.root)?;
            let raw = read_document(&file)?;
            let pages = project.renderer().render_document(&raw);
            let mode = writing_mode_or_default(writing_mode.as_deref(), &project.config);
            let view = preview::preview_page(&raw, &pages, p, mode)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Command::Export {
            file,
            out,
            format,
            writing_mode,
        } => {
            let project = Project::load(&cli.root)?;
            let raw = read_document(&file)?;
            let pages = project.renderer().render_document(&raw);
            let mode = writing_mode_or_default(writing_mode.as_deref(), &project.config);
            assemble::write_export(&out, &raw, &pages, format, mode, &project.config)?;
            for line in output::format_export_written(&out.display().to_string(), pages.len()) {
                println!("{}", line);
            }
        }
        Command::ExportDir {
            dir,
            out,
            writing_mode,
        } => {
            let project = Project::load(&cli.root)?;
            init_thread_pool(&project.config.processing);
            let mode = writing_mode_or_default(writing_mode.as_deref(), &project.config);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_export_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = assemble::export_tree(
                &dir,
                &out,
                &project.store,
                &project.config,
                mode,
                Some(tx),
            );
            printer.join().ok();
            let summary = result?;
            output::print_export_summary(&summary);
            if summary.failed > 0 {
                return Err(format!("{} document(s) failed to export", summary.failed).into());
            }
        }
        Command::Check { file } => {
            let project = Project::load(&cli.root)?;
            let reports = project.renderer().inspect_document(&read_document(&file)?);
            output::print_check_output(&file.display().to_string(), &reports);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Config and upload store of the project under `--root`.
struct Project {
    config: config::RenderConfig,
    store: JsonUploadStore,
}

impl Project {
    fn load(root: &Path) -> Result<Self, config::ConfigError> {
        let config = config::load_config(root)?;
        let store = JsonUploadStore::from_config(root, &config.uploads);
        tracing::info!("uploads registry under {}", store.dir().display());
        Ok(Self { config, store })
    }

    fn renderer(&self) -> Renderer<'_, JsonUploadStore> {
        Renderer::new(&self.store, &self.config)
    }
}

fn read_document(path: &Path) -> std::io::Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
    })
}

/// Command-line writing mode, falling back to `[export] writing_mode`.
fn writing_mode_or_default(arg: Option<&str>, config: &config::RenderConfig) -> WritingMode {
    WritingMode::from_str_lossy(arg.unwrap_or(&config.export.writing_mode))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
