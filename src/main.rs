use clap::{Parser, Subcommand};
use kiln::builder::{self, BuildOptions};
use kiln::config::{self, ProjectPaths, SiteConfig};
use kiln::templates::TemplateEngine;
use kiln::{output, wildcard};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Incremental static site builder")]
#[command(long_about = "\
Incremental static site builder

Markdown pages with YAML front matter are rendered through Jinja-style
templates into a static site. Only pages whose content changed since the
last build are rendered again.

Project structure:

  site/
  ├── kiln.toml                    # Config (optional, all keys have defaults)
  ├── content/
  │   ├── index.md                 # → output/index.html
  │   ├── about.md                 # → output/about/index.html
  │   └── blog/
  │       ├── index.md             # → output/blog/index.html
  │       └── launch.md            # → output/blog/launch/index.html
  ├── templates/
  │   ├── content.html             # Default template
  │   └── blog/*.html              # Wildcard template for blog/<anything>
  ├── static/                      # Copied to output/static/
  ├── data/                        # *.json exposed to templates as `data`
  └── output.json                  # Build manifest (fingerprints)

A page is skipped when its modification time matches the manifest, or when
only the time moved and the content hash did not. A change to any static
file renders every page.

Run 'kiln gen-config' to print a documented kiln.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing kiln.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render changed pages, copy static files, update the manifest
    Build {
        /// Render every page regardless of the manifest
        #[arg(long)]
        force: bool,

        /// Render worker count (default: build.threads, then half the cores minus one)
        #[arg(long)]
        threads: Option<usize>,

        /// Output directory (overrides output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Exit successfully even when pages fail
        #[arg(long)]
        ignore: bool,
    },
    /// List every page and whether the next build would render it
    Check,
    /// Show which template a slug resolves to and the wildcard lookup order
    Templates {
        /// Page slug, e.g. blog/2024/launch
        slug: String,
    },
    /// Print a stock kiln.toml with all options documented
    GenConfig,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(2);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Build {
            force,
            threads,
            output,
            ignore,
        } => {
            let config = config::load_config(&cli.root)?;
            let paths = ProjectPaths::resolve(&cli.root, &config, output.as_deref());
            let options = BuildOptions {
                force,
                threads,
                ignore_errors: ignore,
            };
            let code = run_build(&paths, &config, &options);
            std::process::exit(code);
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            let paths = ProjectPaths::resolve(&cli.root, &config, None);
            let pages = builder::check(&paths)?;
            output::print_check_output(&pages);
        }
        Command::Templates { slug } => {
            let config = config::load_config(&cli.root)?;
            let paths = ProjectPaths::resolve(&cli.root, &config, None);
            let templates = TemplateEngine::new(&paths.templates);
            let slug = slug.trim_matches('/');
            let exact = templates.has_template(&format!("{slug}.html"));
            let candidates: Vec<_> = wildcard::candidates(slug)
                .into_iter()
                .map(|c| {
                    let exists = templates.has_template(&c.template_name());
                    (c, exists)
                })
                .collect();
            output::print_candidates(slug, exact, &candidates);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Run a build, streaming progress lines as pages finish.
///
/// Returns the process exit code: 2 when the run aborted, 1 when pages failed
/// (unless ignored), 0 otherwise.
fn run_build(paths: &ProjectPaths, config: &SiteConfig, options: &BuildOptions) -> i32 {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_build_event(&event) {
                println!("{}", line);
            }
        }
    });

    let result = builder::build(paths, config, options, Some(tx));
    printer.join().ok();

    match result {
        Ok(report) => {
            output::print_build_summary(&report, display_path(&paths.output, &paths.root), &config.manifest_file);
            report.exit_code(options.ignore_errors)
        }
        Err(e) => {
            eprintln!("Build failed: {e}");
            2
        }
    }
}

/// Show paths relative to the project root when possible.
fn display_path<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "kiln=debug" } else { "kiln=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
