use anyhow::Context;
use clap::Parser;
use projkit_core::{Config, Tracker};
use projkit_deps::{DependencyKind, Ecosystem};
use projkit_store::Project;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "projkit")]
#[command(version, about = "Track dev projects and drive their package managers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start tracking an existing project directory
    Track {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Display name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
        /// Package manager (detected from lockfiles if omitted)
        #[arg(long)]
        tool: Option<String>,
    },
    /// Create a new project and track it
    Init {
        /// Project directory, relative to projects_root unless absolute
        path: PathBuf,
        /// Ecosystem: js, py, go or rs
        #[arg(short, long)]
        lang: Ecosystem,
        #[arg(long)]
        name: Option<String>,
        /// Package manager (config default if omitted)
        #[arg(long)]
        tool: Option<String>,
    },
    /// Stop tracking a project (files are kept)
    Untrack {
        /// Project name, id, or "." for the current directory
        project: String,
    },
    /// List tracked projects
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show a project's dependencies as last synced
    Deps {
        #[arg(default_value = ".")]
        project: String,
        /// Only development dependencies
        #[arg(long, conflicts_with = "prod")]
        dev: bool,
        /// Only production dependencies
        #[arg(long)]
        prod: bool,
        #[arg(long)]
        json: bool,
    },
    /// Re-read the manifest and store its dependencies
    Sync {
        #[arg(default_value = ".")]
        project: String,
    },
    /// Add packages
    Add {
        #[arg(required = true)]
        packages: Vec<String>,
        /// Add as development dependencies
        #[arg(short = 'D', long)]
        dev: bool,
        #[arg(short, long, default_value = ".")]
        project: String,
    },
    /// Remove packages
    Remove {
        #[arg(required = true)]
        packages: Vec<String>,
        #[arg(short, long, default_value = ".")]
        project: String,
    },
    /// Install everything the manifest declares
    Install {
        #[arg(short, long, default_value = ".")]
        project: String,
    },
    /// Update the named packages, or all of them
    Update {
        packages: Vec<String>,
        #[arg(short, long, default_value = ".")]
        project: String,
    },
    /// Run a script or entry point
    Run {
        /// Script name, file or binary
        script: String,
        /// Arguments passed through to the script
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
        /// Project to run in; must come before the script name, everything
        /// after it goes to the script
        #[arg(short, long, default_value = ".")]
        project: String,
    },
    /// Show packages with newer versions available
    Outdated {
        #[arg(default_value = ".")]
        project: String,
    },
    /// Switch a project to another package manager
    Tool { project: String, tool: String },
    /// Rename a tracked project
    Rename { project: String, new_name: String },
    /// List installed package managers
    Managers {
        /// Only this ecosystem
        #[arg(short, long)]
        lang: Option<Ecosystem>,
    },
    /// Print the active configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "projkit=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;

    if let Commands::Config = cli.command {
        return print_config(&config);
    }

    let mut tracker = Tracker::open(&config).context("Failed to open project database")?;
    tracing::debug!("Using database at {}", config.database_path()?.display());

    match cli.command {
        Commands::Track { path, name, tool } => {
            let project = tracker.track(&path, name.as_deref(), tool.as_deref())?;
            let summary = tracker.summary(&project)?;
            println!(
                "✓ Tracking {} ({}, {}) with {} dependencies",
                project.name,
                project.ecosystem.display_name(),
                project.tool,
                summary.total_count
            );
        }
        Commands::Init {
            path,
            lang,
            name,
            tool,
        } => {
            let path = if path.is_absolute() {
                path
            } else {
                config.projects_root.join(path)
            };
            let tool = tool.unwrap_or_else(|| config.tools.for_ecosystem(lang).to_string());
            let project = tracker.init(&path, lang, name.as_deref(), &tool)?;
            println!("✓ Created {} at {}", project.name, project.path.display());
        }
        Commands::Untrack { project } => {
            let project = tracker.resolve(&project)?;
            tracker.untrack(&project)?;
            println!("✓ Stopped tracking {} (files left in place)", project.name);
        }
        Commands::List { json } => {
            let projects = tracker.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No tracked projects yet. Try `projkit track .`");
            } else {
                for project in &projects {
                    print_project(project);
                }
            }
        }
        Commands::Deps {
            project,
            dev,
            prod,
            json,
        } => {
            let project = tracker.resolve(&project)?;
            let deps: Vec<_> = tracker
                .dependencies(&project)?
                .into_iter()
                .filter(|d| match d.kind {
                    DependencyKind::Development => !prod,
                    DependencyKind::Production => !dev,
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&deps)?);
            } else if deps.is_empty() {
                println!("{} has no recorded dependencies", project.name);
            } else {
                let width = deps.iter().map(|d| d.name.len()).max().unwrap_or(0);
                for dep in &deps {
                    println!("{:<width$}  {:<12}  {}", dep.name, dep.version, dep.kind, width = width);
                }
            }
        }
        Commands::Sync { project } => {
            let project = tracker.resolve(&project)?;
            let count = tracker.sync(&project)?;
            println!("✓ Synced {} dependencies for {}", count, project.name);
        }
        Commands::Add {
            packages,
            dev,
            project,
        } => {
            let project = tracker.resolve(&project)?;
            tracker.add(&project, &packages, dev)?;
            println!("✓ Added {}", packages.join(", "));
        }
        Commands::Remove { packages, project } => {
            let project = tracker.resolve(&project)?;
            tracker.remove(&project, &packages)?;
            println!("✓ Removed {}", packages.join(", "));
        }
        Commands::Install { project } => {
            let project = tracker.resolve(&project)?;
            tracker.install(&project)?;
            println!("✓ Installed dependencies for {}", project.name);
        }
        Commands::Update { packages, project } => {
            let project = tracker.resolve(&project)?;
            tracker.update(&project, &packages)?;
            if packages.is_empty() {
                println!("✓ Updated all dependencies of {}", project.name);
            } else {
                println!("✓ Updated {}", packages.join(", "));
            }
        }
        Commands::Run {
            script,
            args,
            project,
        } => {
            let project = tracker.resolve(&project)?;
            tracing::info!("Running {} in {}", script, project.name);
            tracker.run(&project, &script, &args)?;
        }
        Commands::Outdated { project } => {
            let project = tracker.resolve(&project)?;
            let report = tracker.outdated(&project)?;
            if report.is_empty() {
                println!("All packages are up to date ✓");
            } else {
                println!("{}", report);
            }
        }
        Commands::Tool { project, tool } => {
            let project = tracker.resolve(&project)?;
            let project = tracker.reassign_tool(&project, &tool)?;
            println!("✓ {} now uses {}", project.name, project.tool);
        }
        Commands::Rename { project, new_name } => {
            let project = tracker.resolve(&project)?;
            let old_name = project.name.clone();
            let project = tracker.rename(&project, &new_name)?;
            println!("✓ Renamed {} to {}", old_name, project.name);
        }
        Commands::Managers { lang } => {
            let ecosystems = match lang {
                Some(ecosystem) => vec![ecosystem],
                None => Ecosystem::ALL.to_vec(),
            };
            for ecosystem in ecosystems {
                let available: Vec<_> = tracker
                    .registry()
                    .list_available(ecosystem)
                    .iter()
                    .map(|m| m.name())
                    .collect();
                let shown = if available.is_empty() {
                    "(none installed)".to_string()
                } else {
                    available.join(", ")
                };
                println!("{:<12} {}", ecosystem.display_name(), shown);
            }
        }
        Commands::Config => print_config(&config)?,
    }

    Ok(())
}

fn print_config(config: &Config) -> anyhow::Result<()> {
    println!("# {}", Config::config_path()?.display());
    println!("# database: {}", config.database_path()?.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn print_project(project: &Project) {
    println!(
        "{:<20} {:<6} {:<7} {}",
        project.name,
        project.ecosystem.short_name(),
        project.tool,
        project.path.display()
    );
}
