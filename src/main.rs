use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::build::BuildOptions;

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about = "Build static sites from underscore-folder projects")]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: KilnCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// Output folder, relative to the project root (defaults to the config's `dest`, then `site`)
    dest: Option<String>,

    /// Empty the output folder before building
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    clear: bool,

    /// Include the `.git` folder in the build
    #[arg(long, default_value_t = false, action = ArgAction::Set)]
    git: bool,

    /// Save the output folder to `_config.yml`
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    save: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false")]
    silent: bool,
}

impl BuildArgs {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            dest: self.dest.clone(),
            clear: self.clear,
            git: self.git,
            save: self.save,
        }
    }
}

#[derive(Parser)]
struct CleanArgs {
    /// Output folder to remove (defaults to the config's `dest`, then `site`)
    dest: Option<String>,

    /// Only print what would be deleted
    #[arg(short, long, default_value = "false")]
    dry_run: bool,
}

#[derive(Parser)]
struct WatchArgs {
    #[command(flatten)]
    build: BuildArgs,
}

#[derive(Subcommand)]
enum KilnCommand {
    /// Build the project in the current directory
    Build(BuildArgs),

    /// Remove the built site
    Clean(CleanArgs),

    /// Build, then rebuild whenever a project file changes
    Watch(WatchArgs),
}

impl KilnCommand {
    fn silent(&self) -> bool {
        match self {
            KilnCommand::Build(args) => args.silent,
            KilnCommand::Watch(args) => args.build.silent,
            KilnCommand::Clean(_) => false,
        }
    }
}

fn init_tracing(silent: bool) {
    let filter = if silent {
        tracing_subscriber::EnvFilter::new("error")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "kiln=info".into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    init_tracing(args.command.silent());

    match args.command {
        KilnCommand::Build(args) => {
            commands::build::run(&args).await?;
        }
        KilnCommand::Clean(args) => {
            commands::clean::run(&args).await?;
        }
        KilnCommand::Watch(args) => {
            commands::watch::run(&args).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults() {
        let args = Args::try_parse_from(["kiln", "build"]).unwrap();
        let KilnCommand::Build(build) = args.command else {
            panic!("expected build");
        };

        let options = build.options();
        assert_eq!(options.dest, None);
        assert!(options.clear);
        assert!(!options.git);
        assert!(options.save);
        assert!(!build.silent);
    }

    #[test]
    fn test_build_flags() {
        let args = Args::try_parse_from([
            "kiln", "build", "out", "--clear", "false", "--git", "true", "--save=false", "-s",
        ])
        .unwrap();
        let KilnCommand::Build(build) = args.command else {
            panic!("expected build");
        };

        let options = build.options();
        assert_eq!(options.dest.as_deref(), Some("out"));
        assert!(!options.clear);
        assert!(options.git);
        assert!(!options.save);
        assert!(build.silent);
    }

    #[test]
    fn test_watch_takes_build_flags() {
        let args = Args::try_parse_from(["kiln", "watch", "public", "--silent"]).unwrap();
        assert!(args.command.silent());
        let KilnCommand::Watch(watch) = args.command else {
            panic!("expected watch");
        };
        assert_eq!(watch.build.dest.as_deref(), Some("public"));
    }

    #[test]
    fn test_clean_dry_run() {
        let args = Args::try_parse_from(["kiln", "clean", "--dry-run"]).unwrap();
        let KilnCommand::Clean(clean) = args.command else {
            panic!("expected clean");
        };
        assert!(clean.dry_run);
        assert_eq!(clean.dest, None);
    }
}
