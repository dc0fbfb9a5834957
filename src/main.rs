use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use facprof::{
    commands,
    context::Context,
    link::SymlinkCreator,
    logging::init_logging,
    paths::Paths,
    prompt::InquirePrompter,
    settings::{Resource, ShareOverrides},
    store::JsonStore,
    ui::{ColorMode, Ui},
};

#[derive(Parser)]
#[command(name = "facprof")]
#[command(about = "Factorio Profile Manager - isolated game profiles with selective sharing")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// When to use colors: always, auto, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// More diagnostic output on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Where facprof keeps its database and profiles
    #[arg(long, global = true, env = "FACPROF_HOME", value_name = "DIR")]
    home: Option<PathBuf>,

    /// Factorio's user data directory (replaced by a link to the active profile)
    #[arg(long, global = true, env = "FACPROF_FACTORIO_DIR", value_name = "DIR")]
    factorio_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which resources to share with the global profile; omitted flags keep their value
#[derive(Args, Debug, Default)]
struct ShareArgs {
    /// Share these resources (comma-separated: config,mods,saves,scenarios,blueprints)
    #[arg(long, value_delimiter = ',', value_name = "RESOURCES")]
    share: Vec<Resource>,

    /// Share the config folder
    #[arg(long, value_name = "BOOL")]
    share_config: Option<bool>,

    /// Share the mods folder
    #[arg(long, value_name = "BOOL")]
    share_mods: Option<bool>,

    /// Share the saves folder
    #[arg(long, value_name = "BOOL")]
    share_saves: Option<bool>,

    /// Share the scenarios folder
    #[arg(long, value_name = "BOOL")]
    share_scenarios: Option<bool>,

    /// Share blueprint-storage.dat
    #[arg(long, value_name = "BOOL")]
    share_blueprints: Option<bool>,
}

impl From<ShareArgs> for ShareOverrides {
    /// Explicit `--share-*` flags win over the `--share` list
    fn from(args: ShareArgs) -> Self {
        let listed = |resource| args.share.contains(&resource).then_some(true);
        Self {
            config: args.share_config.or(listed(Resource::Config)),
            mods: args.share_mods.or(listed(Resource::Mods)),
            saves: args.share_saves.or(listed(Resource::Saves)),
            scenarios: args.share_scenarios.or(listed(Resource::Scenarios)),
            blueprints: args.share_blueprints.or(listed(Resource::Blueprints)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles (all, or the given names)
    List {
        names: Vec<String>,
    },

    /// Show the defaults for new profiles and the active profile
    Settings,

    /// Change the defaults for new profiles
    Defaults {
        /// Folder new profiles are created in; may contain %VAR% / $VAR
        #[arg(long)]
        path: Option<String>,

        #[command(flatten)]
        share: ShareArgs,
    },

    /// Create a new profile
    New {
        name: String,

        /// Profile folder (default: <default path>/<name>)
        #[arg(long)]
        path: Option<String>,

        #[command(flatten)]
        share: ShareArgs,
    },

    /// Rename, move or re-configure a profile
    Set {
        name: String,

        /// New name; the folder is renamed to match
        #[arg(long = "name", value_name = "NEW_NAME")]
        new_name: Option<String>,

        /// Move the profile folder here
        #[arg(long)]
        path: Option<String>,

        #[command(flatten)]
        share: ShareArgs,
    },

    /// Delete a profile and its folder
    #[command(alias = "rm")]
    Remove {
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Make a profile the one Factorio starts with
    #[command(alias = "use")]
    Switch {
        name: String,
    },

    /// Copy the active profile's blueprints to the global profile
    Sync,

    /// Open a profile folder in the file browser
    Open {
        name: Option<String>,

        /// Open the global profile instead
        #[arg(long, conflicts_with = "name")]
        global: bool,
    },

    /// Run diagnostics on the facprof setup
    Doctor,

    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "facprof", &mut std::io::stdout());
        return Ok(());
    }

    let ui = Ui::new(cli.color, cli.no_color);
    let paths = Paths::new(cli.home, cli.factorio_dir)?;
    paths.ensure_dirs()?;

    let store = JsonStore::new(&paths.database_file, &paths.profiles_dir);
    let links = SymlinkCreator;
    let ctx = Context::new(&paths, &store, &links);
    let prompter = InquirePrompter;

    match cli.command {
        Commands::List { names } => commands::list(&ctx, &ui, &names),
        Commands::Settings => commands::show_settings(&ctx, &ui),
        Commands::Defaults { path, share } => {
            commands::set_settings(&ctx, &prompter, &ui, path.as_deref(), share.into())
        }
        Commands::New { name, path, share } => {
            commands::new_profile(&ctx, &prompter, &ui, &name, path.as_deref(), share.into())
        }
        Commands::Set {
            name,
            new_name,
            path,
            share,
        } => commands::set_profile(
            &ctx,
            &prompter,
            &ui,
            &name,
            new_name.as_deref(),
            path.as_deref(),
            share.into(),
        ),
        Commands::Remove { name, yes } => commands::remove(&ctx, &prompter, &ui, &name, yes),
        Commands::Switch { name } => commands::switch(&ctx, &prompter, &ui, &name),
        Commands::Sync => commands::sync(&ctx, &ui),
        Commands::Open { name, global } => commands::open(&ctx, &ui, name.as_deref(), global),
        Commands::Doctor => commands::doctor(&ctx, &ui),
        Commands::Completions { .. } => Ok(()),
    }
}
