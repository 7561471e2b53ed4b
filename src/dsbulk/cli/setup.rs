use clap::{CommandFactory, Parser, Subcommand};
use dsbulk::args::{CommonArgs, ListArgs, MetadataArgs, PolicyArgs, ReplaceArgs};
use dsbulk::attributes::available_keys;
use dsbulk::model::ObjectType;
use dsbulk::printer::FORMAT_NAMES;
use once_cell::sync::Lazy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dsbulk",
    bin_name = "dsbulk",
    version,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Bulk actions over a repository content hierarchy", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Repository JSON file
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Print help
    #[arg(short, long)]
    pub help: bool,
}

impl Cli {
    pub fn verbose(&self) -> bool {
        self.command
            .as_ref()
            .is_some_and(|c| c.common().verbose)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the targets under a root
    #[command(disable_help_flag = true)]
    List(ListArgs),

    /// Set or append a metadata value on items
    #[command(disable_help_flag = true)]
    Metadata(MetadataArgs),

    /// Grant or revoke a resource policy
    #[command(disable_help_flag = true)]
    Policy(PolicyArgs),

    /// Replace bitstream content with a file
    #[command(disable_help_flag = true)]
    Replace(ReplaceArgs),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::List(_) => "list",
            Commands::Metadata(_) => "metadata",
            Commands::Policy(_) => "policy",
            Commands::Replace(_) => "replace",
        }
    }

    pub fn common(&self) -> &CommonArgs {
        match self {
            Commands::List(a) => &a.common,
            Commands::Metadata(a) => &a.common,
            Commands::Policy(a) => &a.common,
            Commands::Replace(a) => &a.common,
        }
    }
}

/// Parse the process arguments. Malformed input prints clap's message and exits 1.
pub fn parse() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => e.exit(),
            _ => {
                let _ = e.print();
                std::process::exit(1);
            }
        },
    }
}

static KEYS_HELP: Lazy<String> = Lazy::new(|| {
    let mut out = String::from("Available keys:\n");
    for kind in ObjectType::LISTABLE {
        out.push_str(&format!(
            "  {:<12} {}\n",
            kind.as_str(),
            available_keys(kind).join(", ")
        ));
    }
    out.push('\n');
    out.push_str("  TYPE.key       the key on the enclosing TYPE, e.g. COLLECTION.name\n");
    out.push_str("  schema.element[.qualifier]\n");
    out.push_str("                 item metadata, e.g. dc.contributor.author\n");
    out
});

pub fn usage() -> String {
    "\nUsage: dsbulk [--repo <PATH>] <COMMAND> [OPTIONS]\n\
     Run 'dsbulk <COMMAND> --help' for the options of a command.\n"
        .to_string()
}

pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("dsbulk {version}\n"));
    output.push_str("Bulk actions over a repository content hierarchy\n");
    output.push('\n');
    output.push_str("Usage: dsbulk [--repo <PATH>] <COMMAND> [OPTIONS]\n");
    output.push('\n');
    output.push_str("Commands:\n");
    for sc in cmd.get_subcommands() {
        let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
        output.push_str(&format!("  {:<12} {}\n", sc.get_name(), about));
    }
    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --repo <PATH>   Repository JSON file\n");
    output.push_str("  -h, --help          Print help\n");
    output.push_str("  -V, --version       Print version\n");
    output.push('\n');
    output.push_str(&format!("Formats: {}\n", FORMAT_NAMES.join(", ")));
    output.push('\n');
    output.push_str(&KEYS_HELP);
    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Clap's help for one subcommand, followed by the key table.
pub fn print_help_for_command(name: &str) {
    let mut cmd = Cli::command();
    for subcmd in cmd.get_subcommands_mut() {
        if subcmd.get_name() == name {
            let help = subcmd.render_help();
            print!("{}", help);
            println!();
            print!("{}", *KEYS_HELP);
            return;
        }
    }
    print_grouped_help();
}
