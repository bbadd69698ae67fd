use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "tfsync")]
#[command(version)]
#[command(about = "Declarative CLI for reconciling Terraform Enterprise resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Terraform Enterprise URL
    #[arg(long, env = "TFE_URL", global = true)]
    pub url: Option<String>,

    /// Bearer token used to authenticate every API request
    #[arg(long, env = "TFE_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Skip TLS certificate validation
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,

    /// Ignore proxy settings from the environment
    #[arg(long, global = true)]
    pub no_proxy: bool,

    /// Number of attempts per API call before giving up
    #[arg(long, default_value_t = 3, global = true)]
    pub retries: u32,

    /// Seconds to sleep between API retries
    #[arg(long, default_value_t = 5, global = true)]
    pub sleep: u64,

    /// Compute and report changes without mutating anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Configuration profile to read connection settings from
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Print the full invocation report as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage organizations
    #[command(subcommand)]
    Org(OrgCommand),

    /// Manage workspaces
    #[command(subcommand)]
    Workspace(WorkspaceCommand),

    /// Manage teams
    #[command(subcommand)]
    Team(TeamCommand),

    /// Manage SSH keys
    #[command(subcommand)]
    SshKey(SshKeyCommand),

    /// Manage VCS connections (OAuth clients)
    #[command(subcommand)]
    Vcs(VcsCommand),

    /// Manage workspace variables
    #[command(subcommand)]
    Var(VarCommand),

    /// Queue and steer workspace runs
    #[command(subcommand)]
    Run(RunCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Organizations
// ============================================================================

#[derive(Subcommand)]
pub enum OrgCommand {
    /// Create or update an organization
    Apply {
        /// Organization attributes as inline JSON or @file (`name` required)
        #[arg(long)]
        attributes: String,
    },

    /// Delete an organization
    Delete {
        /// Organization name or external-id
        organization: String,
    },

    /// List organizations, optionally restricted to the given names
    List {
        /// Names or external-ids, comma-separated or repeated; empty means all
        names: Vec<String>,
    },
}

// ============================================================================
// Workspaces
// ============================================================================

#[derive(Args)]
pub struct WorkspaceApplyArgs {
    /// Organization name or external-id
    #[arg(short, long)]
    pub organization: String,

    /// Workspace name or ID to edit; omit to create from attributes
    pub workspace: Option<String>,

    /// Workspace attributes as inline JSON or @file
    #[arg(long)]
    pub attributes: Option<String>,

    /// Lock the workspace
    #[arg(long, conflicts_with = "unlock")]
    pub lock: bool,

    /// Unlock the workspace
    #[arg(long)]
    pub unlock: bool,

    /// Reason for locking the workspace
    #[arg(long, requires = "lock")]
    pub lock_reason: Option<String>,

    /// SSH key (name or ID) to assign; an empty string unassigns
    #[arg(long)]
    pub ssh_key: Option<String>,
}

#[derive(Subcommand)]
pub enum WorkspaceCommand {
    /// Create or update a workspace, its lock state, and its SSH key
    Apply(WorkspaceApplyArgs),

    /// Delete a workspace
    Delete {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace name or ID
        workspace: String,
    },

    /// List workspaces, optionally restricted to the given names
    List {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace names or IDs, comma-separated or repeated; empty means all
        names: Vec<String>,
    },
}

// ============================================================================
// Teams
// ============================================================================

#[derive(Subcommand)]
pub enum TeamCommand {
    /// Create or update a team
    Apply {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Team name or ID to edit; omit to create from attributes
        team: Option<String>,

        /// Team attributes as inline JSON or @file (`name` required on create)
        #[arg(long)]
        attributes: String,
    },

    /// Delete a team
    Delete {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Team name or ID
        team: String,
    },

    /// List teams, optionally restricted to the given names
    List {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Team names or IDs, comma-separated or repeated; empty means all
        names: Vec<String>,
    },
}

// ============================================================================
// SSH keys
// ============================================================================

#[derive(Subcommand)]
pub enum SshKeyCommand {
    /// Create or update an SSH key
    Apply {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// SSH key name or ID to edit; omit to create from attributes
        ssh_key: Option<String>,

        /// SSH key attributes as inline JSON or @file (`name` required on create)
        #[arg(long)]
        attributes: String,
    },

    /// Delete an SSH key
    Delete {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// SSH key name or ID
        ssh_key: String,
    },

    /// List SSH keys, optionally restricted to the given names
    List {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// SSH key names or IDs, comma-separated or repeated; empty means all
        names: Vec<String>,
    },
}

// ============================================================================
// VCS connections
// ============================================================================

#[derive(Subcommand)]
pub enum VcsCommand {
    /// Create or update a VCS connection
    Apply {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// OAuth client ID or name to edit; omit to create from attributes
        client: Option<String>,

        /// OAuth client attributes as inline JSON or @file
        #[arg(long)]
        attributes: String,
    },

    /// Delete a VCS connection
    Delete {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// OAuth client ID or name
        client: String,
    },

    /// Show one VCS connection
    Show {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// OAuth client ID or name
        client: String,
    },

    /// List VCS connections
    List {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// OAuth client IDs or names, comma-separated or repeated; empty means all
        names: Vec<String>,
    },
}

// ============================================================================
// Workspace variables
// ============================================================================

#[derive(Subcommand)]
pub enum VarCommand {
    /// Create or update a workspace variable
    Apply {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace name or ID
        #[arg(short, long)]
        workspace: String,

        /// Variable key or ID to edit; omit to create from attributes
        variable: Option<String>,

        /// Variable attributes as inline JSON or @file (`key` required on create)
        #[arg(long)]
        attributes: String,
    },

    /// Delete a workspace variable
    Delete {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace name or ID
        #[arg(short, long)]
        workspace: String,

        /// Variable key or ID
        variable: String,
    },

    /// List workspace variables
    List {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace name or ID
        #[arg(short, long)]
        workspace: String,

        /// Variable keys or IDs, comma-separated or repeated; empty means all
        names: Vec<String>,
    },
}

// ============================================================================
// Runs
// ============================================================================

#[derive(Args)]
pub struct RunTargetArgs {
    /// Organization name or external-id
    #[arg(short, long)]
    pub organization: String,

    /// Workspace name or ID
    #[arg(short, long)]
    pub workspace: String,

    /// Run ID
    pub run: String,

    /// Comment to attach to the action
    #[arg(long)]
    pub comment: Option<String>,
}

#[derive(Subcommand)]
pub enum RunCommand {
    /// Queue a new run in a workspace
    Queue {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace name or ID
        #[arg(short, long)]
        workspace: String,

        /// Run attributes as inline JSON or @file
        #[arg(long)]
        attributes: Option<String>,
    },

    /// Apply a run waiting for confirmation
    Apply(RunTargetArgs),

    /// Discard a run
    Discard(RunTargetArgs),

    /// Cancel a run
    Cancel(RunTargetArgs),

    /// Forcefully cancel a run
    ForceCancel(RunTargetArgs),

    /// Skip the remaining plan queue and start the run
    ForceExecute(RunTargetArgs),

    /// List runs, optionally restricted to the given messages or IDs
    List {
        /// Organization name or external-id
        #[arg(short, long)]
        organization: String,

        /// Workspace name or ID
        #[arg(short, long)]
        workspace: String,

        /// Run messages or IDs, comma-separated or repeated; empty means all
        runs: Vec<String>,
    },
}
