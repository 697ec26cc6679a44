//! Clap derive structures for the `vigil` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vigil -- watch and drive an IoT security backend from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "vigil",
    version,
    about = "Watch live sensor topics and manage zones, sensors, cameras and modes",
    long_about = "A command-line client for the Vigil security backend.\n\n\
        Streams realtime topics over Socket.IO and drives the REST API\n\
        for zones, sensors, cameras, alerts and security modes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "VIGIL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// REST API URL (overrides profile)
    #[arg(long, env = "VIGIL_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Socket server URL (overrides profile)
    #[arg(long, env = "VIGIL_SOCKET_URL", global = true)]
    pub socket_url: Option<String>,

    /// Bearer token (overrides keyring and stored login)
    #[arg(long, env = "VIGIL_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VIGIL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VIGIL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VIGIL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Stream live topic state from the socket
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Send an event over the socket
    Emit(EmitArgs),

    /// Manage zones
    #[command(alias = "z")]
    Zones(ZonesArgs),

    /// Manage sensors
    #[command(alias = "s")]
    Sensors(SensorsArgs),

    /// Manage cameras
    #[command(alias = "cam")]
    Cameras(CamerasArgs),

    /// View device alerts
    Alerts(AlertsArgs),

    /// Manage security modes
    Modes(ModesArgs),

    /// Log in, log out, and inspect stored credentials
    Auth(AuthArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REALTIME
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Topics to subscribe to (e.g. home, alert, theft_detection)
    #[arg(required = true, value_name = "TOPIC")]
    pub topics: Vec<String>,

    /// Print on every store change instead of polling
    #[arg(long)]
    pub push: bool,

    /// Poll interval in milliseconds (overrides profile)
    #[arg(long, value_name = "MS", conflicts_with = "push")]
    pub interval: Option<u64>,

    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Print raw payloads instead of parsed readings
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct EmitArgs {
    /// Event name
    pub event: String,

    /// JSON payload (defaults to `{}`)
    #[arg(conflicts_with = "from_file")]
    pub payload: Option<String>,

    /// Read the JSON payload from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,

    /// Keep the socket open this long after sending
    #[arg(long, value_name = "MS", default_value = "250")]
    pub linger: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ZONES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub command: ZonesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ZonesCommand {
    /// List zones
    #[command(alias = "ls")]
    List,

    /// Get zone details
    Get {
        /// Zone ID
        id: String,
    },

    /// Create a zone
    Create {
        /// Load the full request from a JSON file
        #[arg(long, short = 'F', conflicts_with_all = ["name", "description", "sensors"])]
        from_file: Option<PathBuf>,

        /// Zone name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Sensor IDs to assign (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sensors: Option<Vec<String>>,
    },

    /// Update a zone
    Update {
        /// Zone ID
        id: String,

        /// Load the update from a JSON file
        #[arg(long, short = 'F', conflicts_with_all = ["name", "description", "sensors"])]
        from_file: Option<PathBuf>,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Replace sensor assignment (comma-separated)
        #[arg(long, value_delimiter = ',')]
        sensors: Option<Vec<String>>,
    },

    /// Delete a zone
    #[command(alias = "rm")]
    Delete {
        /// Zone ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SENSORS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SensorsArgs {
    #[command(subcommand)]
    pub command: SensorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SensorsCommand {
    /// List sensors
    #[command(alias = "ls")]
    List,

    /// Get sensor details
    Get {
        /// Sensor ID
        id: String,
    },

    /// Rename a sensor or move it to another zone
    Update {
        /// Sensor ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Zone ID to move the sensor into
        #[arg(long)]
        zone: Option<String>,
    },

    /// Delete a sensor
    #[command(alias = "rm")]
    Delete {
        /// Sensor ID
        id: String,
    },

    /// Enable or disable notifications for a sensor
    Notify {
        /// Sensor ID
        id: String,

        /// Enable notifications
        #[arg(long, conflicts_with = "off", required_unless_present = "off")]
        on: bool,

        /// Disable notifications
        #[arg(long)]
        off: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CAMERAS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CamerasArgs {
    #[command(subcommand)]
    pub command: CamerasCommand,
}

/// Shared camera fields for add/update.
#[derive(Debug, Args)]
pub struct CameraFields {
    /// Camera name
    #[arg(long)]
    pub name: Option<String>,

    /// Stream URL (rtsp://, http://)
    #[arg(long)]
    pub stream_url: Option<String>,

    /// Physical location
    #[arg(long)]
    pub location: Option<String>,

    /// Zone ID
    #[arg(long)]
    pub zone: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum CamerasCommand {
    /// List cameras
    #[command(alias = "ls")]
    List,

    /// Register a camera
    Add {
        #[command(flatten)]
        fields: CameraFields,
    },

    /// Update a camera
    Update {
        /// Camera ID
        id: String,

        #[command(flatten)]
        fields: CameraFields,
    },

    /// Delete a camera
    #[command(alias = "rm")]
    Delete {
        /// Camera ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALERTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts raised by a device
    #[command(alias = "ls")]
    List {
        /// Device ID
        device: String,

        /// Max results
        #[arg(long, short = 'l')]
        limit: Option<usize>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MODES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ModesArgs {
    #[command(subcommand)]
    pub command: ModesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ModesCommand {
    /// List modes
    #[command(alias = "ls")]
    List,

    /// Create a mode
    Create {
        /// Mode name
        #[arg(long)]
        name: String,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Mode settings as a JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Update a mode
    Update {
        /// Mode ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Replace settings from a JSON file
        #[arg(long)]
        settings: Option<PathBuf>,
    },

    /// Delete a mode
    #[command(alias = "rm")]
    Delete {
        /// Mode ID
        id: String,
    },

    /// Make a mode the active one
    Activate {
        /// Mode ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  AUTH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Store a bearer token for the active profile
    Login {
        /// Read the token from stdin instead of prompting
        #[arg(long)]
        stdin: bool,

        /// Store in the system keyring instead of local storage
        #[arg(long)]
        keyring: bool,
    },

    /// Forget stored tokens and session data
    Logout,

    /// Show where the active token comes from
    Status,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config and storage file locations
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
