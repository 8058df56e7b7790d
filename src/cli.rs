//! CLI argument parsing for the integration workbench.
//!
//! The CLI stays thin: every subcommand maps to one `run_*` function in
//! `workflow`, and all output is JSON on stdout except `project spec`.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ispec",
    version,
    about = "Document API-to-API integrations: systems, scenarios, field mappings and feasibility",
    after_help = "Examples:\n  ispec init\n  ispec system create --name CorrigoPro --base-url https://api.corrigo.example.com\n  ispec system discovery set <system-id> --file sample.json\n  ispec scenario create --project <project-id> --name \"WO → Case\" --cta <id> --cts <id>\n  ispec ai suggest-mappings --scenario <scenario-id> --apply\n  ispec project spec <project-id> --out SPEC.md",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Workspace directory (defaults to $ISPEC_WORKSPACE, then the user data dir)
    #[arg(long, value_name = "DIR", global = true)]
    pub workspace: Option<PathBuf>,

    /// Local LM command that reads a prompt on stdin (overrides config and env)
    #[arg(long, value_name = "CMD", global = true)]
    pub lm: Option<String>,

    /// Emit debug logs on stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config.json into the workspace
    Init(InitArgs),
    /// Manage projects and generate their spec documents
    #[command(subcommand)]
    Project(ProjectCommand),
    /// Manage systems, discovery samples, field flags and test calls
    #[command(subcommand)]
    System(SystemCommand),
    /// Manage integration scenarios, mappings and constraints
    #[command(subcommand)]
    Scenario(ScenarioCommand),
    /// AI-assisted helpers
    #[command(subcommand)]
    Ai(AiCommand),
    /// Delete every record in the workspace
    Reset(ResetArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.json
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Confirm deletion of all data
    #[arg(long)]
    pub yes: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List projects, newest first
    List,
    /// Create a project
    Create(ProjectCreateArgs),
    /// Show one project
    Show(IdArg),
    /// Render the project's integration spec as Markdown
    Spec(ProjectSpecArgs),
}

#[derive(Args, Debug)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ProjectCreateArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct ProjectSpecArgs {
    pub id: String,

    /// Write the Markdown to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum SystemCommand {
    /// List systems, newest first
    List,
    /// Register a system
    Create(SystemCreateArgs),
    /// Show one system
    Show(IdArg),
    /// Store or inspect the system's discovery sample
    #[command(subcommand)]
    Discovery(DiscoveryCommand),
    /// List the system's field flags
    Flags(IdArg),
    /// Set or clear the flag on one field path
    Flag(FlagArgs),
    /// Simulate a call from the stored discovery sample
    Simulate(SimulateArgs),
    /// Send a live test request to the system
    Test(TestArgs),
}

#[derive(Args, Debug)]
pub struct SystemCreateArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// apiKey or bearer (anything else means apiKey)
    #[arg(long, value_name = "TYPE")]
    pub auth: Option<String>,

    #[arg(long, value_name = "URL")]
    pub docs_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum DiscoveryCommand {
    /// Store a sample JSON response (from --file, --json, or stdin)
    Set(DiscoverySetArgs),
    /// Print the stored sample
    Show(IdArg),
    /// List the field paths discovered in the stored sample
    Fields(IdArg),
}

#[derive(Args, Debug)]
pub struct DiscoverySetArgs {
    pub id: String,

    #[arg(long, value_name = "PATH", conflicts_with = "json")]
    pub file: Option<PathBuf>,

    #[arg(long, value_name = "JSON")]
    pub json: Option<String>,
}

#[derive(Args, Debug)]
pub struct FlagArgs {
    pub id: String,

    #[arg(long, value_name = "FIELD_PATH")]
    pub path: String,

    /// key_id or business_critical; omit to clear
    #[arg(long)]
    pub flag: Option<String>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    pub id: String,

    /// Payload the call would send
    #[arg(long, value_name = "JSON")]
    pub payload: Option<String>,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    pub id: String,

    #[arg(long, default_value = "GET")]
    pub method: String,

    #[arg(long)]
    pub path: Option<String>,

    #[arg(long, conflicts_with = "bearer_token")]
    pub api_key: Option<String>,

    #[arg(long)]
    pub bearer_token: Option<String>,

    /// JSON request body (ignored for GET)
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ScenarioCommand {
    /// List a project's scenarios with their mappings, newest first
    List(ScenarioListArgs),
    /// Create a scenario in a project
    Create(ScenarioCreateArgs),
    /// Show one scenario with its mappings
    Show(IdArg),
    /// Change a scenario's name, description or systems
    Update(ScenarioUpdateArgs),
    /// List the scenario's field mappings
    Mappings(IdArg),
    /// Replace the scenario's field mappings (JSON array from --file or stdin)
    SetMappings(SetMappingsArgs),
    /// List the scenario's constraints, newest first
    Constraints(IdArg),
    /// Record a feasibility constraint
    AddConstraint(AddConstraintArgs),
    /// Evaluate the feasibility verdict
    Verdict(IdArg),
}

#[derive(Args, Debug)]
pub struct ScenarioListArgs {
    #[arg(long, value_name = "PROJECT_ID")]
    pub project: String,
}

#[derive(Args, Debug)]
pub struct ScenarioCreateArgs {
    #[arg(long, value_name = "PROJECT_ID")]
    pub project: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// Source (CTA) system id
    #[arg(long, value_name = "SYSTEM_ID")]
    pub cta: Option<String>,

    /// Target (CTS) system id
    #[arg(long, value_name = "SYSTEM_ID")]
    pub cts: Option<String>,
}

/// Only the given fields change; an empty string clears a nullable field.
#[derive(Args, Debug)]
pub struct ScenarioUpdateArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_name = "SYSTEM_ID")]
    pub cta: Option<String>,

    #[arg(long, value_name = "SYSTEM_ID")]
    pub cts: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetMappingsArgs {
    pub id: String,

    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AddConstraintArgs {
    pub id: String,

    #[arg(long)]
    pub description: Option<String>,

    /// docs, live or inference
    #[arg(long)]
    pub source: String,

    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AiCommand {
    /// Draft a scenario from a free-text use case
    ParseUsecase(ParseUsecaseArgs),
    /// Suggest field mappings between two systems
    SuggestMappings(SuggestMappingsArgs),
    /// Explain an HTTP response in plain language
    Interpret(InterpretArgs),
}

#[derive(Args, Debug)]
pub struct ParseUsecaseArgs {
    #[arg(long)]
    pub description: Option<String>,

    /// Known system names to hint at (repeatable)
    #[arg(long = "system", value_name = "NAME")]
    pub systems: Vec<String>,

    /// Gemini model override
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub struct SuggestMappingsArgs {
    /// Use the discovery samples of this scenario's CTA and CTS systems
    #[arg(long, value_name = "SCENARIO_ID", conflicts_with_all = ["source_fields", "target_fields"])]
    pub scenario: Option<String>,

    /// File with one source field path per line
    #[arg(long, value_name = "PATH", requires = "target_fields")]
    pub source_fields: Option<PathBuf>,

    /// File with one target field path per line
    #[arg(long, value_name = "PATH", requires = "source_fields")]
    pub target_fields: Option<PathBuf>,

    /// Store the suggestions as the scenario's mappings
    #[arg(long, requires = "scenario")]
    pub apply: bool,

    /// Gemini model override
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Args, Debug)]
pub struct InterpretArgs {
    #[arg(long)]
    pub status: u16,

    /// Response body; parsed as JSON when possible, text otherwise
    #[arg(long)]
    pub body: String,

    /// Gemini model override
    #[arg(long)]
    pub model: Option<String>,
}
