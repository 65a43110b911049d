// crates/reelgate-cli/src/main.rs
// ============================================================================
// Module: Reelgate CLI Entry Point
// Description: Command dispatcher for shot tracking, releases, and bundles.
// Purpose: Build typed requests at the boundary and map failures to exit codes.
// Dependencies: clap, reelgate-config, reelgate-contract, reelgate-core, time
// ============================================================================

//! ## Overview
//! The reelgate CLI drives the shot pipeline: it edits the state document,
//! moves shots through the guarded lifecycle, builds and verifies release
//! manifests, evaluates the release gate, and merges releases into bundles.
//! The wall clock is read here and nowhere else. All user-facing strings are
//! routed through the message catalog, and every pipeline error kind maps to
//! a stable exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::ArgGroup;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use reelgate_cli::exit_codes::IO_FAILURE;
use reelgate_cli::exit_codes::VALIDATION_FAILURE;
use reelgate_cli::exit_codes::exit_code_for;
use reelgate_cli::t;
use reelgate_config::ReelgateConfig;
use reelgate_contract::SchemaQcValidator;
use reelgate_contract::StateDocumentValidator;
use reelgate_core::AttachOutputRequest;
use reelgate_core::AuditSink;
use reelgate_core::BundleMerger;
use reelgate_core::BundleRequest;
use reelgate_core::ConflictPolicy;
use reelgate_core::DEFAULT_HASH_ALGORITHM;
use reelgate_core::FileStateStore;
use reelgate_core::GateRequest;
use reelgate_core::NewShotRequest;
use reelgate_core::NoopAuditSink;
use reelgate_core::PipelineError;
use reelgate_core::PolicyGate;
use reelgate_core::ProjectFile;
use reelgate_core::ProjectId;
use reelgate_core::PromoteRequest;
use reelgate_core::PromoteSelection;
use reelgate_core::QcPolicy;
use reelgate_core::ReleaseBuilder;
use reelgate_core::ReleaseId;
use reelgate_core::ReleaseRequest;
use reelgate_core::RenderRequest;
use reelgate_core::ShotFilter;
use reelgate_core::ShotId;
use reelgate_core::ShotStateMachine;
use reelgate_core::ShotStatus;
use reelgate_core::ShotTracker;
use reelgate_core::StateDocumentStore;
use reelgate_core::TransitionRequest;
use reelgate_core::UtcTimestamp;
use reelgate_core::VerificationReport;
use reelgate_core::core::paths::ensure_single_segment;
use reelgate_core::runtime::files::MAX_PROJECT_FILE_BYTES;
use reelgate_core::runtime::files::MAX_STATE_DOCUMENT_BYTES;
use reelgate_core::runtime::files::read_bytes_with_limit;
use reelgate_core::runtime::verifier::ManifestVerifier;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Rule printed under the shot listing header.
const LIST_RULE_WIDTH: usize = 80;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "reelgate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to reelgate.toml or `REELGATE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a state document and report every problem.
    Validate(ValidateCommand),
    /// Add a new PLANNED shot.
    Newshot(NewShotCommand),
    /// Record an output path on a shot.
    Attach(AttachCommand),
    /// Copy a rendered preview into place and record it.
    Render(RenderCommand),
    /// Move one shot to a new status.
    Transition(TransitionCommand),
    /// Promote DONE shots into a release.
    Promote(PromoteCommand),
    /// List shots with optional filters.
    Listshots(ListShotsCommand),
    /// Build a file-list release from DONE shots.
    Release(ReleaseCommand),
    /// Write an artifact-list manifest for DONE shots.
    Manifest(ManifestCommand),
    /// Verify a manifest against the files it declares.
    VerifyManifest(VerifyManifestCommand),
    /// Evaluate the release gate for a project release.
    ReleaseGate(ReleaseGateCommand),
    /// Merge releases into a bundle.
    Bundle(BundleCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration.
    Validate,
}

/// Arguments for state document validation.
#[derive(Args, Debug)]
struct ValidateCommand {
    /// Path to the state document.
    path: PathBuf,
}

/// Arguments for shot creation.
#[derive(Args, Debug)]
struct NewShotCommand {
    /// Path to the state document.
    path: PathBuf,
    /// New shot identifier.
    shot_id: String,
    /// Generation prompt.
    #[arg(long)]
    prompt: String,
    /// Production phase.
    #[arg(long, default_value = "FAZ_1")]
    phase: String,
}

/// Arguments for output attachment.
#[derive(Args, Debug)]
struct AttachCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Shot identifier.
    shot_id: String,
    /// Output key (for example `qc.json`).
    #[arg(long)]
    key: String,
    /// Output path relative to the state document.
    #[arg(long, value_name = "PATH")]
    file: String,
    /// Project whose policy applies (defaults to the document's project).
    #[arg(long)]
    project: Option<String>,
    /// Optional history note.
    #[arg(long)]
    note: Option<String>,
}

/// Arguments for preview rendering.
#[derive(Args, Debug)]
struct RenderCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Shot identifier.
    shot_id: String,
    /// Source preview file.
    #[arg(long, value_name = "FILE")]
    src: PathBuf,
    /// Output directory relative to the state document.
    #[arg(long, value_name = "DIR")]
    out: String,
    /// Project whose policy applies (defaults to the document's project).
    #[arg(long)]
    project: Option<String>,
}

/// Arguments for a status transition.
#[derive(Args, Debug)]
struct TransitionCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Shot identifier.
    shot_id: String,
    /// Target status.
    #[arg(long, value_parser = parse_status)]
    to: ShotStatus,
    /// Release identifier for RELEASE transitions.
    #[arg(long)]
    release: Option<String>,
    /// Project identifier (defaults to the document's project).
    #[arg(long)]
    project: Option<String>,
    /// Optional history note.
    #[arg(long)]
    note: Option<String>,
}

/// Arguments for batch promotion.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("selection").required(true).args(["all_done", "shots"])))]
struct PromoteCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Release identifier.
    #[arg(long)]
    release: String,
    /// Project identifier (defaults to the document's project).
    #[arg(long)]
    project: Option<String>,
    /// Promote every DONE shot.
    #[arg(long, action = ArgAction::SetTrue)]
    all_done: bool,
    /// Shot ids, space or comma separated.
    #[arg(long, num_args = 1..)]
    shots: Vec<String>,
    /// Optional history note.
    #[arg(long)]
    note: Option<String>,
}

/// Arguments for the shot listing.
#[derive(Args, Debug)]
struct ListShotsCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Only list shots in this status.
    #[arg(long, value_parser = parse_status)]
    status: Option<ShotStatus>,
    /// Only list shots in this phase.
    #[arg(long)]
    phase: Option<String>,
}

/// Arguments for a file-list release build.
#[derive(Args, Debug)]
struct ReleaseCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Releases directory (defaults to `paths.releases_dir`).
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Release identifier (defaults to the current UTC time).
    #[arg(long)]
    release_id: Option<String>,
    /// Project recorded in the manifest (defaults to the document's project).
    #[arg(long)]
    project_id: Option<String>,
}

/// Arguments for an artifact-list manifest build.
#[derive(Args, Debug)]
struct ManifestCommand {
    /// Path to the state document.
    path: PathBuf,
    /// Release identifier.
    #[arg(long)]
    release: String,
    /// Project recorded in the manifest (defaults to the document's project).
    #[arg(long)]
    project_id: Option<String>,
}

/// Arguments for manifest verification.
#[derive(Args, Debug)]
struct VerifyManifestCommand {
    /// Path to the manifest.
    manifest_path: PathBuf,
    /// Tree root for artifact-list manifests (defaults to the working directory).
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Output format for the verification report.
    #[arg(long, value_enum, default_value_t = VerifyFormat::Text)]
    format: VerifyFormat,
}

/// Output formats for verification reports.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum VerifyFormat {
    /// One line per issue.
    Text,
    /// Pretty-printed JSON report.
    Json,
}

/// Arguments for the release gate.
#[derive(Args, Debug)]
struct ReleaseGateCommand {
    /// Project identifier.
    #[arg(long)]
    project: String,
    /// Release identifier.
    #[arg(long)]
    release: String,
    /// Project file override relative to the working directory.
    #[arg(long, value_name = "PATH")]
    project_file: Option<String>,
    /// Manifest override relative to the working directory.
    #[arg(long, value_name = "PATH")]
    manifest: Option<String>,
}

/// Arguments for bundle building.
#[derive(Args, Debug)]
struct BundleCommand {
    /// Source release directories, in precedence order.
    #[arg(long = "source", value_name = "DIR", required = true)]
    sources: Vec<PathBuf>,
    /// Bundle identifier.
    #[arg(long)]
    bundle_id: String,
    /// Only include these shots (space or comma separated).
    #[arg(long, num_args = 1..)]
    shots: Vec<String>,
    /// Conflict policy (defaults to `bundle.conflict_policy`).
    #[arg(long, value_parser = parse_conflict_policy)]
    conflict_policy: Option<ConflictPolicy>,
    /// Output directory (defaults to `paths.releases_dir`).
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
    /// Project recorded in the bundle manifest.
    #[arg(long)]
    project_id: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error carrying a localized message and its exit code.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
    /// Process exit code.
    code: u8,
}

impl CliError {
    /// Constructs an I/O class error from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
            code: IO_FAILURE,
        }
    }

    /// Constructs an error with an explicit exit code.
    const fn with_code(message: String, code: u8) -> Self {
        Self {
            message,
            code,
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        let kind = err.kind();
        Self::with_code(t!("error.pipeline", kind = kind.as_str(), error = err), exit_code_for(kind))
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))?;
        return Ok(ExitCode::SUCCESS);
    }
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    let context = Context::load(cli.config.as_deref())?;
    match command {
        Commands::Validate(command) => command_validate(&command),
        Commands::Newshot(command) => command_newshot(&context, &command),
        Commands::Attach(command) => command_attach(&context, command),
        Commands::Render(command) => command_render(&context, command),
        Commands::Transition(command) => command_transition(&context, command),
        Commands::Promote(command) => command_promote(&context, command),
        Commands::Listshots(command) => command_listshots(command),
        Commands::Release(command) => command_release(&context, command),
        Commands::Manifest(command) => command_manifest(&context, command),
        Commands::VerifyManifest(command) => command_verify_manifest(&context, &command),
        Commands::ReleaseGate(command) => command_release_gate(&context, command),
        Commands::Bundle(command) => command_bundle(&context, command),
        Commands::Config {
            command,
        } => match command {
            ConfigCommand::Validate => command_config_validate(&context),
        },
    }
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("")
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Shared state for commands that touch the repository.
struct Context {
    /// Repository root; the working directory.
    root: PathBuf,
    /// Loaded tool configuration.
    config: ReelgateConfig,
    /// Audit sink selected by the configuration.
    audit: Box<dyn AuditSink>,
}

impl Context {
    /// Loads configuration and opens the audit sink.
    fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let config = ReelgateConfig::load(config_path)
            .map_err(|err| CliError::with_code(t!("config.load_failed", error = err), VALIDATION_FAILURE))?;
        let root = std::env::current_dir()
            .map_err(|err| CliError::new(t!("context.cwd_failed", error = err)))?;
        let audit = config
            .audit
            .open_sink(&root)
            .map_err(|err| CliError::new(t!("config.audit_failed", error = err)))?;
        Ok(Self {
            root,
            config,
            audit,
        })
    }

    /// Returns the configured actor label.
    fn actor(&self) -> String {
        self.config.actor.name.trim().to_string()
    }

    /// Returns the configured releases directory.
    fn releases_root(&self) -> PathBuf {
        self.config.paths.releases_root(&self.root)
    }

    /// Reads the optional project file for `project_id`.
    fn project_file(&self, project_id: &ProjectId) -> CliResult<Option<ProjectFile>> {
        ensure_single_segment(project_id.as_str()).map_err(PipelineError::from)?;
        let layout = self.config.gate_layout(&self.root);
        let path = self.root.join(layout.project_file(project_id));
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = read_bytes_with_limit(&path, MAX_PROJECT_FILE_BYTES)?;
        Ok(Some(ProjectFile::from_json_bytes(&bytes)?))
    }
}

/// Reads the wall clock at second precision.
fn now() -> UtcTimestamp {
    UtcTimestamp::from_datetime(OffsetDateTime::now_utc())
}

/// Resolves an explicit project id or falls back to the document's project.
fn project_for(store: &FileStateStore, explicit: Option<String>) -> CliResult<Option<ProjectId>> {
    if let Some(project) = explicit {
        return Ok(Some(ProjectId::new(project)));
    }
    let document = store.load().map_err(PipelineError::from)?;
    let project = document.active_project.trim();
    Ok((!project.is_empty()).then(|| ProjectId::new(project)))
}

/// Settings taken from the optional project file.
struct ProjectSettings {
    /// Whether DONE outputs are frozen.
    immutable_outputs: bool,
    /// QC rules for the DONE guard.
    qc: QcPolicy,
}

/// Loads project settings, defaulting when no project file exists.
fn project_settings(context: &Context, project: Option<&ProjectId>) -> CliResult<ProjectSettings> {
    let file = match project {
        Some(project) => context.project_file(project)?,
        None => None,
    };
    Ok(file.map_or_else(
        || ProjectSettings {
            immutable_outputs: false,
            qc: QcPolicy::default(),
        },
        |file| ProjectSettings {
            immutable_outputs: file.policy.immutable_outputs == Some(true),
            qc: file.qc_policy(),
        },
    ))
}

/// Compiles the schema-backed QC validator.
fn qc_validator() -> CliResult<SchemaQcValidator> {
    SchemaQcValidator::new().map_err(|err| CliError::new(t!("contract.init_failed", error = err)))
}

// ============================================================================
// SECTION: Shot Commands
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let bytes = read_bytes_with_limit(&command.path, MAX_STATE_DOCUMENT_BYTES)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
        CliError::with_code(
            t!("validate.parse_failed", path = command.path.display(), error = err),
            VALIDATION_FAILURE,
        )
    })?;
    let validator = StateDocumentValidator::new()
        .map_err(|err| CliError::new(t!("contract.init_failed", error = err)))?;
    let problems = validator.validate(&value);
    if problems.is_empty() {
        write_stdout_line(&t!("validate.ok", path = command.path.display()))?;
        return Ok(ExitCode::SUCCESS);
    }
    write_stderr_line(&t!("validate.failed", count = problems.len()))?;
    for problem in &problems {
        write_stderr_line(&t!("validate.problem", problem = problem))?;
    }
    Ok(ExitCode::from(VALIDATION_FAILURE))
}

/// Executes the `newshot` command.
fn command_newshot(context: &Context, command: &NewShotCommand) -> CliResult<ExitCode> {
    let tracker = ShotTracker::new(FileStateStore::new(&command.path), &*context.audit, false);
    tracker.create_shot(&NewShotRequest {
        shot_id: ShotId::new(command.shot_id.trim()),
        phase: command.phase.clone(),
        prompt: command.prompt.clone(),
        actor: context.actor(),
        at: now(),
    })?;
    write_stdout_line(&t!("newshot.ok", shot = command.shot_id.trim()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `attach` command.
fn command_attach(context: &Context, command: AttachCommand) -> CliResult<ExitCode> {
    let store = FileStateStore::new(&command.path);
    let project = project_for(&store, command.project)?;
    let settings = project_settings(context, project.as_ref())?;
    let tracker = ShotTracker::new(store, &*context.audit, settings.immutable_outputs);
    let outcome = tracker.attach_output(&AttachOutputRequest {
        shot_id: ShotId::new(command.shot_id.clone()),
        key: command.key.clone(),
        path: command.file,
        actor: context.actor(),
        at: now(),
        note: command.note,
    })?;
    let message = if outcome.changed {
        t!("attach.ok", shot = command.shot_id, key = command.key, path = outcome.path)
    } else {
        t!("attach.unchanged", shot = command.shot_id, key = command.key, path = outcome.path)
    };
    write_stdout_line(&message)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `render` command.
fn command_render(context: &Context, command: RenderCommand) -> CliResult<ExitCode> {
    let store = FileStateStore::new(&command.path);
    let project = project_for(&store, command.project)?;
    let settings = project_settings(context, project.as_ref())?;
    let tracker = ShotTracker::new(store, &*context.audit, settings.immutable_outputs);
    let outcome = tracker.render(&RenderRequest {
        shot_id: ShotId::new(command.shot_id.clone()),
        source: command.src,
        out_dir: command.out,
        actor: context.actor(),
        at: now(),
    })?;
    write_stdout_line(&t!("render.ok", shot = command.shot_id, path = outcome.path))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `transition` command.
fn command_transition(context: &Context, command: TransitionCommand) -> CliResult<ExitCode> {
    let store = FileStateStore::new(&command.path);
    let project = project_for(&store, command.project)?;
    let settings = project_settings(context, project.as_ref())?;
    let validator = qc_validator()?;
    let gate = PolicyGate::new(context.config.gate_layout(&context.root), &validator, &*context.audit);
    let machine = ShotStateMachine::new(store, &validator, gate, &*context.audit, settings.qc);
    let outcome = machine.transition(&TransitionRequest {
        shot_id: ShotId::new(command.shot_id),
        to: command.to,
        actor: context.actor(),
        at: now(),
        release_id: command.release.map(ReleaseId::new),
        project_id: project,
        note: command.note,
    })?;
    write_stdout_line(&t!(
        "transition.ok",
        shot = outcome.shot_id,
        from = outcome.from,
        to = outcome.to
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `promote` command.
fn command_promote(context: &Context, command: PromoteCommand) -> CliResult<ExitCode> {
    let store = FileStateStore::new(&command.path);
    let project = project_for(&store, command.project)?;
    let settings = project_settings(context, project.as_ref())?;
    let validator = qc_validator()?;
    let gate = PolicyGate::new(context.config.gate_layout(&context.root), &validator, &*context.audit);
    let machine = ShotStateMachine::new(store, &validator, gate, &*context.audit, settings.qc);
    let selection = if command.all_done {
        PromoteSelection::AllDone
    } else {
        PromoteSelection::Shots(split_id_list(&command.shots).into_iter().map(ShotId::new).collect())
    };
    let release_id = ReleaseId::new(command.release);
    let outcome = machine.promote(&PromoteRequest {
        release_id: release_id.clone(),
        project_id: project,
        selection,
        actor: context.actor(),
        at: now(),
        note: command.note,
    })?;
    if !outcome.promoted.is_empty() {
        write_stdout_line(&t!(
            "promote.ok",
            count = outcome.promoted.len(),
            release = release_id,
            shots = join_ids(&outcome.promoted)
        ))?;
    }
    if !outcome.already_released.is_empty() {
        write_stdout_line(&t!("promote.skipped", shots = join_ids(&outcome.already_released)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `listshots` command.
fn command_listshots(command: ListShotsCommand) -> CliResult<ExitCode> {
    let tracker = ShotTracker::new(FileStateStore::new(&command.path), NoopAuditSink, false);
    let listing = tracker.list_shots(&ShotFilter {
        status: command.status,
        phase: command.phase,
    })?;
    let mut output = String::new();
    output.push_str(&format!("{:<8} {:<8} {:<12} {:<5} ", "ID", "PHASE", "STATUS", "OUT#"));
    output.push_str(&t!("listshots.prompt_column"));
    output.push('\n');
    output.push_str(&"-".repeat(LIST_RULE_WIDTH));
    output.push('\n');
    for row in &listing.rows {
        output.push_str(&format!(
            "{:<8} {:<8} {:<12} {:<5} {}\n",
            row.shot_id.as_str(),
            row.phase,
            row.status.as_str(),
            row.outputs,
            row.prompt
        ));
    }
    output.push('\n');
    output.push_str(&t!("listshots.summary", total = listing.total, done = listing.done));
    write_stdout_line(&output)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Release Commands
// ============================================================================

/// Executes the `release` command.
fn command_release(context: &Context, command: ReleaseCommand) -> CliResult<ExitCode> {
    let store = FileStateStore::new(&command.path);
    let document = store.load().map_err(PipelineError::from)?;
    let at = now();
    let release_id = command.release_id.unwrap_or_else(|| at.compact());
    let project_id = command
        .project_id
        .or_else(|| Some(document.active_project.trim().to_string()).filter(|id| !id.is_empty()))
        .map(ProjectId::new);
    let releases_root = command.out.unwrap_or_else(|| context.releases_root());
    let built = ReleaseBuilder::new(&*context.audit, DEFAULT_HASH_ALGORITHM).build_release(
        &document,
        store.base_dir(),
        &ReleaseRequest {
            release_id: ReleaseId::new(release_id),
            project_id,
            releases_root,
            created_utc: at,
        },
    )?;
    write_stdout_line(&t!("release.ok", path = built.release_dir.display()))?;
    write_stdout_line(&t!("release.shots", count = built.manifest.totals.total_shots))?;
    write_stdout_line(&t!("release.manifest", path = built.manifest_path.display()))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `manifest` command.
fn command_manifest(context: &Context, command: ManifestCommand) -> CliResult<ExitCode> {
    let store = FileStateStore::new(&command.path);
    let document = store.load().map_err(PipelineError::from)?;
    ensure_tree_root(&context.root, store.base_dir())?;
    let project_id = command
        .project_id
        .or_else(|| Some(document.active_project.trim().to_string()).filter(|id| !id.is_empty()))
        .map(ProjectId::new);
    let built = ReleaseBuilder::new(&*context.audit, DEFAULT_HASH_ALGORITHM)
        .build_artifact_manifest(
            &document,
            store.base_dir(),
            &ReleaseRequest {
                release_id: ReleaseId::new(command.release),
                project_id,
                releases_root: context.releases_root(),
                created_utc: now(),
            },
        )?;
    write_stdout_line(&t!(
        "manifest.ok",
        path = built.manifest_path.display(),
        count = built.manifest.artifacts.len()
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Requires the state document to sit in the repository root.
///
/// Artifact-list paths are relative to the state document directory while
/// `verify-manifest` and `release-gate` resolve them against the root.
fn ensure_tree_root(root: &Path, base_dir: &Path) -> CliResult<()> {
    let canonical = |path: &Path| {
        path.canonicalize().map_err(|err| {
            CliError::new(t!("manifest.root_unreadable", path = path.display(), error = err))
        })
    };
    if canonical(root)? == canonical(base_dir)? {
        return Ok(());
    }
    Err(CliError::with_code(
        t!("manifest.outside_root", path = base_dir.display(), root = root.display()),
        VALIDATION_FAILURE,
    ))
}

/// Executes the `verify-manifest` command.
fn command_verify_manifest(
    context: &Context,
    command: &VerifyManifestCommand,
) -> CliResult<ExitCode> {
    let root = command.root.clone().unwrap_or_else(|| context.root.clone());
    let (_, report) = ManifestVerifier::default().inspect_file(&command.manifest_path, &root)?;
    let output = render_verification_report(command.format, &command.manifest_path, &report)?;
    write_stdout_line(&output)?;
    match report.into_result() {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => Ok(ExitCode::from(exit_code_for(err.kind()))),
    }
}

/// Renders a verification report in the requested format.
fn render_verification_report(
    format: VerifyFormat,
    manifest_path: &Path,
    report: &VerificationReport,
) -> CliResult<String> {
    match format {
        VerifyFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|err| CliError::new(t!("verify.render_failed", error = err))),
        VerifyFormat::Text => {
            if report.is_pass() {
                return Ok(t!(
                    "verify.ok",
                    path = manifest_path.display(),
                    count = report.checked_files
                ));
            }
            let mut lines = vec![t!("verify.failed", path = manifest_path.display())];
            if report.issues.is_empty() {
                lines.push(t!("verify.empty"));
            }
            for issue in &report.issues {
                lines.push(t!(
                    "verify.issue",
                    kind = issue.kind.as_str(),
                    path = issue.path.as_deref().unwrap_or("-"),
                    detail = issue.detail
                ));
            }
            Ok(lines.join("\n"))
        }
    }
}

/// Executes the `release-gate` command.
fn command_release_gate(context: &Context, command: ReleaseGateCommand) -> CliResult<ExitCode> {
    let validator = qc_validator()?;
    let gate = PolicyGate::new(context.config.gate_layout(&context.root), &validator, &*context.audit);
    let report = gate.evaluate(&GateRequest {
        project_id: ProjectId::new(command.project),
        release_id: ReleaseId::new(command.release.clone()),
        project_file: command.project_file,
        manifest: command.manifest,
        at: now(),
    })?;
    write_stdout_line(&t!(
        "gate.ok",
        release = command.release,
        count = report.verification.checked_files
    ))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `bundle` command.
fn command_bundle(context: &Context, command: BundleCommand) -> CliResult<ExitCode> {
    let shots = split_id_list(&command.shots);
    let shot_filter =
        (!shots.is_empty()).then(|| shots.into_iter().map(ShotId::new).collect::<BTreeSet<_>>());
    let request = BundleRequest {
        sources: command.sources,
        bundle_id: ReleaseId::new(command.bundle_id),
        shot_filter,
        conflict_policy: command.conflict_policy.unwrap_or(context.config.bundle.conflict_policy),
        output_root: command.out.unwrap_or_else(|| context.releases_root()),
        created_utc: now(),
        project_id: command.project_id.map(ProjectId::new),
    };
    let built = BundleMerger::new(&*context.audit, DEFAULT_HASH_ALGORITHM).build_bundle(&request)?;
    write_stdout_line(&t!(
        "bundle.ok",
        path = built.release_dir.display(),
        shots = built.manifest.totals.total_shots,
        files = built.manifest.totals.total_files
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes the config validation command.
fn command_config_validate(context: &Context) -> CliResult<ExitCode> {
    let message = match &context.config.source {
        Some(path) => t!("config.validate.ok", path = path.display()),
        None => t!("config.validate.defaults"),
    };
    write_stdout_line(&message)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

/// Parses a status label for clap.
fn parse_status(value: &str) -> Result<ShotStatus, String> {
    ShotStatus::parse(value.trim()).ok_or_else(|| t!("args.status_invalid", value = value))
}

/// Parses a conflict policy label for clap.
fn parse_conflict_policy(value: &str) -> Result<ConflictPolicy, String> {
    ConflictPolicy::parse(value.trim()).ok_or_else(|| t!("args.conflict_policy_invalid", value = value))
}

/// Splits repeated id arguments on commas and whitespace.
fn split_id_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(|c: char| c == ',' || c.is_whitespace()))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins shot ids for display.
fn join_ids(ids: &[ShotId]) -> String {
    ids.iter().map(ShotId::as_str).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> CliResult<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}").map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns its exit code.
fn emit_error(err: &CliError) -> ExitCode {
    let _ = writeln!(std::io::stderr(), "{}", err.message);
    ExitCode::from(err.code)
}
