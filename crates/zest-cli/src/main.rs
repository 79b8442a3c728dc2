//! Command-line editor for Zest script files.
//!
//! Each invocation loads a `.zst` file, applies one edit or query through
//! [`ZestCreator`], and writes the file back when it changed.
//!
//! # Usage
//!
//! ```bash
//! # Start a new script (writes login.zst)
//! zest new login --title "Login check" --type active
//!
//! # Append a request, then attach an assertion to it
//! zest add login '{"elementType":"ZestRequest","url":"http://foo.com","method":"GET"}'
//! zest add login '{"elementType":"ZestExpressionStatusCode","code":200,"parentIndex":1,"subStatementOf":"assertions"}'
//!
//! # Add a conditional with one statement in each branch
//! zest add login '{"elementType":"ZestConditional"}'
//! zest add login '{"elementType":"ZestActionPrint","message":"ok","parentIndex":2,"subStatementOf":"ifStatements"}'
//! zest add login '{"elementType":"ZestActionFail","message":"no","parentIndex":2,"subStatementOf":"elseStatements"}'
//!
//! # Rearrange and prune
//! zest move login 2 1
//! zest delete login --index 3
//! zest delete login --parent 2 --role assertions --sub-index 0
//!
//! # Inspect
//! zest show login
//! zest show login --index 2
//! zest check login
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zest_core::config::{CreatorOptions, ZestConfig};
use zest_core::creator::{Added, Identifier, ZestCreator};
use zest_core::error::ScriptError;
use zest_core::loader::script_path;
use zest_core::script::ScriptType;
use zest_core::statement::{Role, Statement, StatementKind};

/// Command-line editor for Zest script files.
#[derive(Parser)]
#[command(name = "zest")]
#[command(about = "Create and edit Zest security test scripts")]
#[command(version)]
struct Cli {
    /// Write logs to this file instead of stderr
    #[arg(long, global = true, env = "ZEST_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty script
    New {
        /// Script file (".zst" is appended if missing)
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        about: Option<String>,
        /// Value of the script's generatedBy field
        #[arg(long)]
        client: Option<String>,
        /// Script type: standalone, active or passive
        #[arg(long = "type", value_parser = parse_script_type)]
        script_type: Option<ScriptType>,
    },

    /// Add a statement described by a JSON object
    ///
    /// Placement is read from the descriptor: "parentIndex" with
    /// "subStatementOf" adds to a role-list, "after" inserts after a
    /// statement, and neither appends.
    Add {
        file: PathBuf,
        /// JSON descriptor, e.g. '{"elementType":"ZestComment","comment":"hi"}'
        descriptor: String,
    },

    /// Delete a statement and its subtree, or members of a role-list
    #[command(group(ArgGroup::new("target").required(true).args(["index", "parent"])))]
    Delete {
        file: PathBuf,
        /// Index of the statement to delete
        #[arg(long)]
        index: Option<usize>,
        /// Index of the parent whose role-list is edited
        #[arg(long, requires = "role")]
        parent: Option<usize>,
        /// Role-list name: response, assertions, ifStatements, elseStatements, statements
        #[arg(long, requires = "parent", value_parser = parse_role)]
        role: Option<Role>,
        /// Position inside the role-list (all members when omitted)
        #[arg(long, requires = "role")]
        sub_index: Option<usize>,
    },

    /// Move a statement (with its subtree) to another index
    Move {
        file: PathBuf,
        old: usize,
        new: usize,
    },

    /// Print the statement tree, or one statement as JSON
    Show {
        file: PathBuf,
        #[arg(long)]
        index: Option<usize>,
    },

    /// Load and verify a script, printing its statement count
    Check { file: PathBuf },
}

fn parse_script_type(s: &str) -> Result<ScriptType, String> {
    let mut chars = s.chars();
    let normalized: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    normalized.parse().map_err(|e: ScriptError| e.to_string())
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse().map_err(|e: ScriptError| e.to_string())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version also arrive here.
            return if e.use_stderr() {
                ExitCode::from(3)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.log_file.as_deref());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn init_tracing(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path.file_name().unwrap_or(OsStr::new("zest.log"));
            let file_appender = tracing_appender::rolling::never(dir, name);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file_appender)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

/// CLI error type with distinct exit codes.
#[derive(Debug)]
enum CliError {
    /// The script could not be read, parsed, validated or written.
    Load(String),
    /// The edit or query itself was rejected.
    Operation(String),
    /// A malformed argument that clap cannot check.
    Usage(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Operation(_) => ExitCode::from(1),
            CliError::Load(_) => ExitCode::from(2),
            CliError::Usage(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Load(msg) => write!(f, "Load error: {}", msg),
            CliError::Operation(msg) => write!(f, "Operation failed: {}", msg),
            CliError::Usage(msg) => write!(f, "Usage error: {}", msg),
        }
    }
}

impl From<ScriptError> for CliError {
    fn from(e: ScriptError) -> Self {
        match e {
            ScriptError::Io(_) | ScriptError::Json(_) => CliError::Load(e.to_string()),
            other => CliError::Operation(other.to_string()),
        }
    }
}

fn open(file: &Path) -> Result<(ZestCreator, PathBuf), CliError> {
    let path = script_path(Some(file));
    let zc = ZestCreator::open(&path)
        .map_err(|e| CliError::Load(format!("{}: {}", path.display(), e)))?;
    debug!(path = %path.display(), count = zc.statement_count(), "opened script");
    Ok((zc, path))
}

fn save(zc: &ZestCreator, path: &Path) -> Result<(), CliError> {
    zc.save_to_file(Some(path))
        .map_err(|e| CliError::Load(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::New {
            file,
            title,
            description,
            author,
            about,
            client,
            script_type,
        } => {
            let defaults = CreatorOptions::from_config(&ZestConfig::load());
            let options = CreatorOptions {
                title: title.unwrap_or(defaults.title.clone()),
                description: description.unwrap_or(defaults.description.clone()),
                author: author.unwrap_or(defaults.author.clone()),
                about: about.unwrap_or(defaults.about.clone()),
                client: client.unwrap_or(defaults.client.clone()),
                script_type: script_type.unwrap_or(defaults.script_type),
                ..defaults
            };
            let zc = ZestCreator::new(&options);
            let path = zc
                .save_to_file(Some(file.as_path()))
                .map_err(|e| CliError::Load(e.to_string()))?;
            println!("{}", path.display());
        }

        Command::Add { file, descriptor } => {
            let descriptor: Value = serde_json::from_str(&descriptor)
                .map_err(|e| CliError::Usage(format!("descriptor is not valid JSON: {}", e)))?;
            let (mut zc, path) = open(&file)?;
            match zc.add_statement(&descriptor) {
                Ok(Added::Indexed(index)) => println!("{}", index),
                Ok(Added::Attached { parent, role }) => println!("{} {}", parent, role),
                Err(e @ ScriptError::UnrecognizedStatementType(_)) => {
                    eprintln!("Warning: {}", e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
            save(&zc, &path)?;
        }

        Command::Delete {
            file,
            index,
            parent,
            role,
            sub_index,
        } => {
            let ident = match (index, parent, role) {
                (Some(index), _, _) => Identifier::Index(index),
                (None, Some(parent_index), Some(role)) => Identifier::Role {
                    parent_index,
                    role,
                    sub_index,
                },
                _ => {
                    return Err(CliError::Usage(
                        "expected --index or --parent with --role".to_string(),
                    ))
                }
            };
            let (mut zc, path) = open(&file)?;
            let removed = zc.delete_statement(&ident)?;
            save(&zc, &path)?;
            println!("{}", removed);
        }

        Command::Move { file, old, new } => {
            let (mut zc, path) = open(&file)?;
            zc.move_statement(old, new)?;
            save(&zc, &path)?;
        }

        Command::Show { file, index } => {
            let (zc, _) = open(&file)?;
            match index {
                Some(index) => {
                    let stmt = zc.get_statement(index).ok_or(ScriptError::NotFound(index))?;
                    let json = serde_json::to_string_pretty(stmt)
                        .map_err(|e| CliError::Operation(e.to_string()))?;
                    println!("{}", json);
                }
                None => {
                    let script = zc.script();
                    println!(
                        "{} ({}, {} statements)",
                        script.title,
                        script.script_type,
                        zc.statement_count()
                    );
                    for line in outline(zc.statements()) {
                        println!("{}", line);
                    }
                }
            }
        }

        Command::Check { file } => {
            let (zc, _) = open(&file)?;
            let count = zc.verify()?;
            println!("{}", count);
        }
    }
    Ok(())
}

/// Renders the tree one statement per line, indented by depth.
fn outline(statements: &[Statement]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(usize, Option<Role>, &Statement)> =
        statements.iter().rev().map(|s| (0, None, s)).collect();

    while let Some((depth, role, stmt)) = stack.pop() {
        let indent = "  ".repeat(depth);
        let branch = role.map(|r| format!("[{}] ", r)).unwrap_or_default();
        let disabled = if stmt.enabled { "" } else { " (disabled)" };
        lines.push(format!(
            "{}{}{} {}{}{}",
            indent,
            branch,
            stmt.index,
            stmt.element_type(),
            summary(stmt),
            disabled
        ));

        if let Some(request) = stmt.as_request() {
            if let Some(response) = &request.response {
                lines.push(format!("{}  [response] {}", indent, response.url));
            }
            for assertion in &request.assertions {
                let kind = assertion
                    .root_expression
                    .as_ref()
                    .map(|e| e.element_type())
                    .unwrap_or("-");
                lines.push(format!("{}  [assertion] {}", indent, kind));
            }
        }

        for (r, list) in stmt.role_lists().into_iter().rev() {
            stack.extend(list.iter().rev().map(|s| (depth + 1, Some(r), s)));
        }
    }
    lines
}

fn summary(stmt: &Statement) -> String {
    match &stmt.kind {
        StatementKind::Comment(c) => format!(": {}", c.comment),
        StatementKind::Request(r) => format!(": {} {}", r.method, r.url),
        StatementKind::ActionPrint(a) => format!(": {}", a.message),
        StatementKind::ActionFail(a) => format!(": {}", a.message),
        StatementKind::ActionSleep(a) => format!(": {}ms", a.milliseconds),
        StatementKind::Conditional(c) => c
            .root_expression
            .as_ref()
            .map(|e| format!(": {}", e.element_type()))
            .unwrap_or_default(),
        StatementKind::AssignString(a) => format!(": {}", a.variable_name),
        StatementKind::AssignRandomInteger(a) => format!(": {}", a.variable_name),
        StatementKind::AssignReplace(a) => format!(": {}", a.variable_name),
        StatementKind::AssignStringDelimiters(a) | StatementKind::AssignRegexDelimiters(a) => {
            format!(": {}", a.variable_name)
        }
        StatementKind::LoopString(l) => format!(": {} in {:?}", l.variable_name, l.values),
        StatementKind::LoopInteger(l) => {
            format!(": {} in {}..{} step {}", l.variable_name, l.start, l.end, l.step)
        }
    }
}
