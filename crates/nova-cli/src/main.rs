use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nova_config::{load_for_workspace, NovaConfig};
use nova_ide::{code_select, complete, CompletionRequest, ScopeHints, SelectRequest};
use nova_index::{LimitTo, MatchMode, SearchEngine, SearchFor, SearchMatch, SearchPattern, SearchScope};
use nova_project::{load_manifest, Workspace};
use nova_types::TypeSig;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nova", version, about = "Nova CLI (completion, code select, search)")]
struct Cli {
    /// `nova.toml` to use instead of the one discovered next to the manifest
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Complete at a byte offset of a workspace file
    Complete(CompleteArgs),
    /// Resolve the identifier at a byte offset to its declarations
    Select(SelectArgs),
    /// Search the workspace for declarations and references
    Search(SearchArgs),
    /// Print the JSON schema of `nova.toml`
    Schema,
}

#[derive(Args)]
struct WorkspaceArgs {
    /// JSON workspace manifest
    manifest: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CompleteArgs {
    #[command(flatten)]
    workspace: WorkspaceArgs,
    /// Workspace path of the file, as named in the manifest
    path: String,
    /// Byte offset of the cursor
    offset: usize,
    /// Reject case-insensitive prefix matches
    #[arg(long)]
    case_sensitive: bool,
    /// Enable camel-case matching
    #[arg(long)]
    camel_case: bool,
    /// Enable substring matching
    #[arg(long)]
    substring: bool,
    /// Enable subword matching
    #[arg(long)]
    subword: bool,
    /// Keep at most this many proposals
    #[arg(long)]
    max_results: Option<usize>,
    /// Type expected at the cursor, e.g. `int` or `java.util.List<String>`
    #[arg(long)]
    expected_type: Option<String>,
}

#[derive(Args)]
struct SelectArgs {
    #[command(flatten)]
    workspace: WorkspaceArgs,
    /// Workspace path of the file, as named in the manifest
    path: String,
    /// Byte offset of the selection start
    offset: usize,
    /// Selection length in bytes
    #[arg(long, default_value_t = 0)]
    length: usize,
}

#[derive(Args)]
struct SearchArgs {
    #[command(flatten)]
    workspace: WorkspaceArgs,
    /// Search pattern, e.g. `p.X<String>` or `p.X.foo(int)`
    pattern: String,
    /// Kind of element the pattern names
    #[arg(long = "for", value_enum, default_value_t = ElementArg::Type)]
    search_for: ElementArg,
    /// Occurrences to report
    #[arg(long, value_enum, default_value_t = LimitArg::AllOccurrences)]
    limit_to: LimitArg,
    /// Name comparison; defaults to `search.mode` from the config
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Compare names ignoring case
    #[arg(long)]
    ignore_case: bool,
    /// Restrict the search to these projects
    #[arg(long = "project")]
    projects: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ElementArg {
    Type,
    Method,
    Constructor,
    Field,
    Package,
    Module,
}

impl From<ElementArg> for SearchFor {
    fn from(arg: ElementArg) -> Self {
        match arg {
            ElementArg::Type => SearchFor::Type,
            ElementArg::Method => SearchFor::Method,
            ElementArg::Constructor => SearchFor::Constructor,
            ElementArg::Field => SearchFor::Field,
            ElementArg::Package => SearchFor::Package,
            ElementArg::Module => SearchFor::Module,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LimitArg {
    Declarations,
    References,
    AllOccurrences,
    Implementors,
    ReadAccesses,
    WriteAccesses,
    SupertypeReferences,
    PermitsReferences,
}

impl From<LimitArg> for LimitTo {
    fn from(arg: LimitArg) -> Self {
        match arg {
            LimitArg::Declarations => LimitTo::Declarations,
            LimitArg::References => LimitTo::References,
            LimitArg::AllOccurrences => LimitTo::AllOccurrences,
            LimitArg::Implementors => LimitTo::Implementors,
            LimitArg::ReadAccesses => LimitTo::ReadAccesses,
            LimitArg::WriteAccesses => LimitTo::WriteAccesses,
            LimitArg::SupertypeReferences => LimitTo::SupertypeTypeReference,
            LimitArg::PermitsReferences => LimitTo::PermittypeTypeReference,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Exact,
    Prefix,
    Pattern,
    CamelCase,
}

impl From<ModeArg> for MatchMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Exact => MatchMode::Exact,
            ModeArg::Prefix => MatchMode::Prefix,
            ModeArg::Pattern => MatchMode::Pattern,
            ModeArg::CamelCase => MatchMode::CamelCase,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let manifest = match &cli.command {
        Command::Complete(args) => &args.workspace.manifest,
        Command::Select(args) => &args.workspace.manifest,
        Command::Search(args) => &args.workspace.manifest,
        Command::Schema => {
            print_json(&nova_config::json_schema())?;
            return Ok(0);
        }
    };
    let config = load_config(cli.config.as_deref(), manifest)?;
    nova_config::init_tracing(&config.logging);

    match cli.command {
        Command::Complete(args) => {
            let ws = open(&args.workspace.manifest)?;
            let mut options = config.completion.match_options();
            options.case_sensitive |= args.case_sensitive;
            options.camel_case |= args.camel_case;
            options.substring |= args.substring;
            options.subword |= args.subword;
            let mut request = CompletionRequest::new(args.path, args.offset).with_options(options);
            if let Some(max) = args.max_results.or(config.completion.max_results()) {
                request = request.with_max_results(max);
            }
            if let Some(expected) = &args.expected_type {
                let expected_type = TypeSig::parse(expected)
                    .with_context(|| format!("invalid --expected-type `{expected}`"))?;
                request = request.with_hints(ScopeHints {
                    expected_type: Some(expected_type),
                    ..ScopeHints::default()
                });
            }
            let proposals = complete(&ws, &request);
            print_lines(&proposals, args.workspace.json)?;
            Ok(0)
        }
        Command::Select(args) => {
            let ws = open(&args.workspace.manifest)?;
            let request = SelectRequest::new(args.path, args.offset).with_length(args.length);
            let elements = code_select(&ws, &request);
            print_lines(&elements, args.workspace.json)?;
            Ok(0)
        }
        Command::Search(args) => {
            let ws = open(&args.workspace.manifest)?;
            let mut rule = config.search.match_rule();
            if let Some(mode) = args.mode {
                rule.mode = mode.into();
            }
            if args.ignore_case {
                rule.case_sensitive = false;
            }
            let pattern = SearchPattern::parse(
                &args.pattern,
                args.search_for.into(),
                args.limit_to.into(),
                rule,
            )
            .with_context(|| format!("invalid search pattern `{}`", args.pattern))?;
            let scope = if args.projects.is_empty() {
                SearchScope::Workspace
            } else {
                SearchScope::Projects(args.projects)
            };

            let mut matches: Vec<SearchMatch> = Vec::new();
            SearchEngine::new(&ws)
                .search(&pattern, &scope, &mut matches)
                .context("search failed")?;
            if args.workspace.json {
                let rows: Vec<MatchRow<'_>> = matches.iter().map(MatchRow::from).collect();
                print_json(&rows)?;
            } else {
                for found in &matches {
                    println!("{found}");
                }
            }
            Ok(0)
        }
        Command::Schema => Ok(0),
    }
}

fn load_config(explicit: Option<&Path>, manifest: &Path) -> Result<NovaConfig> {
    if let Some(path) = explicit {
        return NovaConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()));
    }
    let root = manifest
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let (config, _) = load_for_workspace(root)?;
    Ok(config)
}

fn open(manifest: &Path) -> Result<Workspace> {
    load_manifest(manifest).with_context(|| format!("failed to load workspace {}", manifest.display()))
}

#[derive(Serialize)]
struct MatchRow<'a> {
    path: &'a str,
    start: u32,
    end: u32,
    element: Option<&'a str>,
    snippet: &'a str,
    accuracy: String,
    is_declaration: bool,
}

impl<'a> From<&'a SearchMatch> for MatchRow<'a> {
    fn from(found: &'a SearchMatch) -> Self {
        Self {
            path: &found.path,
            start: found.range.start().into(),
            end: found.range.end().into(),
            element: found.element.as_deref(),
            snippet: &found.snippet,
            accuracy: found.accuracy.to_string(),
            is_declaration: found.is_declaration,
        }
    }
}

fn print_lines<T: Serialize + std::fmt::Display>(items: &[T], json: bool) -> Result<()> {
    if json {
        return print_json(items);
    }
    for item in items {
        println!("{item}");
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}
