// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bd: thin wire-protocol client over `beadsd`'s Unix socket.
//!
//! Not a specified subsystem on its own — every subcommand here is a
//! direct mapping onto one `bd-wire::Request` variant (§4.1, §4.2).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;

use std::collections::BTreeMap;

use bd_core::{
    DecisionId, DecisionOption, DecisionPoint, DependencyType, Issue, IssueId, IssueType, IssueUpdate, SpecRegistryState,
    Status,
};
use bd_wire::{Request, Response};
use clap::{Parser, Subcommand, ValueEnum};

use crate::client::DaemonClient;

#[derive(Parser)]
#[command(name = "bd", about = "beads work-tracking client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum IssueTypeArg {
    Task,
    Bug,
    Feature,
    Epic,
    Advice,
    Gate,
    Chore,
}

impl From<IssueTypeArg> for IssueType {
    fn from(value: IssueTypeArg) -> Self {
        match value {
            IssueTypeArg::Task => IssueType::Task,
            IssueTypeArg::Bug => IssueType::Bug,
            IssueTypeArg::Feature => IssueType::Feature,
            IssueTypeArg::Epic => IssueType::Epic,
            IssueTypeArg::Advice => IssueType::Advice,
            IssueTypeArg::Gate => IssueType::Gate,
            IssueTypeArg::Chore => IssueType::Chore,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check that the daemon is reachable.
    Health,
    /// Create an issue.
    Create {
        title: String,
        #[arg(long, value_enum, default_value = "task")]
        r#type: IssueTypeArg,
        #[arg(long, default_value_t = 3)]
        priority: u8,
        #[arg(long)]
        description: Option<String>,
    },
    /// Update an issue's title, type, priority, or description.
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_enum)]
        r#type: Option<IssueTypeArg>,
        #[arg(long)]
        priority: Option<u8>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show an issue by ID or unique prefix.
    Show { id: String },
    /// Resolve an ID token (full ID or unique prefix) to a canonical ID.
    ResolveId { token: String },
    /// Delete (tombstone or hard-delete) one or more issues.
    Delete { ids: Vec<String> },
    /// Close an issue.
    Close {
        id: String,
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        session: Option<String>,
    },
    /// Reopen a closed issue.
    Reopen { id: String },
    /// List issues, optionally filtered.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        issue_type: Option<String>,
        #[arg(long)]
        label: Option<String>,
    },
    /// List issues with no open blocking dependency.
    ReadyWork,
    /// Add a dependency edge between two issues.
    AddDependency {
        issue_id: String,
        depends_on_id: String,
        #[arg(long = "type", default_value = "blocks")]
        dep_type: String,
    },
    /// Remove a dependency edge between two issues.
    RemoveDependency {
        issue_id: String,
        depends_on_id: String,
        #[arg(long = "type", default_value = "blocks")]
        dep_type: String,
    },
    /// List what an issue depends on.
    Dependencies { id: String },
    /// List what depends on an issue.
    Dependents { id: String },
    /// List what depends on an issue, with the dependency edge alongside each.
    DependentsWithMetadata { id: String },
    /// Add a label to an issue.
    AddLabel { id: String, label: String },
    /// Remove a label from an issue.
    RemoveLabel { id: String, label: String },
    /// Add a comment to an issue.
    Comment { id: String, author: String, body: String },
    /// Pour a molecule template into a concrete issue tree.
    Pour {
        template_id: String,
        #[arg(long = "bind", value_parser = parse_binding)]
        bindings: Vec<(String, String)>,
    },
    /// Create a decision point on a gate issue.
    DecisionCreate {
        issue_id: String,
        prompt: String,
        requested_by: String,
        #[arg(long = "option", value_parser = parse_option, required = true)]
        options: Vec<DecisionOption>,
        #[arg(long)]
        context: Option<String>,
        #[arg(long)]
        default_option: Option<String>,
        #[arg(long, default_value_t = 3)]
        max_iterations: u32,
        #[arg(long)]
        guidance: Option<String>,
    },
    /// List decision points.
    DecisionList,
    /// Show a decision point.
    DecisionGet { id: String },
    /// Resolve a decision point.
    DecisionResolve {
        id: String,
        responded_by: String,
        #[arg(long)]
        selected_option: Option<String>,
        #[arg(long)]
        response_text: Option<String>,
        #[arg(long)]
        guidance: Option<String>,
    },

    /// Record that a spec file was scanned and produced a fingerprint.
    RecordScanEvent { spec_id: String, fingerprint: String },
    /// List recorded spec-scan events.
    ListScanEvents,
    /// Create or refresh a spec's registry entry.
    UpsertSpecRegistry {
        spec_id: String,
        fingerprint: String,
        #[arg(long, default_value = "active")]
        state: String,
    },
    /// List the spec registry.
    ListSpecRegistry,
}

fn parse_binding(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    Ok((key.to_string(), value.to_string()))
}

fn parse_option(s: &str) -> Result<DecisionOption, String> {
    let parts: Vec<&str> = s.splitn(3, ':').collect();
    let [id, short, label] = parts.as_slice() else {
        return Err(format!("expected id:short:label, got {s:?}"));
    };
    Ok(DecisionOption { id: id.to_string(), short: short.to_string(), label: label.to_string(), description: None })
}

fn parse_dep_type(s: &str) -> Result<DependencyType, anyhow::Error> {
    Ok(serde_json::from_value(serde_json::Value::String(s.to_string()))?)
}

fn parse_spec_state(s: &str) -> Result<SpecRegistryState, anyhow::Error> {
    Ok(serde_json::from_value(serde_json::Value::String(s.to_string()))?)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let client = DaemonClient::connect(client::socket_path()?)?;

    let request = build_request(cli.command)?;
    let response = client.send(&request).await?;
    print_response(&response);

    if let Response::Error { .. } = response {
        std::process::exit(1);
    }
    Ok(())
}

fn build_request(command: Command) -> Result<Request, anyhow::Error> {
    Ok(match command {
        Command::Health => Request::Health,
        Command::Create { title, r#type, priority, description } => {
            let issue = Issue {
                id: IssueId::new(),
                title,
                description,
                design: None,
                acceptance_criteria: None,
                notes: None,
                issue_type: r#type.into(),
                status: Status::Open,
                priority,
                assignee: None,
                created_at: 0,
                updated_at: 0,
                closed_at: None,
                close_reason: None,
                closed_by_session: None,
                spec_id: None,
                external_ref: None,
                source_system: None,
                estimated_minutes: 0,
                pinned: false,
                is_template: false,
                ephemeral: false,
                quality_score: None,
                due_at: None,
                defer_until: None,
                content_hash: None,
                labels: Vec::new(),
                hook_command: None,
                hook_trigger: None,
                hook_timeout_secs: None,
                hook_on_failure: None,
                extra: Default::default(),
            };
            Request::Create { issue: Box::new(issue) }
        }
        Command::Update { id, title, r#type, priority, description } => Request::Update {
            id,
            update: Box::new(IssueUpdate {
                title,
                issue_type: r#type.map(Into::into),
                priority,
                description: description.map(Some),
                ..Default::default()
            }),
        },
        Command::Show { id } => Request::Show { id },
        Command::ResolveId { token } => Request::ResolveId { token },
        Command::Delete { ids } => Request::Delete { ids },
        Command::Close { id, reason, session } => Request::CloseIssue { id, reason, closed_by_session: session },
        Command::Reopen { id } => Request::ReopenIssue { id },
        Command::List { status, issue_type, label } => Request::List { status, issue_type, label },
        Command::ReadyWork => Request::ReadyWork,
        Command::AddDependency { issue_id, depends_on_id, dep_type } => {
            Request::AddDependency { issue_id, depends_on_id, dep_type: parse_dep_type(&dep_type)? }
        }
        Command::RemoveDependency { issue_id, depends_on_id, dep_type } => {
            Request::RemoveDependency { issue_id, depends_on_id, dep_type: parse_dep_type(&dep_type)? }
        }
        Command::Dependencies { id } => Request::GetDependencies { id },
        Command::Dependents { id } => Request::GetDependents { id },
        Command::DependentsWithMetadata { id } => Request::GetDependentsWithMetadata { id },
        Command::AddLabel { id, label } => Request::AddLabel { id, label },
        Command::RemoveLabel { id, label } => Request::RemoveLabel { id, label },
        Command::Comment { id, author, body } => Request::AddComment { id, author, body },
        Command::Pour { template_id, bindings } => {
            Request::Pour { template_id, bindings: bindings.into_iter().collect::<BTreeMap<_, _>>() }
        }
        Command::DecisionCreate { issue_id, prompt, requested_by, options, context, default_option, max_iterations, guidance } => {
            let decision = DecisionPoint {
                id: DecisionId::new(),
                issue_id: IssueId::from_string(issue_id),
                prompt,
                context,
                options,
                default_option,
                iteration: 0,
                max_iterations,
                prior_iteration_id: None,
                guidance,
                requested_by,
                responded_at: None,
                responded_by: None,
                selected_option: None,
                response_text: None,
                reminder_count: 0,
                urgency: None,
                created_at: 0,
            };
            Request::DecisionCreate { decision: Box::new(decision) }
        }
        Command::DecisionList => Request::DecisionList,
        Command::DecisionGet { id } => Request::DecisionGet { id },
        Command::DecisionResolve { id, responded_by, selected_option, response_text, guidance } => {
            Request::DecisionResolve { id, responded_by, selected_option, response_text, guidance }
        }
        Command::RecordScanEvent { spec_id, fingerprint } => Request::RecordScanEvent { spec_id, fingerprint },
        Command::ListScanEvents => Request::ListScanEvents,
        Command::UpsertSpecRegistry { spec_id, fingerprint, state } => {
            Request::UpsertSpecRegistry { spec_id, fingerprint, state: parse_spec_state(&state)? }
        }
        Command::ListSpecRegistry => Request::ListSpecRegistry,
    })
}

fn print_response(response: &Response) {
    match serde_json::to_string_pretty(response) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to format response: {e}"),
    }
}
