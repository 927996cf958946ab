// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates wire `Request`s into `StorageAdapter` calls and wire
//! `Response`s (§4.1, §4.2).

use std::sync::Arc;

use bd_core::CoreResult;
use bd_storage::StorageAdapter;
use bd_wire::{Request, Response};

use crate::env::PROTOCOL_VERSION;
use crate::flush::Debouncer;

/// Requests that mutate the store and must coalesce into the next
/// debounced flush (§4.5).
fn is_mutating(request: &Request) -> bool {
    !matches!(
        request,
        Request::Hello { .. }
            | Request::Health
            | Request::Show { .. }
            | Request::ResolveId { .. }
            | Request::List { .. }
            | Request::ReadyWork
            | Request::GetDependencies { .. }
            | Request::GetDependents { .. }
            | Request::GetDependentsWithMetadata { .. }
            | Request::DecisionList
            | Request::DecisionGet { .. }
            | Request::ListScanEvents
            | Request::ListSpecRegistry
    )
}

/// Dispatch one request. Every `CoreError` is converted to
/// `Response::Error` carrying its stable §6.5 tag; this function never
/// fails.
pub async fn dispatch(adapter: &Arc<dyn StorageAdapter>, flush: &Debouncer, request: Request) -> Response {
    let mutating = is_mutating(&request);
    let response = match handle(adapter, request).await {
        Ok(response) => response,
        Err(e) => Response::from_error(&e),
    };
    if mutating && !matches!(response, Response::Error { .. }) {
        flush.trigger();
    }
    response
}

async fn handle(adapter: &Arc<dyn StorageAdapter>, request: Request) -> CoreResult<Response> {
    Ok(match request {
        Request::Hello { .. } => Response::Hello { version: PROTOCOL_VERSION.to_string() },
        Request::Health => Response::Ok,

        Request::Create { issue } => Response::Issue { issue: Box::new(adapter.create_issue(*issue).await?) },
        Request::Update { id, update } => Response::Issue { issue: Box::new(adapter.update_issue(&id, *update).await?) },
        Request::UpdateWithComment { id, update, author, comment } => {
            adapter.update_issue(&id, *update).await?;
            adapter.add_comment(&id, author, comment).await?;
            Response::Issue { issue: Box::new(adapter.get_issue(&id).await?) }
        }
        Request::Show { id } => Response::Issue { issue: Box::new(adapter.get_issue(&id).await?) },
        Request::ResolveId { token } => Response::ResolvedId { id: adapter.resolve_issue_id(&token).await?.as_str().to_string() },
        Request::Delete { ids } => {
            let deleted = adapter.delete_issues(&ids).await?;
            Response::Deleted { ids: deleted.into_iter().map(|id| id.as_str().to_string()).collect() }
        }
        Request::CloseIssue { id, reason, closed_by_session } => {
            Response::Issue { issue: Box::new(adapter.close_issue(&id, reason, closed_by_session).await?) }
        }
        Request::ReopenIssue { id } => Response::Issue { issue: Box::new(adapter.reopen_issue(&id).await?) },

        Request::List { status, issue_type, label } => {
            let mut issues = adapter.list_issues().await?;
            if let Some(status) = status {
                issues.retain(|i| i.status.to_string() == status);
            }
            if let Some(issue_type) = issue_type {
                issues.retain(|i| i.issue_type.to_string() == issue_type);
            }
            if let Some(label) = label {
                issues.retain(|i| i.labels.iter().any(|l| *l == label));
            }
            Response::Issues { issues }
        }
        Request::ReadyWork => Response::Issues { issues: adapter.ready_work().await? },

        Request::AddDependency { issue_id, depends_on_id, dep_type } => {
            Response::Dependency { dependency: Box::new(adapter.add_dependency(&issue_id, &depends_on_id, dep_type).await?) }
        }
        Request::RemoveDependency { issue_id, depends_on_id, dep_type } => {
            adapter.remove_dependency(&issue_id, &depends_on_id, dep_type).await?;
            Response::Ok
        }
        Request::GetDependencies { id } => Response::Dependencies { dependencies: adapter.get_dependencies(&id).await? },
        Request::GetDependents { id } => Response::Dependencies { dependencies: adapter.get_dependents(&id).await? },
        Request::GetDependentsWithMetadata { id } => {
            Response::DependentsWithMetadata { dependents: adapter.get_dependents_with_metadata(&id).await? }
        }

        Request::AddLabel { id, label } => Response::Issue { issue: Box::new(adapter.add_label(&id, label).await?) },
        Request::RemoveLabel { id, label } => Response::Issue { issue: Box::new(adapter.remove_label(&id, label).await?) },

        Request::AddComment { id, author, body } => Response::Comment { comment: Box::new(adapter.add_comment(&id, author, body).await?) },

        Request::Pour { template_id, bindings } => {
            Response::Issue { issue: Box::new(adapter.pour_molecule(&template_id, bindings.into_iter().collect()).await?) }
        }

        Request::DecisionCreate { decision } => Response::Decision { decision: Box::new(adapter.create_decision(*decision).await?) },
        Request::DecisionList => Response::Decisions { decisions: adapter.list_decisions().await? },
        Request::DecisionGet { id } => Response::Decision { decision: Box::new(adapter.get_decision(&id).await?) },
        Request::DecisionResolve { id, responded_by, selected_option, response_text, guidance } => Response::Decision {
            decision: Box::new(adapter.resolve_decision(&id, responded_by, selected_option, response_text, guidance).await?),
        },

        Request::RecordScanEvent { spec_id, fingerprint } => {
            Response::ScanEvent { event: Box::new(adapter.record_scan_event(spec_id, fingerprint).await?) }
        }
        Request::ListScanEvents => Response::ScanEvents { events: adapter.list_scan_events().await? },
        Request::UpsertSpecRegistry { spec_id, fingerprint, state } => {
            Response::SpecRegistryEntry { entry: Box::new(adapter.upsert_spec_registry(spec_id, fingerprint, state).await?) }
        }
        Request::ListSpecRegistry => Response::SpecRegistryEntries { entries: adapter.list_spec_registry().await? },
    })
}
