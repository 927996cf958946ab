// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event handlers for Decision Points (§3.3).

use super::MaterializedState;
use crate::event::Event;

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::DecisionCreated { decision } => {
            state.decisions.entry(decision.id.clone()).or_insert_with(|| (**decision).clone());
        }
        Event::DecisionResponded { id, responded_at, responded_by, selected_option, response_text, guidance } => {
            if let Some(decision) = state.decisions.get_mut(id) {
                decision.responded_at = Some(*responded_at);
                decision.responded_by = Some(responded_by.clone());
                decision.selected_option = selected_option.clone();
                decision.response_text = response_text.clone();
                decision.guidance = guidance.clone();
            }
        }
        Event::DecisionReminderSent { id, reminder_count } => {
            if let Some(decision) = state.decisions.get_mut(id) {
                decision.reminder_count = *reminder_count;
            }
        }
        _ => unreachable!("dispatched only decision-domain events"),
    }
}
