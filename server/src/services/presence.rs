//! AFK status and last-deleted-message tracking.

use chrono::Utc;

use crate::models::context::CallerContext;
use crate::models::presence::{
    AfkAlert, AfkStatus, DeletedMessageEvent, MessageEvent, PresenceEvents, SnipedMessage,
};
use crate::state::AppState;
use crate::validation;

const DEFAULT_AFK_REASON: &str = "AFK";

pub fn set_afk(state: &AppState, ctx: &CallerContext, reason: Option<&str>) -> AfkStatus {
    let reason = match reason.map(str::trim) {
        Some(r) if !r.is_empty() => validation::validate_reason(Some(r)),
        _ => DEFAULT_AFK_REASON.to_string(),
    };
    let status = AfkStatus {
        reason,
        since: Utc::now(),
    };
    state.afk.put(ctx.issuer_id.clone(), status.clone());
    status
}

/// Alerts for mentioned AFK users, and clears the author's own AFK status.
pub fn on_message(state: &AppState, event: &MessageEvent) -> PresenceEvents {
    if event.author_is_bot {
        return PresenceEvents::default();
    }
    let now = Utc::now();
    let mut events = PresenceEvents::default();

    for user_id in &event.mentions {
        if let Some(status) = state.afk.get(user_id) {
            events.alerts.push(AfkAlert {
                user_id: user_id.clone(),
                reason: status.reason,
                away_secs: (now - status.since).num_seconds().max(0),
            });
        }
    }
    events.welcomed_back = state.afk.take(&event.context.issuer_id).is_some();
    events
}

pub fn on_message_deleted(state: &AppState, event: DeletedMessageEvent) {
    if event.author_is_bot {
        return;
    }
    state.snipes.put(
        event.channel_id,
        SnipedMessage {
            author_id: event.author_id,
            content: event.content,
            created_at: event.created_at,
        },
    );
}

pub fn snipe(state: &AppState, channel_id: &str) -> Option<SnipedMessage> {
    state.snipes.get(&channel_id.to_string())
}
