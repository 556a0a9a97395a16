use agmux_types::{AgentEvent, EventPriority};

/// Events at or above a priority floor, in original order
pub fn filter_by_priority(events: &[AgentEvent], floor: EventPriority) -> Vec<AgentEvent> {
    events
        .iter()
        .filter(|e| e.priority() >= floor)
        .cloned()
        .collect()
}

/// The default raw-event view: everything except verbose chatter
pub fn default_visible(events: &[AgentEvent]) -> Vec<AgentEvent> {
    filter_by_priority(events, EventPriority::Important)
}
