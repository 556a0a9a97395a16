use agmux_providers::Normalizer;
use agmux_store::EventStore;
use agmux_types::{AgentEvent, AgentStatus, EventPayload};
use chrono::Utc;
use serde_json::Value;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Child;

use crate::manager::SharedAgent;

/// Cap on a single stdout line; anything longer is truncated
pub(crate) const MAX_LINE_BYTES: usize = 1024 * 1024;

/// One summarizing error event per this many unparseable lines
const DROP_REPORT_INTERVAL: u64 = 25;

const READ_BUFFER: usize = 64 * 1024;

/// One line from the child's stdout, possibly truncated at the cap
struct TailLine {
    text: String,
    truncated: bool,
}

/// Per-agent stdout pump: line-split, parse, normalize, append, and finally
/// drive the terminal status transition
///
/// The tailer is the single producer for the agent's event log and the only
/// writer of its in-memory record while the child lives. It always reaps the
/// child and fires the exit notification, whatever happens on the way.
pub(crate) async fn run_tailer(
    store: Arc<EventStore>,
    slot: SharedAgent,
    mut child: Child,
    mut normalizer: Box<dyn Normalizer>,
) {
    let (agent_id, kind, started_at) = {
        let state = slot.state.lock().unwrap();
        (
            state.record.agent_id.clone(),
            state.record.kind,
            state.record.started_at,
        )
    };

    let mut seen_result = false;
    let mut dropped: u64 = 0;
    let mut disk_failed = false;

    if let Some(stdout) = child.stdout.take() {
        let mut reader = BufReader::with_capacity(READ_BUFFER, stdout);
        loop {
            let line = match read_line_capped(&mut reader, MAX_LINE_BYTES).await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(%agent_id, %err, "stdout read failed");
                    let _ = store.append_event(
                        &agent_id,
                        &AgentEvent::now(
                            kind,
                            EventPayload::Error {
                                message: format!("output stream read failed: {}", err),
                            },
                        ),
                    );
                    break;
                }
            };

            if line.truncated {
                let _ = store.append_event(
                    &agent_id,
                    &AgentEvent::now(
                        kind,
                        EventPayload::Error {
                            message: format!(
                                "output line exceeded {} bytes and was truncated",
                                MAX_LINE_BYTES
                            ),
                        },
                    ),
                );
                let _ = store.append_event(
                    &agent_id,
                    &AgentEvent::now(
                        kind,
                        EventPayload::Unknown {
                            raw: Value::String(line.text),
                        },
                    ),
                );
                continue;
            }

            let trimmed = line.text.trim();
            if trimmed.is_empty() {
                continue;
            }

            let raw: Value = match serde_json::from_str(trimmed) {
                Ok(raw) => raw,
                Err(_) => {
                    dropped += 1;
                    if dropped % DROP_REPORT_INTERVAL == 1 {
                        let _ = store.append_event(
                            &agent_id,
                            &AgentEvent::now(
                                kind,
                                EventPayload::Error {
                                    message: format!(
                                        "dropped {} unparseable output line(s)",
                                        dropped
                                    ),
                                },
                            ),
                        );
                    }
                    continue;
                }
            };

            for event in normalizer.normalize(&raw) {
                intercept(&store, &slot, &event, &mut seen_result);
                if let Err(err) = store.append_event(&agent_id, &event) {
                    tracing::error!(%agent_id, %err, "event append failed; failing agent");
                    let _ = store.append_event(
                        &agent_id,
                        &AgentEvent::now(
                            kind,
                            EventPayload::Error {
                                message: format!("event log write failed: {}", err),
                            },
                        ),
                    );
                    disk_failed = true;
                    break;
                }
            }
            if disk_failed {
                break;
            }
        }
    }

    let exit_status = child.wait().await;
    let now = Utc::now();

    let (stop_requested, already_terminal) = {
        let state = slot.state.lock().unwrap();
        (state.stop_requested, state.record.status.is_terminal())
    };
    let final_status = if disk_failed {
        AgentStatus::Failed
    } else if stop_requested {
        AgentStatus::Stopped
    } else {
        match &exit_status {
            Ok(status) if status.success() => AgentStatus::Completed,
            _ => AgentStatus::Failed,
        }
    };

    // A force-stop may have finalized the record already; in that case its
    // synthetic result is on disk and another one would violate the
    // one-result-per-log shape.
    if !seen_result && !already_terminal {
        let status_str = match final_status {
            AgentStatus::Completed => "success",
            AgentStatus::Stopped => "stopped",
            _ => "error",
        };
        let duration_ms = (now - started_at).num_milliseconds().max(0) as u64;
        let _ = store.append_event(
            &agent_id,
            &AgentEvent::now(
                kind,
                EventPayload::Result {
                    status: status_str.to_string(),
                    duration_ms: Some(duration_ms),
                    usage: None,
                },
            ),
        );
    }

    let (transitioned, record) = {
        let mut state = slot.state.lock().unwrap();
        let applied = state.record.mark_terminal(final_status, now);
        (applied, state.record.clone())
    };
    if transitioned {
        if let Err(err) = store.write_meta(&record) {
            tracing::error!(%agent_id, %err, "terminal meta write failed");
        }
    }

    tracing::info!(%agent_id, status = %record.status, "agent finished");
    slot.exit.notify_waiters();
}

/// Side effects of specific canonical events on the agent record
fn intercept(store: &EventStore, slot: &SharedAgent, event: &AgentEvent, seen_result: &mut bool) {
    match &event.payload {
        EventPayload::Init {
            session_id: Some(session_id),
            ..
        } => {
            let record = {
                let mut state = slot.state.lock().unwrap();
                if state.record.session_id.is_none() {
                    state.record.session_id = Some(session_id.clone());
                    Some(state.record.clone())
                } else {
                    None
                }
            };
            if let Some(record) = record {
                let _ = store.write_meta(&record);
            }
        }
        EventPayload::Result { .. } => {
            *seen_result = true;
        }
        _ => {}
    }
}

/// Read one newline-terminated line, capping retained bytes
///
/// Bytes past the cap are consumed from the pipe but not kept, so one
/// pathological line cannot wedge the reader or balloon memory.
async fn read_line_capped<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max: usize,
) -> io::Result<Option<TailLine>> {
    let mut buf: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut saw_bytes = false;

    loop {
        let (consumed, complete) = {
            let chunk = reader.fill_buf().await?;
            if chunk.is_empty() {
                // EOF: emit what we have, or signal end-of-stream
                if !saw_bytes {
                    return Ok(None);
                }
                break;
            }
            saw_bytes = true;
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    append_capped(&mut buf, &chunk[..pos], max, &mut truncated);
                    (pos + 1, true)
                }
                None => {
                    append_capped(&mut buf, chunk, max, &mut truncated);
                    (chunk.len(), false)
                }
            }
        };
        reader.consume(consumed);
        if complete {
            break;
        }
    }

    Ok(Some(TailLine {
        text: String::from_utf8_lossy(&buf).into_owned(),
        truncated,
    }))
}

fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], max: usize, truncated: &mut bool) {
    let room = max.saturating_sub(buf.len());
    if chunk.len() > room {
        buf.extend_from_slice(&chunk[..room]);
        *truncated = true;
    } else {
        buf.extend_from_slice(chunk);
    }
}
