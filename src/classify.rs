//! Frame classification into domain events.
//!
//! A validated [`Frame`] names its application event in the reserved
//! `:event-type` header and carries a JSON payload. Classification is a
//! closed match over that string tag with an explicit [`Unrecognized`]
//! fallback arm, so upstream protocol additions degrade gracefully instead
//! of failing the stream. Only a payload that fails to decode for an event
//! type we do recognise is an error, and that error is scoped to the single
//! event.
//!
//! [`Unrecognized`]: DomainEvent::Unrecognized

use serde::Deserialize;
use thiserror::Error;

use crate::frame::Frame;

/// `:event-type` announcing the conversation identifier.
const INITIAL_RESPONSE: &str = "initial-response";
/// `:event-type` carrying one assistant text delta.
const ASSISTANT_RESPONSE_EVENT: &str = "assistantResponseEvent";
/// `:event-type` carrying tool invocation progress.
const TOOL_USE_EVENT: &str = "toolUseEvent";
/// `:message-type` values marking upstream failure frames.
const EXCEPTION_MESSAGE_TYPES: [&str; 2] = ["exception", "error"];

/// Application-level event derived from one validated frame.
///
/// Events are immutable and owned by the consumer from the moment they are
/// produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomainEvent {
    /// The upstream accepted the request and opened a conversation.
    ConversationStarted {
        /// Identifier assigned by the upstream backend.
        conversation_id: String,
    },
    /// One fragment of assistant response text.
    AssistantTextDelta {
        /// Text fragment; concatenating deltas yields the full response.
        text: String,
    },
    /// The assistant began invoking a tool.
    ToolUseStart {
        /// Identifier correlating the start, delta, and end events.
        tool_use_id: String,
        /// Name of the tool being invoked.
        name: String,
    },
    /// One fragment of streamed tool input.
    ToolUseDelta {
        /// Identifier correlating the start, delta, and end events.
        tool_use_id: String,
        /// Input fragment for the tool invocation.
        input: String,
    },
    /// The tool invocation finished streaming.
    ToolUseEnd {
        /// Identifier correlating the start, delta, and end events.
        tool_use_id: String,
    },
    /// The upstream reported a failure frame.
    UpstreamError {
        /// Human-readable failure description from the upstream.
        message: String,
    },
    /// The frame decoded cleanly but names an event we do not know.
    Unrecognized {
        /// The raw frame, preserved for diagnostics.
        frame: Frame,
    },
}

/// Classification failure scoped to a single event.
///
/// Never fatal to the stream: decoding continues with the next frame.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// A recognised event type carried a payload that is not valid JSON of
    /// the expected shape.
    #[error("malformed {event_type:?} payload: {source}")]
    PayloadDecode {
        /// The `:event-type` whose payload failed to decode.
        event_type: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitialResponsePayload {
    conversation_id: String,
}

#[derive(Deserialize)]
struct AssistantResponsePayload {
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolUsePayload {
    tool_use_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    stop: Option<bool>,
}

#[derive(Deserialize)]
struct ExceptionPayload {
    message: String,
}

fn decode_payload<T>(frame: &Frame, event_type: &str) -> Result<T, ClassifyError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_slice(frame.payload()).map_err(|source| ClassifyError::PayloadDecode {
        event_type: event_type.to_owned(),
        source,
    })
}

fn is_exception(frame: &Frame) -> bool {
    frame
        .message_type()
        .is_some_and(|ty| EXCEPTION_MESSAGE_TYPES.contains(&ty))
}

/// Exception frames always surface as [`DomainEvent::UpstreamError`]; a
/// body that fails JSON decoding degrades to its raw text rather than
/// masking the upstream failure behind a decode error.
fn classify_exception(frame: &Frame) -> DomainEvent {
    let message = match serde_json::from_slice::<ExceptionPayload>(frame.payload()) {
        Ok(payload) => payload.message,
        Err(_) => String::from_utf8_lossy(frame.payload()).into_owned(),
    };
    DomainEvent::UpstreamError { message }
}

/// Tool progress arrives under a single event name; the payload's fields
/// determine the stage.
fn classify_tool_use(payload: ToolUsePayload) -> DomainEvent {
    if payload.stop.unwrap_or(false) {
        return DomainEvent::ToolUseEnd {
            tool_use_id: payload.tool_use_id,
        };
    }
    if let Some(input) = payload.input.filter(|input| !input.is_empty()) {
        return DomainEvent::ToolUseDelta {
            tool_use_id: payload.tool_use_id,
            input,
        };
    }
    DomainEvent::ToolUseStart {
        tool_use_id: payload.tool_use_id,
        name: payload.name,
    }
}

/// Classify one decoded frame into a [`DomainEvent`].
///
/// Lookup of the reserved headers is case-sensitive. Unknown event types
/// yield [`DomainEvent::Unrecognized`], never an error, so the stream
/// survives upstream protocol additions.
///
/// # Errors
///
/// Returns [`ClassifyError::PayloadDecode`] when a recognised event type
/// carries a malformed JSON payload. The error is scoped to this frame;
/// callers keep consuming the stream.
pub fn classify_frame(frame: Frame) -> Result<DomainEvent, ClassifyError> {
    if is_exception(&frame) {
        return Ok(classify_exception(&frame));
    }

    let Some(event_type) = frame.event_type().map(str::to_owned) else {
        tracing::warn!("frame carries no :event-type header");
        return Ok(DomainEvent::Unrecognized { frame });
    };

    match event_type.as_str() {
        INITIAL_RESPONSE => {
            let payload: InitialResponsePayload = decode_payload(&frame, &event_type)?;
            Ok(DomainEvent::ConversationStarted {
                conversation_id: payload.conversation_id,
            })
        }
        ASSISTANT_RESPONSE_EVENT => {
            let payload: AssistantResponsePayload = decode_payload(&frame, &event_type)?;
            Ok(DomainEvent::AssistantTextDelta {
                text: payload.content,
            })
        }
        TOOL_USE_EVENT => {
            let payload: ToolUsePayload = decode_payload(&frame, &event_type)?;
            Ok(classify_tool_use(payload))
        }
        _ => {
            tracing::warn!(event_type = %event_type, "unrecognised event type");
            Ok(DomainEvent::Unrecognized { frame })
        }
    }
}
