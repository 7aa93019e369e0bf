use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlackTrigger {
    Event(String),
    Command(String),
    Action(String),
    ViewSubmission(String),
    Unknown,
}

#[derive(Debug, Deserialize)]
pub struct SlackSlashCommandBody {
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
struct SlackBlockAction {
    action_id: String,
}

#[derive(Debug, Deserialize)]
struct SlackBlockActionPayload {
    actions: Vec<SlackBlockAction>,
}

#[derive(Debug, Deserialize)]
struct SlackInnerEvent {
    #[serde(rename = "type")]
    event_type: String,
}

#[derive(Debug, Deserialize)]
struct SlackEventCallback {
    event: SlackInnerEvent,
}

#[derive(Debug, Deserialize)]
struct SlackView {
    callback_id: String,
}

#[derive(Debug, Deserialize)]
struct SlackViewSubmissionPayload {
    view: SlackView,
}

impl From<&Value> for SlackTrigger {
    fn from(body: &Value) -> Self {
        let parse = |value: &Value| -> Option<SlackTrigger> {
            match value.get("type").and_then(Value::as_str) {
                Some("event_callback") => SlackEventCallback::deserialize(value)
                    .ok()
                    .map(|callback| SlackTrigger::Event(callback.event.event_type)),
                Some("block_actions") => SlackBlockActionPayload::deserialize(value)
                    .ok()
                    .and_then(|payload| payload.actions.into_iter().next())
                    .map(|action| SlackTrigger::Action(action.action_id)),
                Some("view_submission") => SlackViewSubmissionPayload::deserialize(value)
                    .ok()
                    .map(|payload| SlackTrigger::ViewSubmission(payload.view.callback_id)),
                Some(_) => None,
                None => SlackSlashCommandBody::deserialize(value)
                    .ok()
                    .map(|body| SlackTrigger::Command(body.command)),
            }
        };

        parse(body).unwrap_or(SlackTrigger::Unknown)
    }
}
