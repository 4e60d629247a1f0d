use serde::Deserialize;
use serde::Serialize;

use crate::bridge::FailureKind;
use crate::bridge::SubscriptionResult;

pub const THANK_YOU: &str = "Thank you for subscribing!";
pub const INVALID_EMAIL: &str = "Please enter a valid email address.";
pub const TRY_AGAIN: &str = "We could not complete your subscription. Please try again later.";

/// How much of the bridge outcome a visitor gets to see
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePolicy {
    /// Every submission is thanked; failures only reach ops (via the fallback
    /// email and the log)
    #[default]
    AlwaysThank,
    /// Tell the visitor when their lead didn't go through. Provider details are
    /// still never shown.
    ReportFailures,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub success: bool,
    pub message: String,
}

/// `{"success": bool, "data": {"message": "..."}}`
impl Serialize for UserMessage {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        #[derive(Serialize)]
        struct Data<'a> {
            message: &'a str,
        }
        #[derive(Serialize)]
        struct Envelope<'a> {
            success: bool,
            data: Data<'a>,
        }
        Envelope {
            success: self.success,
            data: Data {
                message: &self.message,
            },
        }
        .serialize(serializer)
    }
}

impl UserMessage {
    fn new(
        success: bool,
        message: &str,
    ) -> Self {
        Self {
            success,
            message: message.to_string(),
        }
    }
}

pub fn to_user_response(
    result: &SubscriptionResult,
    policy: ResponsePolicy,
) -> UserMessage {
    match (policy, result) {
        (ResponsePolicy::AlwaysThank, _) | (_, Ok(_)) => UserMessage::new(true, THANK_YOU),
        (ResponsePolicy::ReportFailures, Err(e)) => match e.kind() {
            FailureKind::InvalidEmail => UserMessage::new(false, INVALID_EMAIL),
            FailureKind::ConfigMissing
            | FailureKind::TransportError
            | FailureKind::ProviderError => UserMessage::new(false, TRY_AGAIN),
        },
    }
}
