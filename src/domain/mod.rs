mod subscriber_email;
mod subscription_request;
// allow external `use` statements to skip `subscriber_email` etc
pub use subscriber_email::SubscriberEmail;
pub use subscription_request::Metadata;
pub use subscription_request::SubscriptionRequest;

/// Validation error for domain data
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("`{0}` is not a valid email address")]
    InvalidEmail(String),
}
