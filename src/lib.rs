//! Capture a lead from a web form and forward it to Kit.com (ConvertKit),
//! falling back to an alert email when Kit can't be reached or refuses it.
//!
//! The interesting part is `bridge::SubscriptionBridge`; everything else is
//! the hosting layer around it.

pub mod bridge;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod notifier;
pub mod response;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod utils;
