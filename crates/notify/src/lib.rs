//! Outbound notification delivery for roster changes.
//!
//! This crate renders and delivers the two notification surfaces:
//! - **Block Kit** (`blocks`) - minimal Slack message structures for
//!   incoming webhooks
//! - **Messages** (`messages`) - change and summary templates, plus the
//!   flat payloads the n8n workflow consumes
//! - **Webhook delivery** (`webhook`) - `WebhookNotifier`, the
//!   `ChangeNotifier` implementation backing commits
//!
//! Route selection (Slack vs n8n, summary channels) is decided by the
//! caller through `NotifyRoutes` and `SummaryChannel`; this crate only
//! knows how to render and post.

pub mod blocks;
pub mod messages;
pub mod webhook;

pub use blocks::{Block, MessageBuilder, MessageTemplate, TextObject};
pub use webhook::WebhookNotifier;
