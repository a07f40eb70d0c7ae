//! # course-market: Command Layer for the Course Market
//!
//! One async function per marketplace operation. The web front door
//! (routing, sessions, uploads) lives outside this workspace: it resolves the
//! caller to an [`Actor`](course_core::Actor), decodes arguments into
//! `Option<...>` values, calls a command and serializes the result.
//!
//! ## Startup
//! ```rust,ignore
//! use course_market::{MarketConfig, MarketState};
//!
//! let config = MarketConfig::load()?;
//! let state = MarketState::open(config).await?;
//!
//! let placed = course_market::commands::place_order(&state, actor, Some(vec![3, 5])).await?;
//! course_market::commands::pay_order(&state, Some(placed.order_id)).await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`commands`] - Order, cart, course and account operations
//! - [`config`] - Environment configuration
//! - [`error`] - `ApiError` and status codes
//! - [`state`] - Shared database handle

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use config::{ConfigError, MarketConfig};
pub use error::{ApiError, ApiResponse, ApiResult, ErrorCode};
pub use state::MarketState;
