//! Resume pagination — turns a resume document into fixed-size print pages.
//!
//! # Data flow
//! ```text
//! LayoutSnapshot ──► estimator ──────────────┐   (preview hint, Estimated)
//!        │                                   ▼
//!        └────────► measurer (layout pass) ► packer ◄─► splitter
//!                                            │
//!                                            ▼
//!                                   Pagination (Measured) ──► renderer
//! ```
//!
//! `markup` is the single description of what a section looks like; both the
//! measurer and the renderer consume it, so measured heights describe exactly
//! what gets printed.

pub mod content;
pub mod engine;
pub mod estimator;
pub mod font_metrics;
pub mod handlers;
pub mod markup;
pub mod measurer;
pub mod packer;
pub mod page_setup;
pub mod pipeline;
pub mod renderer;
pub mod session;
pub mod splitter;
