//! Pipeline components for resume-to-internship matching.
//!
//! Each submodule implements exactly one step. Keeping them separate makes
//! each independently testable and lets callers swap the collaborators
//! (extractor, agent, opportunity source) without touching the core.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ gate ──▶ normalize ──▶ agent (retry) ──▶ parse
//!  (path/text) (limits)  (chunks)     (LLM stages)     (records)
//!                                          │
//!                                          ▼ transient failure / empty parse
//!                                 keywords ──▶ recommend ──▶ parse::format
//! ```
//!
//! 1. [`gate`]      — size, page-count and emptiness checks; uses [`extract`]
//!    to read the document
//! 2. [`normalize`] — fixed-size chunking and per-chunk cleanup
//! 3. [`agent`]     — the LLM stage collaborator; [`retry`] wraps every call
//! 4. [`parse`]     — numbered-list parser and its inverse formatter
//! 5. [`keywords`] + [`recommend`] — the deterministic local fallback

pub mod agent;
pub mod extract;
pub mod gate;
pub mod keywords;
pub mod normalize;
pub mod parse;
pub mod recommend;
pub mod retry;
