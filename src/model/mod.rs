//! Data model (spec §3). Entities carry opaque UUIDs; timestamps are UTC.
//!
//! The relational store itself is out of scope — these are plain structs the
//! `Persister` trait operates on, not an ORM. Invariants are documented on
//! each field and enforced at the boundaries this crate owns (the
//! `Persister` implementation and the `LinkGraphExpander`).

mod domain;
mod expression;
mod job;
mod land;
mod link;
mod media;
mod paragraph;
mod word;

pub use domain::Domain;
pub use expression::{Expression, ExpressionPatch, SentimentLabel};
pub use job::{CrawlJobParams, Job, JobCounters, JobKind, JobStatus};
pub use land::Land;
pub use link::{ExpressionLink, LinkType};
pub use media::{Media, MediaKind};
pub use paragraph::Paragraph;
pub use word::{LandDictionary, Word};
