pub mod inflight;
pub mod lists;
pub mod metadata;
pub mod ranking;
pub mod recommendations;
pub mod snapshot;
pub mod tmdb;

pub use inflight::{InFlight, RequestKind};
pub use lists::ListManager;
pub use metadata::MetadataProvider;
pub use ranking::{MoveDirection, RankEdit, RankedList};
pub use recommendations::{AiReply, GeminiRecommender, Recommender};
pub use snapshot::{Snapshot, SnapshotRenderer, SvgSnapshotRenderer};
pub use tmdb::TmdbProvider;
