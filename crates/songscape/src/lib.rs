//! Navigation engine for a 2D map of song embeddings.
//!
//! Everything here is window- and GPU-free: the camera model, screen/world
//! mapping, the pointer state machine, hover resolution, proximity query
//! orchestration and the point payload format. The viewer crate drives a
//! [`session::MapSession`] from its event loop and renders what it reports.

pub mod camera;
pub mod candidate;
pub mod config;
pub mod coords;
pub mod events;
pub mod hover;
pub mod input;
pub mod points;
pub mod proximity;
pub mod session;
pub mod texture_cache;

pub use camera::Camera;
pub use candidate::{Candidate, CandidateId, CandidateSet, SongAttributes};
pub use config::SessionConfig;
pub use coords::Viewport;
pub use events::{ViewEvent, ViewportReadout};
pub use input::PointerInput;
pub use points::{DensityTier, PointBuffer, PointRecord};
pub use proximity::{QueryError, QueryRequest, QueryResponse};
pub use session::MapSession;
