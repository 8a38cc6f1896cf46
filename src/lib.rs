// ABOUTME: Library module for the hyperslide program.
// ABOUTME: Contains slide rendering, live-session coordination, serving and export.

// Reexport modules
pub mod attributes;
pub mod config;
pub mod errors;
pub mod export;
pub mod hub;
pub mod init;
pub mod layout;
pub mod message;
pub mod pages;
pub mod render;
pub mod resources;
pub mod server;
pub mod splitter;
pub mod sync;
pub mod transform;
pub mod utils;
pub mod votes;
pub mod watch;

// Reexport common types and functions
pub use attributes::{Attributes, FrontMatter};
pub use config::Config;
pub use errors::{Result, SlideError};
pub use export::{export_presentation, ExportSummary};
pub use hub::{ConnectionId, PushSink, Registration, SessionHub};
pub use init::init_project;
pub use layout::{LayoutRegistry, LayoutSource, ResolvedLayout};
pub use message::{ControlAction, PushMessage};
pub use render::{Presentation, Slide, SlideRenderer, Transition};
pub use resources::ResourceFile;
pub use server::{AppState, ServerHandle, SlideServer};
pub use sync::{SyncCoordinator, SyncPhase};
pub use transform::TransformPipeline;
pub use votes::VoteBook;
pub use watch::{ChangeEvent, ChangeKind, ChangeWatcher, WatchHandle};
