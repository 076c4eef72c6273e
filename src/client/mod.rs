//! Client side: the search pipeline and the gateway it drives.

pub mod gateway;
pub mod orchestrator;
pub mod view;

pub use gateway::{Gateway, HttpGateway};
pub use orchestrator::{GameReport, Orchestrator, PipelineState, Rejected, Stage};
pub use view::ReviewEntry;
