mod builder;
mod document;
mod highlight;
mod interlink;
mod markdown;
mod paths;
pub mod pipeline;
mod render;
mod site;
pub mod source;
mod watch;

pub use builder::Builder;
pub use site::BuildMode;
pub use watch::{ChangeKind, FileWatcher, PathClassifier, WatchEvent, WatchPaths};
