mod request;
mod restore;
mod upscale;

pub use request::{RestoreRequest, StageKind, StageRequest, UpscaleRequest};
pub use restore::RestoreRunner;
pub use upscale::{default_tool_path, UpscaleRunner};
