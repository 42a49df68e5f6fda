// Python adapters: uv and poetry manage their own environments, the pip
// adapter owns a project-local venv/
// All three share the run dispatch in run_mode

mod pip;
mod poetry;
pub mod run_mode;
mod uv;

pub use pip::Pip;
pub use poetry::Poetry;
pub use run_mode::{asgi_target, detect_run_mode, sniff_source, RunMode};
pub use uv::Uv;
