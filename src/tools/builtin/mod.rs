//! Built-in tools

mod files;
mod screen;
mod shell;

pub use files::FilesTool;
pub use screen::ScreenTool;
pub use shell::ShellTool;
