pub mod codec;
pub mod color;
pub mod commands;
pub mod history;
pub mod id;
pub mod launch;
pub mod layers;
pub mod library;
pub mod session;
pub mod store;
pub mod stroke;
pub mod tool;
pub mod util;

pub use library::Library;
pub use session::Session;
