pub mod api;
pub mod bot;
pub mod config;
pub mod library;
pub mod logging;
pub mod lookup;

pub use api::{DanmakuApi, DanmakuClient};
pub use bot::{Flow, Reply, SessionStore};
pub use config::AppConfig;
pub use library::LibraryCache;
pub use lookup::LookupManager;
