//! 即时代码搜索：把连续的按键变成有序、可取消的搜索请求，
//! 只展示最新一次请求的结果，并提供键盘导航和匹配高亮。

pub mod cli;
pub mod client;
pub mod config;
pub mod cursor;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod gui;
pub mod highlight;
pub mod navigator;
pub mod results;
pub mod sequencer;
pub mod surface;
pub mod types;
pub mod visibility;

pub use client::{HttpSearchClient, SearchService};
pub use config::EngineConfig;
pub use engine::{Completion, Effect, Engine, EngineSnapshot, Key, KeyOutcome, PointerTarget};
pub use error::SearchError;
pub use surface::{SearchSurface, SurfaceHandle};
pub use visibility::Phase;
