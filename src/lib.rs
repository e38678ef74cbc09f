//! # Bursar
//!
//! A multi-user budget manager server, usable both as a standalone binary
//! and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! bursar = "0.1"
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use bursar::server::{AppState, create_router};
//! use bursar::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/bursar.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
