//! Prelude for convenient imports.
//!
//! ```rust
//! use trellis::prelude::*;
//!
//! let engine = Engine::new(MemoryFs::new().with_file("home.tpl", "{{ Title }}"), Options::new());
//! engine.load()?;
//! let page = engine.compile("home", "", &ctx().add("Title", "Hi"), &[])?;
//! assert_eq!(page, b"Hi");
//! # Ok::<(), trellis::Error>(())
//! ```

pub use crate::context::{ctx, Context};
pub use crate::error::{Error, Result};
pub use crate::file_loader::{DirFs, FileSystem, MemoryFs};
pub use crate::options::{EngineConfig, Options};
pub use crate::template::Engine;
