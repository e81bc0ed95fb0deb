//! Fixtures for tests: class files, jars and fake tools.
//!
//! ```rust,ignore
//! use jarloom::testkit::{ClassFileBuilder, JarBuilder};
//!
//! let path = JarBuilder::new()
//!     .class(ClassFileBuilder::new("a/C").extends("a/B").method("m", "()V"))
//!     .resource("readme.txt", "hi")
//!     .write(dir.path().join("lib.jar"));
//! ```

pub mod classfile;
pub mod jar;
pub mod tools;

pub use classfile::ClassFileBuilder;
pub use jar::JarBuilder;
pub use tools::{FailingPatcher, OverlayPatcher};
