//! Core library for brandkit
//!
//! This crate implements the **Functional Core** of the brandkit application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! - **`brandkit_core`** (this crate): Pure transformation functions with zero I/O
//! - **`brandkit`**: corpus loading, model and HTTP calls, the web UI (the Imperative Shell)
//!
//! # Module Organization
//!
//! - [`branding`]: prompt building and extraction of the branding fields from a model reply
//! - [`palette`]: palette search results, color parsing and service URLs
//! - [`canvas`]: placeholder and palette images, text rendering
//! - [`retrieval`]: corpus text cleanup, chunking and the cosine-similarity index
//!
//! Every function here can be tested with fixture data; nothing reaches the
//! network or the filesystem.
//!
//! # Example Usage
//!
//! ```rust
//! use brandkit_core::branding::extract_branding;
//!
//! let result = extract_branding("**Brand Name:** Lumen Coffee");
//! assert_eq!(result.name, "Lumen Coffee");
//! assert_eq!(result.slogan, "Slogan not generated");
//! ```

pub mod branding;
pub mod canvas;
pub mod palette;
pub mod retrieval;
