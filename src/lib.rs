//!# Synology FileStation API Client
//!
//! A Rust client library for browsing a Synology NAS through the FileStation web API.
//!
//! ## Features
//!
//! - Discovery of the APIs and versions the NAS supports
//! - Authentication with Synology API
//! - List shared folders and folder contents
//! - Get file information (size, owner, timestamps, permissions)
//! - Stream file downloads into any [`tokio::io::AsyncWrite`]
//! - Calculate MD5 hashes on the NAS
//!
//! ## Usage example
//!
//! ```rust,no_run
//! use anyhow::Result;
//! use std::env;
//! use syno_file_station::client::SynoClient;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<()> {
//!     let client = SynoClient::builder()
//!         .host(env::var("SYNOLOGY_HOST")?)
//!         .build()?;
//!
//!     let session = client
//!         .login(
//!             &env::var("SYNOLOGY_USERNAME")?,
//!             &env::var("SYNOLOGY_PASSWORD")?,
//!         )
//!         .await?;
//!
//!     for file in session.list("/home").await? {
//!         println!("{} {}", file.calculate_size(), file.path);
//!     }
//!
//!     let hash = session.md5("/home/notes.txt").await?;
//!     println!("md5: {hash}");
//!
//!     let mut out = tokio::fs::File::create("notes.txt").await?;
//!     session.download("/home/notes.txt", &mut out).await?;
//!
//!     session.logout().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codes;
pub mod entities;
pub mod file_station;
pub mod session;
pub mod utils;
