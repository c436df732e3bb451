//! # Docdex
//!
//! A document indexing and federated retrieval service for AI tools.
//!
//! Docdex scans Markdown documents out of a blob store (local filesystem or
//! an S3-compatible bucket), extracts their metadata, and reconciles them
//! into a SQLite index keyed by filename stem. Queries fan out across the
//! local index and a remote WordPress-style content API, and everything is
//! exposed as tools over plain HTTP and MCP.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Blob store  │──▶│   Parser     │──▶│  SQLite   │
//! │  FS / S3    │   │ front matter│   │  index    │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!               ┌──────────────┐           │
//!               │ Content API  │───────┐   │
//!               │ (WordPress)  │       ▼   ▼
//!               └──────────────┘   ┌─────────────┐
//!                                  │  Federated   │
//!                                  │   search     │
//!                                  └──────┬──────┘
//!                          ┌──────────┐   │   ┌──────────┐
//!                          │   CLI    │◀──┴──▶│ HTTP/MCP │
//!                          └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docdex init                     # create database
//! docdex index                    # scan the blob store and build the index
//! docdex search "deployment"      # federated keyword search
//! docdex get deploy-guide         # full document by key
//! docdex serve mcp                # start HTTP + MCP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`parse`] | Markdown metadata extraction |
//! | [`blobstore`] | Blob store abstraction + filesystem binding |
//! | [`blob_s3`] | S3-compatible blob binding |
//! | [`index`] | Index runs (scan → parse → reconcile) |
//! | [`query`] | Keyword lookup over the index |
//! | [`content_api`] | Remote article API client |
//! | [`federated`] | Multi-source search and document resolution |
//! | [`tools`] | Tool trait, registry, and built-in tools |
//! | [`server`] | HTTP server (Axum) with CORS |
//! | [`mcp`] | MCP JSON-RPC bridge |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod blob_s3;
pub mod blobstore;
pub mod config;
pub mod content_api;
pub mod db;
pub mod federated;
pub mod index;
pub mod mcp;
pub mod migrate;
pub mod models;
pub mod parse;
pub mod query;
pub mod server;
pub mod status;
pub mod tools;
