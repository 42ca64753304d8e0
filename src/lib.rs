//! marquee: enrich MovieLens catalogs with OMDb metadata and load them into SQLite.
//!
//! The pipeline is strictly sequential:
//! CSV rows → [`title`] parsing → [`omdb`] lookups driven by [`enrich`] →
//! [`normalize`] → [`store`] (one transactional full-table replace).

pub mod catalog;
pub mod commands;
pub mod config;
pub mod enrich;
pub mod error;
pub mod normalize;
pub mod omdb;
pub mod progress;
pub mod store;
pub mod title;
