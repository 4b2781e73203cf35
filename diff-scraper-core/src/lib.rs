#![doc = "diff-scraper-core: core pipeline library for diff-scraper."]

//! This crate holds the traversal, discovery, processing and patch-writing logic.
//! The CLI crate only parses arguments, prepares the output directory and calls
//! [`harvest::harvest`].
//!
//! # Usage
//! Build a [`config::HarvestConfig`], pick a [`contract::GitlabApi`] implementation
//! (the networked [`gitlab::GitlabClient`] or a mock) and run the harvest.

pub mod config;
pub mod contract;
pub mod discovery;
pub mod gitlab;
pub mod harvest;
pub mod patch;
pub mod processor;
pub mod transport;
pub mod traversal;
