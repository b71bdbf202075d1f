// SPDX-License-Identifier: MIT

//! flowviz-rs: render flow dags into Graphviz DOT
//!
//! `dag` holds the validated flow model and the pipeline position tracker;
//! `viz` builds on it with the renderer, trace breakdowns and document
//! sources.

pub mod dag;
pub mod viz;
