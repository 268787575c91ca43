//! Smart Costing for OTOP entrepreneurs: ingredient costs, unit cost and a
//! recommended selling price, with a locally persisted draft and submission
//! to the Surat OTOP Biz backend sheet.

pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
