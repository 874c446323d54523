//! Wire models shared with the workflow API

pub mod models;
