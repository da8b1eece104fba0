//! HTTP handlers exposing health reports

pub mod health;
pub mod routes;
