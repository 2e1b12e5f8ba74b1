//! Integration tests organized by concern.

mod growth;
mod loading;
mod properties;
mod scenarios;
