#![allow(dead_code)]

pub mod fake_app;
pub mod records;
