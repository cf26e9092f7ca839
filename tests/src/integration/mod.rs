//! Integration flows across several generators

pub mod flows;
