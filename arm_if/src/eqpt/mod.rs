//! # Equipment interfaces

pub mod scene;
