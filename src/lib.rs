// src/lib.rs

pub mod camera;
pub mod config;
pub mod contour;
pub mod elliptic;
pub mod error;
pub mod glyphs;
pub mod grid;
pub mod magnet;
pub mod ovf;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod scene;
pub mod streamlines;
pub mod vec3;
pub mod vector_field;
pub mod visualisation;
