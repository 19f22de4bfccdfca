pub mod assignment;
pub mod controller;
pub mod datablock;
pub mod error;
pub mod geometry;
pub mod layers;
pub mod selection;
pub mod surface;
