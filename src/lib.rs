//! Linear static analysis of plane-stress structures with constant-strain triangles
//!
//! The pipeline reads a STAP-style input file ([input]), numbers the free
//! degrees of freedom ([mesh]), binds every element to its nodes and material
//! ([element], [material]), assembles the packed element blocks ([packed],
//! [assembly]), solves each load case ([solver]) and recovers element
//! stresses ([analysis]). [report] formats the results.

pub mod analysis;
pub mod assembly;
pub mod config;
pub mod element;
pub mod error;
pub mod input;
pub mod material;
pub mod mesh;
pub mod observer;
pub mod packed;
pub mod report;
pub mod solver;

pub use error::{Error, Result};
