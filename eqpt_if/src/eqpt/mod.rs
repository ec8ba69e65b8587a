//! # Equipment Interface
//!
//! This module defines the contracts the control core relies on at its boundaries. Nothing here
//! assumes a particular wire protocol or sensor pipeline.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod act;
pub mod angle;
