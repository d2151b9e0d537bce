//! Conversion stages.
//!
//! - **Periodicity**: match nodes on opposite domain faces ([`periodic`])
//! - **Shrinkage**: move every grain towards its centroid ([`shrink`])
//! - **Stitching**: turn cohesive elements into finite-thickness interface
//!   elements ([`stitch`])
//! - **Junctions**: fill the holes opened where three or more grains meet
//!   ([`junction`])
//!
//! [`crate::pipeline`] runs them in order.

pub mod junction;
pub mod periodic;
pub mod shrink;
pub mod stitch;

pub use junction::{detect_junctions, fill_junctions, Junction, JunctionElement, JunctionFill};
pub use periodic::{resolve_periodicity, PeriodicLink, PeriodicOptions};
pub use shrink::{shrink_grains, ShrinkOptions, ShrinkReport};
pub use stitch::{first_free_element_id, stitch_interfaces, InterfaceElement};
