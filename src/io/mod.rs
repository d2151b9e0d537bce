//! Mesh file I/O.
//!
//! # Supported Files
//!
//! | File | Module | Load | Save |
//! |------|--------|------|------|
//! | Abaqus input deck (`.inp`) | [`inp`] | ✓ | ✓ |
//! | Grain centroids | [`centroids`] | ✓ | ✗ |
//!
//! # Usage
//!
//! ```no_run
//! use grainlayer::io::{default_output_path, load, save};
//!
//! let deck = load("tess.inp", "centroids.txt", "face").unwrap();
//! // ... convert ...
//! save(default_output_path("tess.inp"), &deck, &[], &[]).unwrap();
//! ```

pub mod centroids;
pub mod inp;

use std::path::{Path, PathBuf};

pub use inp::{Deck, ElementBlock, Layout};

use crate::algo::junction::JunctionElement;
use crate::algo::stitch::InterfaceElement;
use crate::error::Result;

/// Load a deck and attach the grain centroids to it.
///
/// The centroid file must name exactly the grains the deck defines.
pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
    mesh_path: P,
    centroid_path: Q,
    grain_prefix: &str,
) -> Result<Deck> {
    let mut deck = inp::load(mesh_path, grain_prefix)?;
    let centroids = centroids::load(centroid_path)?;
    deck.mesh.assign_centroids(&centroids)?;
    Ok(deck)
}

/// Atomically write a converted deck.
pub fn save<P: AsRef<Path>>(
    path: P,
    deck: &Deck,
    interfaces: &[InterfaceElement],
    junctions: &[JunctionElement],
) -> Result<()> {
    inp::save(path, deck, interfaces, junctions)
}

/// Output path used when none is given: `tess.inp` becomes `tess.modified.inp`.
pub fn default_output_path<P: AsRef<Path>>(input: P) -> PathBuf {
    input.as_ref().with_extension("modified.inp")
}
