//! End-to-end conversion.
//!
//! [`run`] loads the deck and centroids named by a [`Config`], converts the
//! mesh with [`convert`] and writes the result. Every stage fails fast; no
//! output is written unless all of them succeed.
//!
//! Stage order:
//!
//! 1. cohesive sides are checked for coincidence
//! 2. periodic links are resolved (periodic mode only)
//! 3. junctions are recorded while the copies still coincide
//! 4. grains are shrunk and periodic links verified
//! 5. interface elements are stitched
//! 6. junction holes are filled

use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::algo::junction::{detect_junctions, fill_junctions, JunctionElement, JunctionFill};
use crate::algo::periodic::{domain_periods, resolve_periodicity};
use crate::algo::shrink::{shrink_grains, ShrinkReport};
use crate::algo::stitch::{element_after, first_free_element_id, stitch_interfaces, InterfaceElement};
use crate::config::Config;
use crate::error::Result;
use crate::io::{self, Deck};
use crate::mesh::NodeId;

/// Elements and nodes produced by [`convert`].
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    /// One interface element per cohesive element.
    pub interfaces: Vec<InterfaceElement>,
    /// Junction fill triangles.
    pub junctions: Vec<JunctionElement>,
    /// Nodes added as junction centres.
    pub new_nodes: Vec<NodeId>,
    /// Number of periodic links (node groups matched across a seam).
    pub periodic_links: usize,
    /// Shrink statistics.
    pub shrink: ShrinkReport,
}

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct Summary {
    /// Where the deck was written.
    pub output: PathBuf,
    /// Node count of the written deck.
    pub nodes: usize,
    /// Number of grains.
    pub grains: usize,
    /// The conversion itself.
    pub conversion: Conversion,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

/// Convert the mesh of `deck` in place.
///
/// The centroids must already be attached (see [`io::load`]).
pub fn convert(deck: &mut Deck, config: &Config) -> Result<Conversion> {
    config.validate()?;
    let mesh = &mut deck.mesh;

    let periods = if config.periodic {
        domain_periods(mesh)?
    } else {
        Vec::new()
    };
    mesh.check_cohesive_coincidence(config.tolerance, &periods)?;

    let links = if config.periodic {
        resolve_periodicity(mesh, &config.periodic_options())?
    } else {
        Vec::new()
    };

    let junctions = if config.fill_junctions {
        detect_junctions(mesh, config.tolerance)?
    } else {
        Vec::new()
    };

    let shrink = shrink_grains(mesh, &links, &config.shrink_options())?;
    debug!("Smallest ring area ratio after shrinkage: {:.4}", shrink.min_area_ratio);

    let first_id = first_free_element_id(mesh, config.first_element_id)?;
    let interfaces = stitch_interfaces(mesh, first_id)?;

    let fill = if junctions.is_empty() {
        JunctionFill::default()
    } else {
        let next_id = match interfaces.last() {
            Some(e) => element_after(e.id)?,
            None => first_id,
        };
        fill_junctions(mesh, &junctions, next_id)?
    };
    debug!(
        "Junction fill: {} triangles, {} new nodes",
        fill.elements.len(),
        fill.new_nodes.len()
    );

    Ok(Conversion {
        interfaces,
        junctions: fill.elements,
        new_nodes: fill.new_nodes,
        periodic_links: links.len(),
        shrink,
    })
}

/// Load, convert and save according to `config`.
pub fn run(config: &Config) -> Result<Summary> {
    let start = Instant::now();
    config.validate()?;

    let mut deck = io::load(&config.input, &config.centroids, &config.grain_prefix)?;
    let conversion = convert(&mut deck, config)?;

    let output = config.output_path();
    io::save(&output, &deck, &conversion.interfaces, &conversion.junctions)?;
    let elapsed = start.elapsed();
    info!("Saved {} ({:.2?})", output.display(), elapsed);

    Ok(Summary {
        output,
        nodes: deck.mesh.num_nodes(),
        grains: deck.mesh.num_grains(),
        conversion,
        elapsed,
    })
}
