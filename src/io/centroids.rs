//! Grain centroid files.
//!
//! One record per line, whitespace or comma separated:
//!
//! ```text
//! # grain  x      y      [z]
//! 1        0.25   0.75
//! 2        0.70   0.40   0.0
//! ```
//!
//! Records of just `x y` are numbered from 1 in file order. All records of
//! a file use the same layout. Text after `#` is ignored.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use nalgebra::Point2;

use crate::error::{ParseError, Result};
use crate::mesh::GrainId;

/// Load grain centroids from a file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<BTreeMap<GrainId, Point2<f64>>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let centroids = read(BufReader::new(file), path)?;
    info!("Read {} centroids from {}", centroids.len(), path.display());
    Ok(centroids)
}

/// Read grain centroids. `path` is used in error messages only.
pub fn read<R: BufRead>(reader: R, path: &Path) -> Result<BTreeMap<GrainId, Point2<f64>>> {
    let syntax = |line: usize, message: String| ParseError::Syntax {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut centroids = BTreeMap::new();
    let mut layout: Option<usize> = None;

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line?;
        let content = line.split('#').next().unwrap_or_default();
        let fields: Vec<&str> = content
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
            .collect();
        if fields.is_empty() {
            continue;
        }

        if !(2..=4).contains(&fields.len()) {
            return Err(syntax(number, format!("expected 'id x y [z]', found {} fields", fields.len())).into());
        }
        match layout {
            None => layout = Some(fields.len()),
            Some(n) if n != fields.len() => {
                return Err(syntax(
                    number,
                    format!("expected {} fields like the first record, found {}", n, fields.len()),
                )
                .into())
            }
            Some(_) => {}
        }

        let (grain, coords) = if fields.len() == 2 {
            let label = u32::try_from(centroids.len() + 1)
                .map_err(|_| syntax(number, "too many centroid records".to_string()))?;
            (GrainId::new(label), &fields[..])
        } else {
            let label: u32 = fields[0]
                .parse()
                .map_err(|_| syntax(number, format!("invalid grain id '{}'", fields[0])))?;
            (GrainId::new(label), &fields[1..3])
        };

        let mut xy = [0.0f64; 2];
        for (c, field) in xy.iter_mut().zip(coords) {
            *c = field
                .parse()
                .ok()
                .filter(|v: &f64| v.is_finite())
                .ok_or_else(|| syntax(number, format!("invalid coordinate '{}'", field)))?;
        }

        if centroids.insert(grain, Point2::new(xy[0], xy[1])).is_some() {
            return Err(ParseError::DuplicateCentroid { grain }.into());
        }
    }

    Ok(centroids)
}
