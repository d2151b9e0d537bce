//! Abaqus input deck (`.inp`) support.
//!
//! Only the subset written by tessellation and cohesive-insertion tools is
//! interpreted: `*Node`, `*Element`, `*Elset` and `*Nset`. Everything before
//! the first of these keywords is kept as a preamble, and any other keyword
//! block that follows is carried through verbatim.
//!
//! Writing re-emits the deck with updated node positions, with each
//! cohesive element replaced by its interface element and with the derived
//! sets appended.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use nalgebra::Point2;
use tempfile::NamedTempFile;

use crate::algo::junction::JunctionElement;
use crate::algo::stitch::InterfaceElement;
use crate::error::{ParseError, Result};
use crate::mesh::{ElementId, ElementKind, Mesh, MeshBuilder, NodeId};

/// Ids per data line when writing sets.
const SET_LINE_LEN: usize = 16;

/// Names of the sets generated on output. Input sets with these names are
/// replaced.
const DERIVED_ELEMENT_SETS: [&str; 3] = ["bulk", "interfaces", "junctions"];
const DERIVED_NODE_SETS: [&str; 1] = ["interface_nodes"];

/// A parsed deck: the mesh plus what is needed to write it back.
#[derive(Debug, Clone)]
pub struct Deck {
    /// The mesh.
    pub mesh: Mesh,
    /// Layout of the original file.
    pub layout: Layout,
}

/// The parts of a deck that are not mesh data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Lines before the first mesh keyword.
    pub preamble: Vec<String>,
    /// Element blocks in file order.
    pub element_blocks: Vec<ElementBlock>,
    /// Positions in [`Mesh::element_sets`] of sets declared on an
    /// `*Element` line, which the keyword line already reproduces.
    pub inline_sets: Vec<usize>,
    /// Unrecognised keyword blocks after the mesh data, verbatim.
    pub trailer: Vec<String>,
}

/// One `*Element` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementBlock {
    /// The keyword line as written.
    pub keyword: String,
    /// Element type label.
    pub type_name: String,
    /// Whether the block holds cohesive elements.
    pub cohesive: bool,
    /// Element labels in file order.
    pub elements: Vec<ElementId>,
}

/// Load a deck from a file.
///
/// # Example
///
/// ```no_run
/// use grainlayer::io::inp;
///
/// let deck = inp::load("tess.inp", "face").unwrap();
/// println!("{} grains", deck.mesh.num_grains());
/// ```
pub fn load<P: AsRef<Path>>(path: P, grain_prefix: &str) -> Result<Deck> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file), path, grain_prefix)
}

/// Read a deck. `path` is used in error messages only.
pub fn read<R: BufRead>(reader: R, path: &Path, grain_prefix: &str) -> Result<Deck> {
    let mut parser = Parser::new(path, grain_prefix);
    for (index, line) in reader.lines().enumerate() {
        parser.line(index + 1, &line?)?;
    }
    parser.finish()
}

/// Current keyword block.
enum Block {
    Preamble,
    Node {
        nset: Option<String>,
        members: Vec<NodeId>,
    },
    Element {
        kind: ElementKind,
        type_name: String,
        block: usize,
        pending: Vec<u64>,
        line: usize,
        elset: Option<String>,
    },
    Set {
        node: bool,
        name: String,
        generate: bool,
        members: Vec<u64>,
    },
    Preserved,
    Skipped,
}

struct Keyword {
    name: String,
    params: Vec<(String, Option<String>)>,
}

impl Keyword {
    fn parse(line: &str) -> Self {
        let mut parts = line.trim().trim_start_matches('*').split(',');
        let name = parts
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let params = parts
            .map(|p| match p.split_once('=') {
                Some((k, v)) => (k.trim().to_ascii_lowercase(), Some(v.trim().to_string())),
                None => (p.trim().to_ascii_lowercase(), None),
            })
            .collect();
        Self { name, params }
    }

    fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    fn flag(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }
}

struct Parser {
    path: PathBuf,
    builder: MeshBuilder,
    layout: Layout,
    block: Block,
    in_mesh: bool,
    element_sets: usize,
}

impl Parser {
    fn new(path: &Path, grain_prefix: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            builder: MeshBuilder::new().with_grain_prefix(grain_prefix),
            layout: Layout::default(),
            block: Block::Preamble,
            in_mesh: false,
            element_sets: 0,
        }
    }

    fn line(&mut self, number: usize, raw: &str) -> Result<()> {
        let trimmed = raw.trim();

        if trimmed.starts_with("**") {
            if matches!(self.block, Block::Preamble) {
                self.layout.preamble.push(raw.to_string());
            } else if matches!(self.block, Block::Preserved) {
                self.layout.trailer.push(raw.to_string());
            }
            return Ok(());
        }

        if trimmed.starts_with('*') {
            self.close_block()?;
            return self.keyword(number, raw);
        }

        if trimmed.is_empty() {
            return Ok(());
        }

        match self.block {
            Block::Preamble => self.layout.preamble.push(raw.to_string()),
            Block::Preserved => self.layout.trailer.push(raw.to_string()),
            Block::Skipped => {}
            Block::Node { .. } => self.node_record(number, trimmed)?,
            Block::Element { .. } => self.element_record(number, trimmed)?,
            Block::Set { .. } => self.set_record(number, trimmed)?,
        }
        Ok(())
    }

    fn keyword(&mut self, number: usize, raw: &str) -> Result<()> {
        let keyword = Keyword::parse(raw);
        match keyword.name.as_str() {
            "node" => {
                self.in_mesh = true;
                self.block = Block::Node {
                    nset: keyword.param("nset").map(str::to_string),
                    members: Vec::new(),
                };
            }
            "element" => {
                self.in_mesh = true;
                let type_name = keyword
                    .param("type")
                    .ok_or_else(|| syntax(&self.path, number, "*Element without type"))?
                    .to_string();
                let kind = ElementKind::from_type_name(&type_name).ok_or_else(|| {
                    ParseError::UnsupportedElement {
                        path: self.path.clone(),
                        line: number,
                        type_name: type_name.clone(),
                    }
                })?;
                self.layout.element_blocks.push(ElementBlock {
                    keyword: raw.trim_end().to_string(),
                    type_name: type_name.clone(),
                    cohesive: kind.is_cohesive(),
                    elements: Vec::new(),
                });
                self.block = Block::Element {
                    kind,
                    type_name,
                    block: self.layout.element_blocks.len() - 1,
                    pending: Vec::new(),
                    line: number,
                    elset: keyword.param("elset").map(str::to_string),
                };
            }
            "elset" | "nset" if keyword.param("instance").is_none() => {
                self.in_mesh = true;
                let node = keyword.name == "nset";
                let name = keyword
                    .param(if node { "nset" } else { "elset" })
                    .ok_or_else(|| {
                        syntax(&self.path, number, format!("*{} without a name", keyword.name))
                    })?
                    .to_string();
                self.block = Block::Set {
                    node,
                    name,
                    generate: keyword.flag("generate"),
                    members: Vec::new(),
                };
            }
            _ if !self.in_mesh => {
                self.layout.preamble.push(raw.to_string());
                self.block = Block::Preamble;
            }
            _ => {
                self.layout.trailer.push(raw.to_string());
                self.block = Block::Preserved;
            }
        }
        Ok(())
    }

    fn node_record(&mut self, number: usize, line: &str) -> Result<()> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if !(3..=4).contains(&fields.len()) {
            let message = format!("expected 'id, x, y[, z]', found {} fields", fields.len());
            return Err(syntax(&self.path, number, message).into());
        }
        let id: u64 = fields[0]
            .parse()
            .map_err(|_| syntax(&self.path, number, format!("invalid node id '{}'", fields[0])))?;
        let mut coords = [0.0f64; 3];
        for (c, field) in coords.iter_mut().zip(&fields[1..]) {
            *c = field
                .parse()
                .map_err(|_| syntax(&self.path, number, format!("invalid coordinate '{}'", field)))?;
            if !c.is_finite() {
                let message = format!("non-finite coordinate '{}'", field);
                return Err(syntax(&self.path, number, message).into());
            }
        }
        let node = NodeId::new(id);
        if coords[2] != 0.0 {
            return Err(ParseError::NonPlanarNode { node, z: coords[2] }.into());
        }
        self.builder.add_node(node, Point2::new(coords[0], coords[1]));
        if let Block::Node {
            nset: Some(_),
            members,
        } = &mut self.block
        {
            members.push(node);
        }
        Ok(())
    }

    fn element_record(&mut self, number: usize, line: &str) -> Result<()> {
        let tokens = parse_ids(line)
            .map_err(|t| syntax(&self.path, number, format!("invalid label '{}'", t)))?;
        let Block::Element {
            kind,
            type_name,
            block,
            pending,
            line,
            ..
        } = &mut self.block
        else {
            return Ok(());
        };
        *line = number;
        pending.extend(tokens);

        let width = kind.num_nodes() + 1;
        while pending.len() >= width {
            let record: Vec<u64> = pending.drain(..width).collect();
            let id = ElementId::new(record[0]);
            let nodes = record[1..].iter().copied().map(NodeId::new).collect();
            self.builder.add_element(id, type_name, nodes)?;
            self.layout.element_blocks[*block].elements.push(id);
        }
        Ok(())
    }

    fn set_record(&mut self, number: usize, line: &str) -> Result<()> {
        let tokens = parse_ids(line).map_err(|t| {
            let message = format!("invalid set member '{}' (named members are not supported)", t);
            syntax(&self.path, number, message)
        })?;
        let Block::Set {
            generate, members, ..
        } = &mut self.block
        else {
            return Ok(());
        };
        if !*generate {
            members.extend(tokens);
            return Ok(());
        }

        let (start, end, step) = match tokens.as_slice() {
            [start, end] => (*start, *end, 1),
            [start, end, step] => (*start, *end, *step),
            _ => {
                let message = "expected 'start, end[, step]' in a generated set";
                return Err(syntax(&self.path, number, message).into());
            }
        };
        if step == 0 || end < start {
            return Err(syntax(&self.path, number, "invalid generated set range").into());
        }
        members.extend((start..=end).step_by(step as usize));
        Ok(())
    }

    fn close_block(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.block, Block::Skipped) {
            Block::Element { pending, line, .. } if !pending.is_empty() => {
                Err(syntax(&self.path, line, "incomplete element record").into())
            }
            Block::Element {
                block,
                elset: Some(name),
                ..
            } => {
                let members = self.layout.element_blocks[block].elements.clone();
                self.builder.add_element_set(name, members);
                self.layout.inline_sets.push(self.element_sets);
                self.element_sets += 1;
                Ok(())
            }
            Block::Node {
                nset: Some(name),
                members,
            } => {
                self.builder.add_node_set(name, members);
                Ok(())
            }
            Block::Set {
                node: true,
                name,
                members,
                ..
            } => {
                self.builder
                    .add_node_set(name, members.into_iter().map(NodeId::new).collect());
                Ok(())
            }
            Block::Set {
                node: false,
                name,
                members,
                ..
            } => {
                self.builder
                    .add_element_set(name, members.into_iter().map(ElementId::new).collect());
                self.element_sets += 1;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn finish(mut self) -> Result<Deck> {
        self.close_block()?;
        let mesh = self.builder.build()?;
        info!(
            "Read {} nodes, {} bulk and {} cohesive elements in {} grains from {}",
            mesh.num_nodes(),
            mesh.num_bulk_elements(),
            mesh.num_cohesive_elements(),
            mesh.num_grains(),
            self.path.display()
        );
        Ok(Deck {
            mesh,
            layout: self.layout,
        })
    }
}

fn syntax(path: &Path, line: usize, message: impl Into<String>) -> ParseError {
    ParseError::Syntax {
        path: path.to_path_buf(),
        line,
        message: message.into(),
    }
}

/// Parse comma-separated labels, returning the first bad token on failure.
fn parse_ids(line: &str) -> std::result::Result<Vec<u64>, String> {
    line.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u64>().map_err(|_| t.to_string()))
        .collect()
}

/// Write a converted deck.
///
/// Cohesive elements are replaced by the interface elements built from
/// them; junction triangles go into a block of their own. Elements that no
/// block of the layout lists (a mesh assembled in memory, for instance) are
/// written in one `*Element` block per type.
pub fn write<W: Write>(
    writer: &mut W,
    deck: &Deck,
    interfaces: &[InterfaceElement],
    junctions: &[JunctionElement],
) -> Result<()> {
    let mesh = &deck.mesh;
    let layout = &deck.layout;
    let by_source: HashMap<ElementId, &InterfaceElement> =
        interfaces.iter().map(|e| (e.source, e)).collect();

    for line in &layout.preamble {
        writeln!(writer, "{}", line)?;
    }

    writeln!(writer, "*Node")?;
    for node in mesh.nodes() {
        writeln!(
            writer,
            "{}, {:.12}, {:.12}, {:.12}",
            node.id, node.position.x, node.position.y, 0.0
        )?;
    }

    let write_any = |writer: &mut W, id: ElementId| -> Result<()> {
        if let Some(e) = by_source.get(&id) {
            write_element(writer, e.id, &e.nodes)
        } else if let Some(c) = mesh.cohesive_element(id) {
            let nodes: Vec<NodeId> = c.minus.iter().chain(c.plus.iter().rev()).copied().collect();
            write_element(writer, c.id, &nodes)
        } else if let Some(e) = mesh.bulk_element(id) {
            write_element(writer, e.id, &e.nodes)
        } else {
            Ok(())
        }
    };

    for block in &layout.element_blocks {
        writeln!(writer, "{}", block.keyword)?;
        for &id in &block.elements {
            write_any(&mut *writer, id)?;
        }
    }

    let covered: HashSet<ElementId> = layout
        .element_blocks
        .iter()
        .flat_map(|b| b.elements.iter().copied())
        .collect();
    let uncovered: Vec<(ElementId, &str)> = mesh
        .bulk_elements()
        .map(|e| (e.id, e.type_name.as_str()))
        .chain(mesh.cohesive_elements().map(|c| (c.id, c.type_name.as_str())))
        .filter(|(id, _)| !covered.contains(id))
        .collect();
    let mut uncovered_types: Vec<&str> = Vec::new();
    for &(_, type_name) in &uncovered {
        if !uncovered_types.contains(&type_name) {
            uncovered_types.push(type_name);
        }
    }
    for type_name in uncovered_types {
        debug!("writing unlisted {} elements in a new block", type_name);
        writeln!(writer, "*Element, type={}", type_name)?;
        for &(id, _) in uncovered.iter().filter(|(_, t)| *t == type_name) {
            write_any(&mut *writer, id)?;
        }
    }

    let mut junction_types: Vec<&str> = junctions.iter().map(|e| e.type_name.as_str()).collect();
    junction_types.dedup();
    for type_name in junction_types {
        writeln!(writer, "*Element, type={}", type_name)?;
        for e in junctions.iter().filter(|e| e.type_name == type_name) {
            write_element(writer, e.id, &e.nodes)?;
        }
    }

    let mut pair_sets: Vec<(String, Vec<ElementId>)> = Vec::new();
    for (a, b) in mesh.grain_pairs() {
        let (Some(ga), Some(gb)) = (mesh.grain(a), mesh.grain(b)) else {
            continue;
        };
        let ids = mesh
            .cohesive_between(a, b)
            .iter()
            .filter_map(|c| by_source.get(c).map(|e| e.id))
            .collect();
        pair_sets.push((format!("interface_{}_{}", ga.set_name, gb.set_name), ids));
    }
    let is_derived = |name: &str| {
        DERIVED_ELEMENT_SETS
            .iter()
            .any(|d| d.eq_ignore_ascii_case(name))
            || pair_sets.iter().any(|(p, _)| p.eq_ignore_ascii_case(name))
    };

    for (i, set) in mesh.element_sets().iter().enumerate() {
        if layout.inline_sets.contains(&i) {
            continue;
        }
        if is_derived(&set.name) {
            debug!("replacing input element set {}", set.name);
            continue;
        }
        let ids: Vec<ElementId> = set
            .elements
            .iter()
            .map(|id| by_source.get(id).map_or(*id, |e| e.id))
            .collect();
        write_set(writer, "Elset, elset", &set.name, &ids)?;
    }

    let bulk: Vec<ElementId> = mesh.bulk_elements().map(|e| e.id).collect();
    write_set(writer, "Elset, elset", "bulk", &bulk)?;
    if !interfaces.is_empty() {
        let ids: Vec<ElementId> = interfaces.iter().map(|e| e.id).collect();
        write_set(writer, "Elset, elset", "interfaces", &ids)?;
    }
    for (name, ids) in pair_sets.iter().filter(|(_, ids)| !ids.is_empty()) {
        write_set(writer, "Elset, elset", name, ids)?;
    }
    if !junctions.is_empty() {
        let ids: Vec<ElementId> = junctions.iter().map(|e| e.id).collect();
        write_set(writer, "Elset, elset", "junctions", &ids)?;
    }

    for set in mesh.node_sets() {
        if DERIVED_NODE_SETS.iter().any(|d| d.eq_ignore_ascii_case(&set.name)) {
            debug!("replacing input node set {}", set.name);
            continue;
        }
        write_set(writer, "Nset, nset", &set.name, &set.nodes)?;
    }
    if !interfaces.is_empty() {
        let nodes: BTreeSet<NodeId> = interfaces
            .iter()
            .flat_map(|e| e.nodes.iter().copied())
            .collect();
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        write_set(writer, "Nset, nset", "interface_nodes", &nodes)?;
    }

    for line in &layout.trailer {
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

fn write_element<W: Write, T: std::fmt::Display>(
    writer: &mut W,
    id: ElementId,
    nodes: &[T],
) -> Result<()> {
    write!(writer, "{}", id)?;
    for n in nodes {
        write!(writer, ", {}", n)?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_set<W: Write, T: std::fmt::Display>(
    writer: &mut W,
    keyword: &str,
    name: &str,
    ids: &[T],
) -> Result<()> {
    writeln!(writer, "*{}={}", keyword, name)?;
    for chunk in ids.chunks(SET_LINE_LEN) {
        let line: Vec<String> = chunk.iter().map(ToString::to_string).collect();
        writeln!(writer, "{}", line.join(", "))?;
    }
    Ok(())
}

/// Write a converted deck to `path`.
///
/// The deck is written to a temporary file in the target directory and
/// renamed into place, so a failed write leaves no partial output.
pub fn save<P: AsRef<Path>>(
    path: P,
    deck: &Deck,
    interfaces: &[InterfaceElement],
    junctions: &[JunctionElement],
) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write(&mut writer, deck, interfaces, junctions)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mesh::GrainId;
    use std::io::Cursor;

    const TWO_GRAINS: &str = "\
*Heading
** generated by a tessellation tool
*Part, name=tess
*Node
1, -1.0, -1.0, 0.0
2, 1.0, -1.0, 0.0
3, 1.0, 1.0, 0.0
4, -1.0, 1.0, 0.0
5, 1.0, -1.0, 0.0
6, 3.0, -1.0, 0.0
7, 3.0, 1.0, 0.0
8, 1.0, 1.0, 0.0
*Element, type=CPE3
1, 1, 2, 3
2, 1, 3, 4
3, 5, 6,
7
4, 5, 7, 8
*Element, type=COH2D4
5, 2, 3, 8, 5
*Elset, elset=face1
1, 2
*Elset, elset=face2, generate
3, 4, 1
*Elset, elset=boundaries
5
*Nset, nset=left
1, 4
*End Part
*Assembly, name=Assembly
*Instance, name=tess-1, part=tess
*End Instance
*End Assembly
";

    fn parse(text: &str) -> Result<Deck> {
        read(Cursor::new(text), Path::new("test.inp"), "face")
    }

    #[test]
    fn test_read_two_grains() {
        let deck = parse(TWO_GRAINS).unwrap();
        let mesh = &deck.mesh;
        assert_eq!(mesh.num_nodes(), 8);
        assert_eq!(mesh.num_bulk_elements(), 4);
        assert_eq!(mesh.num_cohesive_elements(), 1);
        assert_eq!(mesh.num_grains(), 2);
        assert_eq!(
            mesh.grain(GrainId::new(2)).unwrap().elements,
            vec![ElementId::new(3), ElementId::new(4)]
        );
        // Record continued over two lines
        assert_eq!(
            mesh.bulk_element(ElementId::new(3)).unwrap().nodes,
            vec![NodeId::new(5), NodeId::new(6), NodeId::new(7)]
        );

        let layout = &deck.layout;
        assert_eq!(layout.preamble.len(), 3);
        assert_eq!(layout.element_blocks.len(), 2);
        assert!(layout.element_blocks[1].cohesive);
        assert_eq!(layout.trailer.first().map(String::as_str), Some("*End Part"));
        assert_eq!(layout.trailer.len(), 5);
        assert_eq!(mesh.node_sets()[0].name, "left");
    }

    #[test]
    fn test_unsupported_element_type() {
        let text = "*Node\n1, 0, 0, 0\n*Element, type=C3D8\n1, 1, 1, 1, 1, 1, 1, 1, 1\n";
        match parse(text) {
            Err(Error::Parse(ParseError::UnsupportedElement { line, type_name, .. })) => {
                assert_eq!(line, 3);
                assert_eq!(type_name, "C3D8");
            }
            other => panic!("expected unsupported element, got {other:?}"),
        }
    }

    #[test]
    fn test_non_planar_node() {
        let text = "*Node\n1, 0.0, 0.0, 0.5\n";
        assert!(matches!(
            parse(text),
            Err(Error::Parse(ParseError::NonPlanarNode { z, .. })) if z == 0.5
        ));
    }

    #[test]
    fn test_syntax_errors_carry_line_numbers() {
        let text = "*Node\n1, 0.0, 0.0\n2, zero, 0.0\n";
        match parse(text) {
            Err(Error::Parse(ParseError::Syntax { line, path, .. })) => {
                assert_eq!(line, 3);
                assert_eq!(path, PathBuf::from("test.inp"));
            }
            other => panic!("expected syntax error, got {other:?}"),
        }

        let text = "*Node\n1, 0, 0\n2, 1, 0\n*Element, type=CPE3\n1, 1, 2\n*Elset, elset=face1\n1\n";
        assert!(matches!(
            parse(text),
            Err(Error::Parse(ParseError::Syntax { line: 5, .. }))
        ));
    }

    #[test]
    fn test_inline_element_set_defines_grain() {
        let text = "\
*Node
1, 0, 0
2, 1, 0
3, 0, 1
*Element, type=CPS3, elset=face7
1, 1, 2, 3
";
        let deck = parse(text).unwrap();
        assert_eq!(deck.mesh.grain(GrainId::new(7)).unwrap().elements.len(), 1);
        assert_eq!(deck.layout.inline_sets, vec![0]);

        let mut out = Vec::new();
        write(&mut out, &deck, &[], &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("*Elset, elset=face7"));
        assert!(text.contains("*Element, type=CPS3, elset=face7"));
    }

    #[test]
    fn test_write_read_round_trip() {
        let deck = parse(TWO_GRAINS).unwrap();
        let interfaces = vec![InterfaceElement {
            id: ElementId::new(6),
            source: ElementId::new(5),
            type_name: "COH2D4".to_string(),
            nodes: [5, 8, 3, 2].into_iter().map(NodeId::new).collect(),
            grains: (GrainId::new(2), GrainId::new(1)),
        }];

        let mut out = Vec::new();
        write(&mut out, &deck, &interfaces, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("*Heading\n"));
        assert!(text.contains("2, 1.000000000000, -1.000000000000, 0.000000000000\n"));
        assert!(text.contains("*Element, type=COH2D4\n6, 5, 8, 3, 2\n"));
        // Cohesive ids in sets follow their interface element
        assert!(text.contains("*Elset, elset=boundaries\n6\n"));
        assert!(text.contains("*Elset, elset=interface_face1_face2\n6\n"));
        assert!(text.contains("*Elset, elset=bulk\n1, 2, 3, 4\n"));
        assert!(text.contains("*Nset, nset=interface_nodes\n2, 3, 5, 8\n"));
        assert!(text.trim_end().ends_with("*End Assembly"));

        let again = parse(&text).unwrap();
        assert_eq!(again.mesh.num_nodes(), deck.mesh.num_nodes());
        assert_eq!(again.mesh.num_bulk_elements(), deck.mesh.num_bulk_elements());
        assert_eq!(again.mesh.num_cohesive_elements(), deck.mesh.num_cohesive_elements());
        assert_eq!(again.mesh.num_grains(), deck.mesh.num_grains());

        // Writing the re-read deck does not duplicate derived sets
        let mut out = Vec::new();
        write(&mut out, &again, &[], &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("elset=bulk").count(), 1);
    }

    #[test]
    fn test_inline_node_set_is_kept() {
        let text = "\
*Node, nset=corners
1, 0, 0
2, 1, 0
3, 0, 1
*Element, type=CPS3, elset=face1
1, 1, 2, 3
";
        let deck = parse(text).unwrap();
        let sets = deck.mesh.node_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].name, "corners");
        assert_eq!(sets[0].nodes, vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)]);

        let mut out = Vec::new();
        write(&mut out, &deck, &[], &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("*Nset, nset=corners\n1, 2, 3\n"));
        assert_eq!(parse(&text).unwrap().mesh.node_sets()[0].name, "corners");
    }

    #[test]
    fn test_unlisted_elements_get_their_own_blocks() {
        let deck = Deck {
            mesh: crate::mesh::fixtures::grid(false),
            layout: Layout::default(),
        };
        let mut out = Vec::new();
        write(&mut out, &deck, &[], &[]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.matches("*Element, type=CPE3\n").count(), 1);
        assert_eq!(text.matches("*Element, type=COH2D4\n").count(), 1);
        assert!(text.contains("101, 12, 13, 24, 21\n"));

        let again = parse(&text).unwrap();
        assert_eq!(again.mesh.num_nodes(), 16);
        assert_eq!(again.mesh.num_bulk_elements(), 8);
        assert_eq!(again.mesh.num_cohesive_elements(), 4);
        assert_eq!(again.mesh.num_grains(), 4);
        assert_eq!(again.layout.element_blocks.len(), 2);
    }

    #[test]
    fn test_long_sets_wrap_at_sixteen() {
        let mut out = Vec::new();
        let ids: Vec<u64> = (1..=20).collect();
        write_set(&mut out, "Elset, elset", "many", &ids).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].split(", ").count(), 16);
        assert_eq!(lines[2], "17, 18, 19, 20");
    }

    #[test]
    fn test_save_is_atomic_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.inp");
        let deck = parse(TWO_GRAINS).unwrap();
        save(&target, &deck, &[], &[]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let again = load(&target, "face").unwrap();
        assert_eq!(again.mesh.num_grains(), 2);
    }
}
