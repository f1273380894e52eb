//! Code for reading transmission lines from a CSV file.
use super::*;
use crate::id::IDCollection;
use crate::network::TransmissionLink;
use crate::node::NodeMap;
use crate::units::{Power, Susceptance};
use serde::Deserialize;
use std::path::Path;

const LINES_FILE_NAME: &str = "lines.csv";

/// Represents a row of the lines CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct LineRaw {
    source: String,
    sink: String,
    capacity: Power,
    susceptance: Susceptance,
}

/// Read transmission lines from a CSV file.
///
/// Each physical line appears once; the reverse direction is added when the line matrix is built.
/// The file may be omitted for a single-node grid.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `nodes` - All nodes of the network
pub fn read_lines(model_dir: &Path, nodes: &NodeMap) -> Result<Vec<TransmissionLink>> {
    let file_path = model_dir.join(LINES_FILE_NAME);
    let lines_csv = read_csv_optional(&file_path)?;
    read_lines_from_iter(lines_csv, nodes).with_context(|| input_err_msg(&file_path))
}

fn read_lines_from_iter<I>(iter: I, nodes: &NodeMap) -> Result<Vec<TransmissionLink>>
where
    I: Iterator<Item = LineRaw>,
{
    iter.map(|raw| {
        let source = nodes
            .get_id_by_str(&raw.source)
            .with_context(|| format!("Line {}-{} has an unknown source", raw.source, raw.sink))?;
        let sink = nodes
            .get_id_by_str(&raw.sink)
            .with_context(|| format!("Line {}-{} has an unknown sink", raw.source, raw.sink))?;
        ensure!(
            raw.susceptance.is_finite(),
            "Susceptance of line {source}-{sink} must be finite"
        );

        Ok(TransmissionLink {
            source,
            sink,
            capacity: raw.capacity,
            susceptance: raw.susceptance,
        })
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::nodes;
    use crate::units::Dimensionless;
    use rstest::rstest;

    fn raw(source: &str, sink: &str) -> LineRaw {
        LineRaw {
            source: source.into(),
            sink: sink.into(),
            capacity: Power(100.0),
            susceptance: Dimensionless(5.0),
        }
    }

    #[rstest]
    fn test_read_lines_from_iter(nodes: NodeMap) {
        let links = read_lines_from_iter([raw("A", "B")].into_iter(), &nodes).unwrap();
        assert_eq!(
            links,
            [TransmissionLink {
                source: "A".into(),
                sink: "B".into(),
                capacity: Power(100.0),
                susceptance: Dimensionless(5.0),
            }]
        );
    }

    #[rstest]
    fn test_read_lines_unknown_node(nodes: NodeMap) {
        assert!(read_lines_from_iter([raw("A", "X")].into_iter(), &nodes).is_err());
    }
}
