use crate::core::io::traits::CoordinateFile;
use crate::core::models::configuration::{Configurations, LabelledBatch, LayoutError};
use crate::core::numeric::{Real, real};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzMetadata {
    /// The comment line of every frame, in frame order.
    pub comments: Vec<String>,
}

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: XyzParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("File contains no frames")]
    Empty,
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum XyzParseErrorKind {
    #[error("Invalid atom count '{0}'")]
    InvalidAtomCount(String),
    #[error("Invalid coordinate '{0}'")]
    InvalidFloat(String),
    #[error("Atom line needs a label and three coordinates")]
    MissingField,
    #[error("File ended inside a frame ({missing} more lines expected)")]
    UnexpectedEof { missing: usize },
}

/// Multi-frame XYZ: per frame an atom count line, a comment line and one
/// `label x y z` line per atom. Every frame is one configuration.
pub struct XyzFile;

impl CoordinateFile for XyzFile {
    type Metadata = XyzMetadata;
    type Error = XyzError;

    fn read_from<T: Real>(
        reader: &mut impl BufRead,
    ) -> Result<(LabelledBatch<T>, Self::Metadata), Self::Error> {
        let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));
        let mut labels: Option<Vec<String>> = None;
        let mut positions = Vec::new();
        let mut metadata = XyzMetadata::default();

        loop {
            let header = loop {
                match lines.next() {
                    Some((line, text)) => {
                        let text = text?;
                        if !text.trim().is_empty() {
                            break Some((line, text));
                        }
                    }
                    None => break None,
                }
            };
            let Some((count_line, count_text)) = header else {
                break;
            };

            let count: usize = count_text.trim().parse().map_err(|_| XyzError::Parse {
                line: count_line,
                kind: XyzParseErrorKind::InvalidAtomCount(count_text.trim().to_string()),
            })?;

            let (comment_line, comment) = lines.next().ok_or_else(|| XyzError::Parse {
                line: count_line + 1,
                kind: XyzParseErrorKind::UnexpectedEof {
                    missing: count.saturating_add(1),
                },
            })?;
            metadata.comments.push(comment?.trim_end().to_string());

            // The header is untrusted; grow with the lines actually read.
            let mut frame_labels = Vec::new();
            for k in 0..count {
                let (line, text) = lines.next().ok_or_else(|| XyzError::Parse {
                    line: comment_line + 1 + k,
                    kind: XyzParseErrorKind::UnexpectedEof { missing: count - k },
                })?;
                let text = text?;
                let (label, position) = parse_atom_line::<T>(line, &text)?;
                frame_labels.push(label);
                positions.push(position);
            }

            if let Some(first) = &labels {
                if *first != frame_labels {
                    return Err(XyzError::Inconsistency(format!(
                        "frame {} (line {}) has a different atom sequence than frame 0",
                        metadata.comments.len() - 1,
                        count_line
                    )));
                }
            } else {
                labels = Some(frame_labels);
            }
        }

        let labels = labels.ok_or(XyzError::Empty)?;
        let configurations = Configurations::new(labels.len(), positions)?;
        Ok((LabelledBatch::new(labels, configurations)?, metadata))
    }

    fn write_to<T: Real>(
        batch: &LabelledBatch<T>,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        for (index, frame) in batch.configurations.frames().enumerate() {
            writeln!(writer, "{}", frame.len())?;
            writeln!(
                writer,
                "{}",
                metadata.comments.get(index).map_or("", String::as_str)
            )?;
            for (label, p) in batch.labels.iter().zip(frame) {
                writeln!(
                    writer,
                    "{:<2} {:>18.10} {:>18.10} {:>18.10}",
                    label, p.x, p.y, p.z
                )?;
            }
        }
        Ok(())
    }
}

fn parse_atom_line<T: Real>(line: usize, text: &str) -> Result<(String, Point3<T>), XyzError> {
    let mut fields = text.split_whitespace();
    let label = fields.next().ok_or(XyzError::Parse {
        line,
        kind: XyzParseErrorKind::MissingField,
    })?;

    let mut xyz = [0.0f64; 3];
    for value in xyz.iter_mut() {
        let field = fields.next().ok_or(XyzError::Parse {
            line,
            kind: XyzParseErrorKind::MissingField,
        })?;
        *value = field.parse().map_err(|_| XyzError::Parse {
            line,
            kind: XyzParseErrorKind::InvalidFloat(field.to_string()),
        })?;
    }
    Ok((
        label.to_string(),
        Point3::new(real(xyz[0]), real(xyz[1]), real(xyz[2])),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const TWO_FRAMES: &str = "\
3
first frame
O   0.000  0.000  0.000
H   0.957  0.000  0.000
H  -0.240  0.927  0.000

3
second frame
O   1.000  0.000  0.000
H   1.957  0.000  0.000
H   0.760  0.927  0.000
";

    fn read(content: &str) -> Result<(LabelledBatch<f64>, XyzMetadata), XyzError> {
        XyzFile::read_from(&mut Cursor::new(content))
    }

    #[test]
    fn read_from_parses_every_frame_as_one_configuration() {
        let (batch, metadata) = read(TWO_FRAMES).unwrap();
        assert_eq!(batch.labels, vec!["O", "H", "H"]);
        assert_eq!(batch.configurations.cluster_count(), 2);
        assert_eq!(batch.configurations.frame(1)[0], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(metadata.comments, vec!["first frame", "second frame"]);
    }

    #[test]
    fn read_from_accepts_extra_columns_after_coordinates() {
        let content = "1\n\nO 1.0 2.0 3.0 -0.8\n";
        let (batch, _) = read(content).unwrap();
        assert_eq!(batch.configurations.frame(0)[0], Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn read_from_rejects_invalid_atom_count() {
        let result = read("three\ncomment\n");
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 1,
                kind: XyzParseErrorKind::InvalidAtomCount(_)
            })
        ));
    }

    #[test]
    fn read_from_rejects_invalid_coordinate() {
        let result = read("1\n\nO 0.0 abc 0.0\n");
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 3,
                kind: XyzParseErrorKind::InvalidFloat(_)
            })
        ));
    }

    #[test]
    fn read_from_rejects_truncated_frame() {
        let result = read("3\ncomment\nO 0.0 0.0 0.0\n");
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                kind: XyzParseErrorKind::UnexpectedEof { missing: 2 },
                ..
            })
        ));
    }

    #[test]
    fn read_from_reports_huge_atom_count_without_comment_as_truncated() {
        let result = read("18446744073709551615\n");
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 2,
                kind: XyzParseErrorKind::UnexpectedEof { missing: usize::MAX },
            })
        ));
    }

    #[test]
    fn read_from_reports_huge_atom_count_as_truncated_frame() {
        let result = read("18446744073709551615\ncomment\n");
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 3,
                kind: XyzParseErrorKind::UnexpectedEof { missing: usize::MAX },
            })
        ));

        let result = read("1000000000000000000\nc\nO 0 0 0\n");
        assert!(matches!(
            result,
            Err(XyzError::Parse {
                line: 4,
                kind: XyzParseErrorKind::UnexpectedEof {
                    missing: 999_999_999_999_999_999
                },
            })
        ));
    }

    #[test]
    fn read_from_rejects_frames_with_different_sequences() {
        let content = TWO_FRAMES.replacen("O   1.000", "H   1.000", 1);
        assert!(matches!(read(&content), Err(XyzError::Inconsistency(_))));
    }

    #[test]
    fn read_from_rejects_empty_input() {
        assert!(matches!(read("\n\n"), Err(XyzError::Empty)));
    }

    #[test]
    fn write_to_path_then_read_from_path_preserves_frames() {
        let (batch, metadata) = read(TWO_FRAMES).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xyz");
        XyzFile::write_to_path(&batch, &metadata, &path).unwrap();

        let (reread, remeta) = XyzFile::read_from_path::<f64, _>(&path).unwrap();
        assert_eq!(reread, batch);
        assert_eq!(remeta, metadata);
    }

    #[test]
    fn read_from_path_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = XyzFile::read_from_path::<f64, _>(dir.path().join("missing.xyz"));
        assert!(matches!(result, Err(XyzError::Io(_))));
    }
}
