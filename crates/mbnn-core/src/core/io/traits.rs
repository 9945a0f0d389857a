use crate::core::models::configuration::LabelledBatch;
use crate::core::numeric::Real;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Common interface of coordinate file formats.
///
/// A file holds one or more configurations of the same labelled atom
/// layout. Implementors handle format-specific parsing and serialization;
/// the provided `*_path` methods add buffered file handling on top.
pub trait CoordinateFile {
    /// Format-specific data that does not fit the batch, e.g. comment lines.
    type Metadata;

    type Error: Error + From<io::Error>;

    fn read_from<T: Real>(
        reader: &mut impl BufRead,
    ) -> Result<(LabelledBatch<T>, Self::Metadata), Self::Error>;

    fn write_to<T: Real>(
        batch: &LabelledBatch<T>,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    fn read_from_path<T: Real, P: AsRef<Path>>(
        path: P,
    ) -> Result<(LabelledBatch<T>, Self::Metadata), Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<T: Real, P: AsRef<Path>>(
        batch: &LabelledBatch<T>,
        metadata: &Self::Metadata,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(batch, metadata, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
