use crate::{Grid3, Stencil};
use anyhow::{anyhow, Context, Result};
use flate2::{read::GzDecoder, read::GzEncoder, Compression};
use std::{io::Read, path::Path};

/// Supported formats for dumping a solution field.
///
/// Every format stores all `(N+2)³` cells, halo included, in row-major
/// `(i, j, k)` order, so dumps of the same field are bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    /// Raw little-endian `f64` values without a header.
    /// The grid size is recovered from the length of the data.
    Binary,

    /// Gzip-compressed [`FieldFormat::Binary`].
    CompressedBinary,

    /// [Legacy VTK](https://docs.vtk.org/en/latest/design_documents/VTKFileFormats.html)
    /// structured points with big-endian binary doubles, for visualization.
    ///
    /// Export only.
    Vtk,
}

impl FieldFormat {
    /// Picks the format from the file extension: `.bin`, `.bin.gz` or `.vtk`.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_str()?;
        if name.ends_with(".bin.gz") {
            Some(FieldFormat::CompressedBinary)
        } else if name.ends_with(".bin") {
            Some(FieldFormat::Binary)
        } else if name.ends_with(".vtk") {
            Some(FieldFormat::Vtk)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FieldFormat::Binary => "bin",
            FieldFormat::CompressedBinary => "bin.gz",
            FieldFormat::Vtk => "vtk",
        }
    }
}

/// Serializes `grid` in the given format.
pub fn write_field(grid: &Grid3, format: FieldFormat) -> Result<Vec<u8>> {
    match format {
        FieldFormat::Binary => Ok(to_binary(grid)),
        FieldFormat::CompressedBinary => {
            let raw = to_binary(grid);
            let mut encoder = GzEncoder::new(&raw[..], Compression::default());
            let mut compressed = Vec::new();
            encoder
                .read_to_end(&mut compressed)
                .context("Failed to compress field data")?;
            Ok(compressed)
        }
        FieldFormat::Vtk => Ok(to_vtk(grid)),
    }
}

/// Largest grid side, halo included, accepted from compressed dumps.
const MAX_COMPRESSED_SIDE: u64 = 1026;
const MAX_DECOMPRESSED_BYTES: u64 =
    MAX_COMPRESSED_SIDE * MAX_COMPRESSED_SIDE * MAX_COMPRESSED_SIDE * size_of::<f64>() as u64;

/// Deserializes a grid from the given format.
///
/// # Errors
///
/// Returns an error for [`FieldFormat::Vtk`], if decompression fails, or if the
/// data is not a whole number of `f64` values forming a cube of side at least 3.
/// Compressed data may expand to at most `1026³` values.
pub fn read_field(format: FieldFormat, data: &[u8]) -> Result<Grid3> {
    match format {
        FieldFormat::Binary => from_binary(data),
        FieldFormat::CompressedBinary => from_binary(&gunzip(data, MAX_DECOMPRESSED_BYTES)?),
        FieldFormat::Vtk => Err(anyhow!("Reading VTK files is not supported")),
    }
}

/// Writes `grid` to `path` in the format given by its extension.
pub fn to_file(grid: &Grid3, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = FieldFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unknown field format of {}", path.display()))?;
    let data = write_field(grid, format)?;
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

/// Reads a grid from `path` in the format given by its extension.
pub fn from_file(path: impl AsRef<Path>) -> Result<Grid3> {
    let path = path.as_ref();
    let format = FieldFormat::from_path(path)
        .ok_or_else(|| anyhow!("Unknown field format of {}", path.display()))?;
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    read_field(format, &data)
}

fn gunzip(data: &[u8], limit: u64) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    GzDecoder::new(data)
        .take(limit + 1)
        .read_to_end(&mut raw)
        .context("Failed to decompress field data")?;
    if raw.len() as u64 > limit {
        return Err(anyhow!("Decompressed field data exceeds {} bytes", limit));
    }
    Ok(raw)
}

fn to_binary(grid: &Grid3) -> Vec<u8> {
    grid.cells().iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn from_binary(data: &[u8]) -> Result<Grid3> {
    const WIDTH: usize = size_of::<f64>();
    if data.len() % WIDTH != 0 {
        return Err(anyhow!(
            "Field data length {} is not a multiple of {}",
            data.len(),
            WIDTH
        ));
    }
    let cells = data.len() / WIDTH;
    let side = (cells as f64).cbrt().round() as usize;
    if side < 3 || side.checked_pow(3) != Some(cells) {
        return Err(anyhow!("{} cells do not form a grid with a halo", cells));
    }

    let values = data
        .chunks_exact(WIDTH)
        .map(|chunk| {
            let mut bytes = [0; WIDTH];
            bytes.copy_from_slice(chunk);
            f64::from_le_bytes(bytes)
        })
        .collect();
    Grid3::from_cells(side - 2, values)
}

fn to_vtk(grid: &Grid3) -> Vec<u8> {
    let side = grid.side();
    let h = Stencil::new(grid.n()).h();
    let header = format!(
        "# vtk DataFile Version 3.0\n\
         Poisson solution, n = {n}\n\
         BINARY\n\
         DATASET STRUCTURED_POINTS\n\
         DIMENSIONS {side} {side} {side}\n\
         ORIGIN -1 -1 -1\n\
         SPACING {h} {h} {h}\n\
         POINT_DATA {points}\n\
         SCALARS gray double 1\n\
         LOOKUP_TABLE default\n",
        n = grid.n(),
        side = side,
        h = h,
        points = grid.cells().len(),
    );
    let mut data = header.into_bytes();
    data.reserve(grid.cells().len() * size_of::<f64>());
    data.extend(grid.cells().iter().flat_map(|x| x.to_be_bytes()));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Problem;
    const SEED: u64 = 42;

    fn sample(n: usize) -> Grid3 {
        let (_, initial) = Problem::uniform(n, 20.0, 0.0)
            .unwrap()
            .with_random_interior(SEED, -5.0..5.0)
            .unwrap()
            .into_parts();
        initial
    }

    #[test]
    fn test_binary_roundtrip() {
        for format in [FieldFormat::Binary, FieldFormat::CompressedBinary] {
            for n in [1, 4, 7] {
                let grid = sample(n);
                let data = write_field(&grid, format).unwrap();
                assert_eq!(read_field(format, &data).unwrap(), grid);
            }
        }
    }

    #[test]
    fn test_binary_is_row_major() {
        let mut grid = Grid3::zeros(1).unwrap();
        grid[(0, 0, 1)] = 1.0;
        grid[(2, 2, 2)] = 2.0;
        let data = write_field(&grid, FieldFormat::Binary).unwrap();
        assert_eq!(data.len(), 27 * 8);
        assert_eq!(data[8..16], 1.0f64.to_le_bytes());
        assert_eq!(data[26 * 8..], 2.0f64.to_le_bytes());
    }

    #[test]
    fn test_binary_rejects_bad_lengths() {
        assert!(read_field(FieldFormat::Binary, &[0; 7]).is_err());
        // 8 cells is a cube, but without room for a halo
        assert!(read_field(FieldFormat::Binary, &[0; 64]).is_err());
        assert!(read_field(FieldFormat::Binary, &[0; 28 * 8]).is_err());
        assert!(read_field(FieldFormat::CompressedBinary, &[1, 2, 3]).is_err());
    }

    #[test]
    fn test_decompression_is_bounded() {
        let grid = sample(4);
        let raw = write_field(&grid, FieldFormat::Binary).unwrap();
        let data = write_field(&grid, FieldFormat::CompressedBinary).unwrap();
        let limit = raw.len() as u64;
        assert_eq!(gunzip(&data, limit).unwrap(), raw);
        let err = gunzip(&data, limit - 1).unwrap_err();
        assert!(err.to_string().contains("exceeds"));

        // a few KiB of gzip that would inflate far past the limit
        let zeros = vec![0u8; 1 << 20];
        let mut inflating = Vec::new();
        GzEncoder::new(&zeros[..], Compression::best())
            .read_to_end(&mut inflating)
            .unwrap();
        assert!(inflating.len() < zeros.len() / 100);
        assert!(gunzip(&inflating, 1 << 16).is_err());
    }

    #[test]
    fn test_vtk_layout() {
        let grid = sample(4);
        let data = write_field(&grid, FieldFormat::Vtk).unwrap();
        let payload = grid.cells().len() * 8;
        let header = std::str::from_utf8(&data[..data.len() - payload]).unwrap();
        assert!(header.starts_with("# vtk DataFile Version 3.0\n"));
        assert!(header.contains("DIMENSIONS 6 6 6\n"));
        assert!(header.contains("SPACING 0.5 0.5 0.5\n"));
        assert!(header.contains("POINT_DATA 216\n"));
        assert!(header.ends_with("LOOKUP_TABLE default\n"));
        assert_eq!(data[data.len() - 8..], grid.cells()[215].to_be_bytes());
        assert!(read_field(FieldFormat::Vtk, &data).is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            FieldFormat::from_path("out/poisson_res_100.bin"),
            Some(FieldFormat::Binary)
        );
        assert_eq!(
            FieldFormat::from_path("poisson_res_100.bin.gz"),
            Some(FieldFormat::CompressedBinary)
        );
        assert_eq!(FieldFormat::from_path("a.vtk"), Some(FieldFormat::Vtk));
        assert_eq!(FieldFormat::from_path("a.txt"), None);
        for format in [FieldFormat::Binary, FieldFormat::CompressedBinary, FieldFormat::Vtk] {
            let name = format!("field.{}", format.extension());
            assert_eq!(FieldFormat::from_path(name), Some(format));
        }
    }
}
