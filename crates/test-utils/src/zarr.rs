//! Tiny Zarr stores for resolution tests.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs_filesystem::FilesystemStore;

/// Write a Zarr hierarchy at `path`: a root group carrying `attrs` and one
/// 2x2 float array per name in `variables`.
pub fn write_zarr_store(
    path: &Path,
    attrs: Map<String, Value>,
    variables: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(path)?;
    let store = Arc::new(FilesystemStore::new(path)?);

    let group = GroupBuilder::new().attributes(attrs).build(store.clone(), "/")?;
    group.store_metadata()?;

    for (i, name) in variables.iter().enumerate() {
        let array = ArrayBuilder::new(
            vec![2, 2],
            DataType::Float32,
            vec![2, 2].try_into()?,
            FillValue::from(f32::NAN),
        )
        .build(store.clone(), &format!("/{}", name))?;
        array.store_metadata()?;

        let subset = ArraySubset::new_with_start_shape(vec![0, 0], vec![2, 2])?;
        let base = i as f32;
        array.store_array_subset_elements(&subset, &[base, base + 1.0, base + 2.0, base + 3.0])?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_zarr_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.zarr");
        let mut attrs = Map::new();
        attrs.insert("title".into(), Value::from("tiny"));

        write_zarr_store(&path, attrs, &["temp", "precip"]).unwrap();

        assert!(path.join("zarr.json").exists());
        assert!(path.join("temp").join("zarr.json").exists());
        assert!(path.join("precip").join("zarr.json").exists());
    }
}
