use super::{FieldType, Table};
use anyhow::{Result, anyhow};
use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};

/// Point FeatureCollection; numeric columns other than the coordinates become properties.
pub fn feature_collection(table: &Table) -> Result<FeatureCollection> {
    let lat = table.require_column("latitude")?;
    let lon = table.require_column("longitude")?;
    let properties: Vec<usize> = (0..table.columns.len())
        .filter(|&i| i != lat && i != lon && table.field_type(i) != FieldType::String)
        .collect();

    let features = table
        .rows
        .iter()
        .enumerate()
        .map(|(n, row)| -> Result<Feature> {
            let coordinate = |i: usize| {
                row[i]
                    .as_f64()
                    .ok_or_else(|| anyhow!("row {} has a non-numeric {}", n + 1, table.columns[i]))
            };
            let mut props = JsonObject::new();
            for &i in &properties {
                props.insert(table.columns[i].clone(), serde_json::to_value(&row[i])?);
            }
            let point = GeoValue::Point(vec![coordinate(lon)?, coordinate(lat)?]);
            Ok(Feature {
                bbox: None,
                geometry: Some(Geometry::new(point)),
                id: None,
                properties: Some(props),
                foreign_members: None,
            })
        })
        .collect::<Result<Vec<Feature>>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
