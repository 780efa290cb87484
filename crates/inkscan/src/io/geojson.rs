use geo_types::{coord, Rect};
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use crate::{
    error::Result,
    pipeline::TracedLines,
    types::Region,
};

impl TracedLines {
    /// Export every region's bounding box as a GeoJSON polygon feature.
    ///
    /// Boxes are expressed in pixel-edge coordinates, so a single pixel at
    /// `(x, y)` becomes the unit square from `(x, y)` to `(x + 1, y + 1)`.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .lines
            .iter()
            .enumerate()
            .flat_map(|(line, l)| l.regions.iter().map(move |region| (line, region)))
            .enumerate()
            .map(|(id, (line, region))| region_feature(id, line, region))
            .collect();

        let mut foreign_members = JsonObject::new();
        foreign_members.insert("image_width".to_string(), self.bitmap_width.into());
        foreign_members.insert("image_height".to_string(), self.bitmap_height.into());
        foreign_members.insert("region_count".to_string(), self.region_count().into());
        foreign_members.insert("line_count".to_string(), self.lines.len().into());

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson())?)
    }

    /// Save as a GeoJSON file
    pub fn save_geojson(&self, path: &str) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

fn region_feature(id: usize, line: usize, region: &Region) -> Feature {
    let bounds = Rect::new(
        coord! { x: region.start_x as f64, y: region.start_y as f64 },
        coord! { x: region.end_x as f64 + 1.0, y: region.end_y as f64 + 1.0 },
    );
    let geometry = Geometry::new(Value::from(&bounds.to_polygon()));

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), id.into());
    properties.insert("line".to_string(), line.into());
    properties.insert("point_count".to_string(), region.point_count().into());
    properties.insert("width".to_string(), region.width().into());
    properties.insert("height".to_string(), region.height().into());
    properties.insert("density".to_string(), region.density().into());

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: Some(Id::Number(id.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Line;

    fn traced() -> TracedLines {
        let mut first = Region::new(2, 3);
        first.add_point(3, 3);
        let second = Region::new(10, 3);
        let third = Region::new(0, 40);
        TracedLines {
            lines: vec![
                Line { reference_y: 3, regions: vec![first, second] },
                Line { reference_y: 40, regions: vec![third] },
            ],
            bitmap_width: 50,
            bitmap_height: 60,
        }
    }

    #[test]
    fn test_one_feature_per_region() {
        let collection = traced().to_geojson();
        assert_eq!(collection.features.len(), 3);

        let members = collection.foreign_members.unwrap();
        assert_eq!(members["region_count"], 3);
        assert_eq!(members["line_count"], 2);
        assert_eq!(members["image_width"], 50);
    }

    #[test]
    fn test_feature_properties_track_lines() {
        let collection = traced().to_geojson();
        let last = collection.features[2].properties.as_ref().unwrap();
        assert_eq!(last["id"], 2);
        assert_eq!(last["line"], 1);

        let first = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(first["point_count"], 2);
        assert_eq!(first["width"], 1);
        assert_eq!(first["height"], 0);
    }

    #[test]
    fn test_boxes_cover_whole_pixels() {
        let collection = traced().to_geojson();
        let geometry = collection.features[1].geometry.as_ref().unwrap();
        let Value::Polygon(rings) = &geometry.value else {
            panic!("expected polygon, got {:?}", geometry.value);
        };
        let xs: Vec<f64> = rings[0].iter().map(|p| p[0]).collect();
        let ys: Vec<f64> = rings[0].iter().map(|p| p[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 11.0);
        assert_eq!(ys.iter().cloned().fold(f64::INFINITY, f64::min), 3.0);
        assert_eq!(ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 4.0);
    }

    #[test]
    fn test_geojson_string_parses_back() {
        let text = traced().to_geojson_string().unwrap();
        let parsed: geojson::GeoJson = text.parse().unwrap();
        assert!(matches!(parsed, geojson::GeoJson::FeatureCollection(_)));
    }

    #[test]
    fn test_save_geojson_writes_file() {
        let path = std::env::temp_dir().join("inkscan_save_geojson_test.geojson");
        let path = path.to_str().unwrap();
        traced().save_geojson(path).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, traced().to_geojson_string().unwrap());
        std::fs::remove_file(path).unwrap();
    }
}
