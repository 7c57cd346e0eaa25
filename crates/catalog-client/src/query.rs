//! Catalog query construction.

use chrono::NaiveDate;
use msi_common::Region;

/// A Sentinel-2 L1C product query: search polygon, acquisition date range
/// and cloud-cover window.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Search region in geographic coordinates.
    pub region: Region,
    /// First acquisition date, inclusive.
    pub start: NaiveDate,
    /// Last acquisition date, exclusive.
    pub end: NaiveDate,
    /// Cloud-cover percentage window (min, max).
    pub cloud_cover: (f64, f64),
}

impl ProductQuery {
    /// Build the OData `$filter` expression for the Copernicus Data Space
    /// catalogue: SENTINEL-2 collection, S2MSI1C product type, polygon
    /// intersection, date range and cloud-cover window.
    pub fn odata_filter(&self) -> String {
        let polygon = self.region.bbox.to_wkt_polygon();
        let (cloud_min, cloud_max) = self.cloud_cover;
        format!(
            "Collection/Name eq 'SENTINEL-2' \
             and Attributes/OData.CSC.StringAttribute/any(att:att/Name eq 'productType' \
             and att/OData.CSC.StringAttribute/Value eq 'S2MSI1C') \
             and OData.CSC.Intersects(area=geography'SRID=4326;{polygon}') \
             and ContentDate/Start ge {start}T00:00:00.000Z \
             and ContentDate/Start lt {end}T00:00:00.000Z \
             and Attributes/OData.CSC.DoubleAttribute/any(att:att/Name eq 'cloudCover' \
             and att/OData.CSC.DoubleAttribute/Value ge {cloud_min} \
             and att/OData.CSC.DoubleAttribute/Value le {cloud_max})",
            start = self.start,
            end = self.end,
        )
    }

    /// Short human-readable description, used in error messages.
    pub fn describe(&self) -> String {
        format!(
            "region [{}, {}, {}, {}], dates {}..{}, cloud cover {}..{}%",
            self.region.bbox.min_x,
            self.region.bbox.min_y,
            self.region.bbox.max_x,
            self.region.bbox.max_y,
            self.start,
            self.end,
            self.cloud_cover.0,
            self.cloud_cover.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msi_common::EpsgCode;

    fn query() -> ProductQuery {
        ProductQuery {
            region: Region::from_corners(-67.71, 49.28, -67.67, 49.31, EpsgCode::WGS84)
                .unwrap(),
            start: NaiveDate::from_ymd_opt(2019, 7, 4).unwrap(),
            end: NaiveDate::from_ymd_opt(2019, 7, 5).unwrap(),
            cloud_cover: (0.0, 10.0),
        }
    }

    #[test]
    fn test_filter_contains_all_clauses() {
        let filter = query().odata_filter();
        assert!(filter.contains("Collection/Name eq 'SENTINEL-2'"));
        assert!(filter.contains("'S2MSI1C'"));
        assert!(filter.contains("SRID=4326;POLYGON(("));
        assert!(filter.contains("ContentDate/Start ge 2019-07-04T00:00:00.000Z"));
        assert!(filter.contains("ContentDate/Start lt 2019-07-05T00:00:00.000Z"));
        assert!(filter.contains("Value ge 0"));
        assert!(filter.contains("Value le 10"));
    }

    #[test]
    fn test_describe_mentions_inputs() {
        let desc = query().describe();
        assert!(desc.contains("2019-07-04"));
        assert!(desc.contains("cloud cover 0..10%"));
    }
}
