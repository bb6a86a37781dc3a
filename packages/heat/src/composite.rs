//! Landsat 8 temperature / vegetation composite.
//!
//! Builds the expression for a per-pixel median of Landsat 8 Collection 2
//! Level 2 scenes over a region and date range. Each scene is reduced to
//! two bands before aggregation:
//!
//! - `LST`: `ST_B10 * 0.00341802 - 85.0`
//! - `NDVI`: `(SR_B5 - SR_B4) / (SR_B5 + SR_B4)`

use geodash_heat_models::{BoundingBox, DATE_FORMAT, DateRange, HeatLayer};
use serde_json::json;

use crate::expression::{Expression, Node};

/// Source image collection.
pub const COLLECTION_ID: &str = "LANDSAT/LC08/C02/T1_L2";

/// Multiplier applied to the thermal band.
pub const LST_SCALE: f64 = 0.003_418_02;

/// Offset added after scaling the thermal band.
pub const LST_OFFSET: f64 = -85.0;

const THERMAL_BAND: &str = "ST_B10";
const NIR_BAND: &str = "SR_B5";
const RED_BAND: &str = "SR_B4";

const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

/// Planar (non-geodesic) rectangle for `bbox`.
#[must_use]
pub fn rectangle(bbox: &BoundingBox) -> Node {
    Node::invoke(
        "GeometryConstructors.Rectangle",
        [
            ("coordinates", Node::constant(bbox.coordinates().to_vec())),
            ("crs", Node::constant("EPSG:4326")),
            ("geodesic", Node::constant(false)),
        ],
    )
}

fn filter(collection: Node, filter: Node) -> Node {
    Node::invoke(
        "Collection.filter",
        [("collection", collection), ("filter", filter)],
    )
}

fn date_filter(range: &DateRange) -> Node {
    let date_range = Node::invoke(
        "DateRange",
        [
            (
                "start",
                Node::constant(range.start().format(DATE_FORMAT).to_string()),
            ),
            (
                "end",
                Node::constant(range.end().format(DATE_FORMAT).to_string()),
            ),
        ],
    );

    Node::invoke(
        "Filter.dateRangeContains",
        [
            ("leftValue", date_range),
            ("rightField", Node::constant("system:time_start")),
        ],
    )
}

fn bounds_filter(geometry: Node) -> Node {
    Node::invoke(
        "Filter.intersects",
        [
            ("leftField", Node::constant(".all")),
            ("rightValue", geometry),
        ],
    )
}

fn select(image: Node, bands: &[&str]) -> Node {
    Node::invoke(
        "Image.select",
        [
            ("input", image),
            ("bandSelectors", Node::constant(json!(bands))),
        ],
    )
}

fn binary(function: &'static str, a: Node, b: Node) -> Node {
    Node::invoke(function, [("image1", a), ("image2", b)])
}

fn scalar(value: f64) -> Node {
    Node::invoke("Image.constant", [("value", Node::constant(value))])
}

fn rename(image: Node, name: &str) -> Node {
    Node::invoke(
        "Image.rename",
        [("input", image), ("names", Node::constant(json!([name])))],
    )
}

fn add_bands(dst: Node, src: Node) -> Node {
    Node::invoke("Image.addBands", [("dstImg", dst), ("srcImg", src)])
}

/// The per-scene mapping: an image with only `LST` and `NDVI` bands.
#[must_use]
pub fn process_image() -> Node {
    let image = Node::Argument(MAPPING_VAR);

    let lst = rename(
        binary(
            "Image.add",
            binary(
                "Image.multiply",
                select(image.clone(), &[THERMAL_BAND]),
                scalar(LST_SCALE),
            ),
            scalar(LST_OFFSET),
        ),
        HeatLayer::LandSurfaceTemperature.band(),
    );

    let nir = select(image.clone(), &[NIR_BAND]);
    let red = select(image.clone(), &[RED_BAND]);
    let ndvi = rename(
        binary(
            "Image.divide",
            binary("Image.subtract", nir.clone(), red.clone()),
            binary("Image.add", nir, red),
        ),
        HeatLayer::Ndvi.band(),
    );

    let empty = select(image, &[]);
    Node::function(vec![MAPPING_VAR], add_bands(add_bands(empty, lst), ndvi))
}

/// Median composite of the processed scenes, clipped to `bbox`.
#[must_use]
pub fn composite(bbox: &BoundingBox, range: &DateRange) -> Node {
    let region = rectangle(bbox);

    let scenes = Node::invoke(
        "ImageCollection.load",
        [("id", Node::constant(COLLECTION_ID))],
    );
    let scenes = filter(scenes, date_filter(range));
    let scenes = filter(scenes, bounds_filter(region.clone()));

    let processed = Node::invoke(
        "Collection.map",
        [("collection", scenes), ("baseAlgorithm", process_image())],
    );

    let median = Node::invoke("reduce.median", [("collection", processed)]);

    Node::invoke("Image.clip", [("input", median), ("geometry", region)])
}

/// A single layer's band of the composite.
#[must_use]
pub fn layer_expression(bbox: &BoundingBox, range: &DateRange, layer: HeatLayer) -> Expression {
    Expression::new(select(composite(bbox, range), &[layer.band()]))
}

/// Combined mean and standard deviation over `bbox` at `scale` meters.
///
/// The result dictionary is keyed `<band>_mean` and `<band>_stdDev`.
#[must_use]
pub fn stats_expression(bbox: &BoundingBox, range: &DateRange, scale: f64) -> Expression {
    let reducer = Node::invoke(
        "Reducer.combine",
        [
            ("reducer1", Node::invoke("Reducer.mean", [])),
            ("reducer2", Node::invoke("Reducer.stdDev", [])),
            ("sharedInputs", Node::constant(true)),
        ],
    );

    Expression::new(Node::invoke(
        "Image.reduceRegion",
        [
            ("image", composite(bbox, range)),
            ("reducer", reducer),
            ("geometry", rectangle(bbox)),
            ("scale", Node::constant(scale)),
        ],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kathmandu() -> BoundingBox {
        BoundingBox::new(85.25, 27.65, 85.45, 27.75).unwrap()
    }

    fn range() -> DateRange {
        DateRange::parse("2023-06-01", "2023-09-30").unwrap()
    }

    /// Collects every function name in the serialized graph.
    fn function_names(value: &serde_json::Value, out: &mut Vec<String>) {
        match value {
            serde_json::Value::Object(map) => {
                if let Some(name) = map.get("functionName").and_then(|v| v.as_str()) {
                    out.push(name.to_string());
                }
                for v in map.values() {
                    function_names(v, out);
                }
            }
            serde_json::Value::Array(items) => {
                for v in items {
                    function_names(v, out);
                }
            }
            _ => {}
        }
    }

    fn find_call<'a>(node: &'a Node, function: &str) -> Option<&'a Node> {
        match node {
            Node::Invoke {
                function: f,
                arguments,
            } => {
                if *f == function {
                    return Some(node);
                }
                arguments.iter().find_map(|(_, arg)| find_call(arg, function))
            }
            Node::Function { body, .. } => find_call(body, function),
            Node::Constant(_) | Node::Argument(_) => None,
        }
    }

    fn argument<'a>(node: &'a Node, name: &str) -> Option<&'a Node> {
        match node {
            Node::Invoke { arguments, .. } => arguments
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, arg)| arg),
            _ => None,
        }
    }

    #[test]
    fn composite_is_clipped_median_of_filtered_collection() {
        let node = composite(&kathmandu(), &range());

        let Node::Invoke { function, .. } = &node else {
            panic!("expected invocation");
        };
        assert_eq!(*function, "Image.clip");

        let load = find_call(&node, "ImageCollection.load").unwrap();
        assert_eq!(
            argument(load, "id"),
            Some(&Node::constant(COLLECTION_ID))
        );
        assert!(find_call(&node, "reduce.median").is_some());
        assert!(find_call(&node, "Filter.intersects").is_some());
    }

    #[test]
    fn date_filter_uses_iso_dates() {
        let node = composite(&kathmandu(), &range());
        let date_range = find_call(&node, "DateRange").unwrap();

        assert_eq!(argument(date_range, "start"), Some(&Node::constant("2023-06-01")));
        assert_eq!(argument(date_range, "end"), Some(&Node::constant("2023-09-30")));
    }

    #[test]
    fn rectangle_is_planar_wgs84() {
        let rect = rectangle(&kathmandu());
        assert_eq!(
            argument(&rect, "coordinates"),
            Some(&Node::constant(vec![85.25, 27.65, 85.45, 27.75]))
        );
        assert_eq!(argument(&rect, "geodesic"), Some(&Node::constant(false)));
    }

    #[test]
    fn lst_uses_thermal_scale_and_offset() {
        let process = process_image();
        let multiply = find_call(&process, "Image.multiply").unwrap();

        let Some(Node::Invoke { arguments, .. }) = argument(multiply, "image2") else {
            panic!("expected constant image");
        };
        assert_eq!(arguments[0].1, Node::constant(LST_SCALE));

        let select = argument(multiply, "image1").unwrap();
        assert_eq!(
            argument(select, "bandSelectors"),
            Some(&Node::constant(json!(["ST_B10"])))
        );
    }

    #[test]
    fn ndvi_divides_difference_by_sum() {
        let process = process_image();
        let divide = find_call(&process, "Image.divide").unwrap();

        let Some(Node::Invoke { function, .. }) = argument(divide, "image1") else {
            panic!("expected numerator");
        };
        assert_eq!(*function, "Image.subtract");

        let Some(Node::Invoke { function, .. }) = argument(divide, "image2") else {
            panic!("expected denominator");
        };
        assert_eq!(*function, "Image.add");
    }

    #[test]
    fn layer_expression_selects_layer_band() {
        let expr = layer_expression(&kathmandu(), &range(), HeatLayer::Ndvi);
        assert_eq!(
            argument(expr.root(), "bandSelectors"),
            Some(&Node::constant(json!(["NDVI"])))
        );
    }

    #[test]
    fn stats_combine_mean_and_std_dev() {
        let json = stats_expression(&kathmandu(), &range(), 30.0).to_json();
        let mut names = Vec::new();
        function_names(&json, &mut names);

        for expected in [
            "Image.reduceRegion",
            "Reducer.combine",
            "Reducer.mean",
            "Reducer.stdDev",
            "Collection.map",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }
}
