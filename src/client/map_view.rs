//! Map view model: dataset sources and layers for a renderer, the drawing
//! mode, and the measurement of the last committed shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::measure::{area_square_km, length_km_miles};
use crate::models::dataset::Dataset;

pub const DEFAULT_CENTER: [f64; 2] = [-74.5, 40.0];
pub const DEFAULT_ZOOM: f64 = 12.0;
pub const MAP_STYLE: &str = "mapbox://styles/mapbox/streets-v11";
pub const DRAW_PROMPT: &str = "Click the map to draw a shape.";

const LINE_COLOR: &str = "#ff0000";
const LINE_WIDTH: f64 = 3.0;
const FILL_COLOR: &str = "#0000ff";
const FILL_OPACITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Idle,
    Drawing(ShapeKind),
    /// A shape of this kind was measured and is on the map
    Committed(ShapeKind),
}

impl DrawMode {
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            DrawMode::Idle => None,
            DrawMode::Drawing(kind) | DrawMode::Committed(kind) => Some(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawEvent {
    Create,
    Update,
    Delete,
}

/// GeoJSON geometry of a drawn feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Point(_) => ShapeKind::Point,
            Geometry::LineString(_) => ShapeKind::LineString,
            Geometry::Polygon(_) => ShapeKind::Polygon,
        }
    }
}

/// A feature as reported by the drawing tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawnShape {
    pub id: String,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedPoint {
    pub id: String,
    pub coordinates: [f64; 2],
}

/// What the calculation box shows. Only one category at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    Empty,
    Area { square_km: f64 },
    Length { km: f64, miles: f64 },
    Points(Vec<PlacedPoint>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// The shape was measured and should be handed to the parent
    Committed(DrawnShape),
    /// A deletion was applied; nothing new goes to the parent
    Cleared,
    /// Nothing drawn, ask the user to draw
    Prompt(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerPaint {
    Line {
        #[serde(rename = "line-color")]
        color: &'static str,
        #[serde(rename = "line-width")]
        width: f64,
    },
    Fill {
        #[serde(rename = "fill-color")]
        color: &'static str,
        #[serde(rename = "fill-opacity")]
        opacity: f64,
    },
}

/// One GeoJSON source plus its single layer, both named after the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub paint: LayerPaint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapOptions {
    pub center: [f64; 2],
    pub zoom: f64,
    pub style: &'static str,
}

fn first_geometry(dataset: &Dataset) -> Option<&Value> {
    dataset
        .data
        .get("features")?
        .as_array()?
        .first()?
        .get("geometry")
}

/// Descend through nested coordinate arrays to the first position
fn first_position(coordinates: &Value) -> Option<[f64; 2]> {
    let items = coordinates.as_array()?;
    match items.first()? {
        Value::Array(_) => first_position(&items[0]),
        first => {
            let lon = first.as_f64()?;
            let lat = items.get(1)?.as_f64()?;
            Some([lon, lat])
        }
    }
}

/// Centre on the first dataset's first position, or the default
pub fn initial_options(datasets: &[Dataset]) -> MapOptions {
    let center = datasets
        .first()
        .and_then(first_geometry)
        .and_then(|geometry| geometry.get("coordinates"))
        .and_then(first_position)
        .unwrap_or(DEFAULT_CENTER);

    MapOptions {
        center,
        zoom: DEFAULT_ZOOM,
        style: MAP_STYLE,
    }
}

pub fn plan_layer(dataset: &Dataset) -> LayerSpec {
    let is_line = first_geometry(dataset)
        .and_then(|geometry| geometry.get("type"))
        .and_then(Value::as_str)
        == Some("LineString");

    let paint = if is_line {
        LayerPaint::Line {
            color: LINE_COLOR,
            width: LINE_WIDTH,
        }
    } else {
        LayerPaint::Fill {
            color: FILL_COLOR,
            opacity: FILL_OPACITY,
        }
    };

    LayerSpec {
        id: dataset.id.clone(),
        source: dataset.id.clone(),
        paint,
    }
}

pub fn plan_layers(datasets: &[Dataset]) -> Vec<LayerSpec> {
    datasets.iter().map(plan_layer).collect()
}

pub struct MapView {
    mode: DrawMode,
    measurement: Measurement,
    /// Feature behind an area or length measurement
    measured_id: Option<String>,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new()
    }
}

impl MapView {
    pub fn new() -> Self {
        Self {
            mode: DrawMode::Idle,
            measurement: Measurement::Empty,
            measured_id: None,
        }
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    pub fn measurement(&self) -> &Measurement {
        &self.measurement
    }

    fn clear_measurement(&mut self) {
        self.measurement = Measurement::Empty;
        self.measured_id = None;
    }

    /// Switching to another shape kind resets the calculation box
    pub fn set_mode(&mut self, mode: DrawMode) {
        if mode.shape_kind() != self.mode.shape_kind() {
            self.clear_measurement();
        }
        self.mode = mode;
    }

    /// Handle a draw event.
    ///
    /// `changed` holds the features the event is about (created, moved or
    /// deleted); `features` is everything the drawing tool holds afterwards.
    pub fn on_draw(
        &mut self,
        event: DrawEvent,
        changed: &[DrawnShape],
        features: &[DrawnShape],
    ) -> DrawOutcome {
        if features.is_empty() {
            self.clear_measurement();
            return match event {
                DrawEvent::Delete => {
                    self.mode = DrawMode::Idle;
                    DrawOutcome::Cleared
                }
                DrawEvent::Create | DrawEvent::Update => DrawOutcome::Prompt(DRAW_PROMPT),
            };
        }

        if event == DrawEvent::Delete {
            self.forget_missing(features);
            debug!(removed = changed.len(), remaining = features.len(), "Shapes deleted");
            return DrawOutcome::Cleared;
        }

        let Some(shape) = changed.last().or_else(|| features.last()) else {
            return DrawOutcome::Prompt(DRAW_PROMPT);
        };

        self.commit(shape);
        self.mode = DrawMode::Committed(shape.geometry.kind());
        debug!(shape_id = %shape.id, kind = ?shape.geometry.kind(), event = ?event, "Shape committed");
        DrawOutcome::Committed(shape.clone())
    }

    /// Drop measurements whose feature is no longer on the map
    fn forget_missing(&mut self, features: &[DrawnShape]) {
        let present = |id: &str| features.iter().any(|f| f.id == id);

        let now_empty = match &mut self.measurement {
            Measurement::Points(points) => {
                points.retain(|p| present(&p.id));
                points.is_empty()
            }
            Measurement::Area { .. } | Measurement::Length { .. } => {
                !self.measured_id.as_deref().is_some_and(present)
            }
            Measurement::Empty => false,
        };

        if now_empty {
            self.clear_measurement();
        }
    }

    fn commit(&mut self, shape: &DrawnShape) {
        match &shape.geometry {
            Geometry::Polygon(rings) => {
                self.measurement = Measurement::Area {
                    square_km: area_square_km(rings),
                };
                self.measured_id = Some(shape.id.clone());
            }
            Geometry::LineString(line) => {
                let (km, miles) = length_km_miles(line);
                self.measurement = Measurement::Length { km, miles };
                self.measured_id = Some(shape.id.clone());
            }
            Geometry::Point(coordinates) => {
                let point = PlacedPoint {
                    id: shape.id.clone(),
                    coordinates: *coordinates,
                };
                self.measured_id = None;

                if let Measurement::Points(points) = &mut self.measurement {
                    // A moved point keeps its slot
                    match points.iter_mut().find(|p| p.id == point.id) {
                        Some(existing) => existing.coordinates = point.coordinates,
                        None => points.push(point),
                    }
                } else {
                    self.measurement = Measurement::Points(vec![point]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::measure::AREA_EARTH_RADIUS_M;
    use serde_json::json;

    fn point(id: &str, lon: f64, lat: f64) -> DrawnShape {
        DrawnShape {
            id: id.to_string(),
            geometry: Geometry::Point([lon, lat]),
        }
    }

    fn square(id: &str) -> DrawnShape {
        let side = (1000.0 / AREA_EARTH_RADIUS_M).to_degrees();
        DrawnShape {
            id: id.to_string(),
            geometry: Geometry::Polygon(vec![vec![
                [0.0, 0.0],
                [side, 0.0],
                [side, side],
                [0.0, side],
                [0.0, 0.0],
            ]]),
        }
    }

    fn line_dataset(id: &str) -> Dataset {
        Dataset::new(
            id.to_string(),
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "LineString", "coordinates": [[-73.9, 40.7], [-73.8, 40.8]]}
                }]
            }),
        )
    }

    fn polygon_dataset(id: &str) -> Dataset {
        Dataset::new(
            id.to_string(),
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[10.0, 50.0], [10.1, 50.0], [10.1, 50.1], [10.0, 50.0]]]
                    }
                }]
            }),
        )
    }

    #[test]
    fn test_points_accumulate_then_polygon_clears() {
        let mut view = MapView::new();

        let a = point("a", 1.0, 2.0);
        let b = point("b", 3.0, 4.0);
        view.on_draw(DrawEvent::Create, &[a.clone()], &[a.clone()]);
        view.on_draw(DrawEvent::Create, &[b.clone()], &[a, b]);
        match view.measurement() {
            Measurement::Points(points) => {
                assert_eq!(points.len(), 2);
                assert_eq!(points[1].coordinates, [3.0, 4.0]);
            }
            other => panic!("expected points, got {:?}", other),
        }

        let outcome = view.on_draw(DrawEvent::Create, &[square("sq")], &[square("sq")]);
        assert!(matches!(outcome, DrawOutcome::Committed(ref s) if s.id == "sq"));
        assert_eq!(view.mode(), DrawMode::Committed(ShapeKind::Polygon));
        match view.measurement() {
            Measurement::Area { square_km } => assert!((square_km - 1.0).abs() < 0.011),
            other => panic!("expected area, got {:?}", other),
        }
    }

    #[test]
    fn test_line_measurement() {
        let mut view = MapView::new();
        let line = DrawnShape {
            id: "l".to_string(),
            geometry: Geometry::LineString(vec![[0.0, 0.0], [0.0, 1.0]]),
        };

        view.on_draw(DrawEvent::Update, &[line.clone()], &[line]);
        assert_eq!(
            view.measurement(),
            &Measurement::Length {
                km: 111.2,
                miles: 69.05
            }
        );
    }

    #[test]
    fn test_empty_collection() {
        let mut view = MapView::new();
        view.on_draw(DrawEvent::Create, &[square("sq")], &[square("sq")]);

        assert_eq!(
            view.on_draw(DrawEvent::Delete, &[square("sq")], &[]),
            DrawOutcome::Cleared
        );
        assert_eq!(view.measurement(), &Measurement::Empty);
        assert_eq!(view.mode(), DrawMode::Idle);

        assert_eq!(
            view.on_draw(DrawEvent::Update, &[], &[]),
            DrawOutcome::Prompt(DRAW_PROMPT)
        );
    }

    #[test]
    fn test_mode_switch_resets_measurement() {
        let mut view = MapView::new();
        view.set_mode(DrawMode::Drawing(ShapeKind::Polygon));
        view.on_draw(DrawEvent::Create, &[square("sq")], &[square("sq")]);

        view.set_mode(DrawMode::Drawing(ShapeKind::Polygon));
        assert!(matches!(view.measurement(), Measurement::Area { .. }));

        view.set_mode(DrawMode::Drawing(ShapeKind::LineString));
        assert_eq!(view.measurement(), &Measurement::Empty);
        assert_eq!(view.mode(), DrawMode::Drawing(ShapeKind::LineString));
    }

    fn point_ids(view: &MapView) -> Vec<&str> {
        match view.measurement() {
            Measurement::Points(points) => points.iter().map(|p| p.id.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    #[test]
    fn test_deleting_one_point_keeps_the_others() {
        let mut view = MapView::new();
        let (a, b, c) = (point("a", 0.0, 0.0), point("b", 1.0, 1.0), point("c", 2.0, 2.0));
        view.on_draw(DrawEvent::Create, &[a.clone()], &[a.clone()]);
        view.on_draw(DrawEvent::Create, &[b.clone()], &[a.clone(), b.clone()]);
        view.on_draw(DrawEvent::Create, &[c.clone()], &[a.clone(), b.clone(), c.clone()]);

        let outcome = view.on_draw(DrawEvent::Delete, &[c], &[a.clone(), b.clone()]);
        assert_eq!(outcome, DrawOutcome::Cleared);
        assert_eq!(point_ids(&view), vec!["a", "b"]);

        view.on_draw(DrawEvent::Delete, &[a, b], &[square("sq")]);
        assert_eq!(view.measurement(), &Measurement::Empty);
    }

    #[test]
    fn test_moving_a_point_updates_in_place() {
        let mut view = MapView::new();
        let (a, b) = (point("a", 0.0, 0.0), point("b", 1.0, 1.0));
        view.on_draw(DrawEvent::Create, &[a.clone()], &[a.clone()]);
        view.on_draw(DrawEvent::Create, &[b.clone()], &[a.clone(), b.clone()]);

        let moved = point("a", 5.0, 6.0);
        let outcome = view.on_draw(DrawEvent::Update, &[moved.clone()], &[moved.clone(), b]);
        assert_eq!(outcome, DrawOutcome::Committed(moved));

        assert_eq!(point_ids(&view), vec!["a", "b"]);
        match view.measurement() {
            Measurement::Points(points) => assert_eq!(points[0].coordinates, [5.0, 6.0]),
            other => panic!("expected points, got {:?}", other),
        }
    }

    #[test]
    fn test_deleting_other_shape_keeps_area() {
        let mut view = MapView::new();
        let p = point("p", 0.0, 0.0);
        view.on_draw(DrawEvent::Create, &[square("sq")], &[square("sq")]);

        view.on_draw(DrawEvent::Delete, &[p], &[square("sq")]);
        assert!(matches!(view.measurement(), Measurement::Area { .. }));

        let line = DrawnShape {
            id: "l".to_string(),
            geometry: Geometry::LineString(vec![[0.0, 0.0], [0.0, 1.0]]),
        };
        view.on_draw(DrawEvent::Delete, &[square("sq")], &[line]);
        assert_eq!(view.measurement(), &Measurement::Empty);
    }

    #[test]
    fn test_drawn_shape_from_geojson_feature() {
        let shape: DrawnShape = serde_json::from_value(json!({
            "id": "f1",
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Point", "coordinates": [-74.0, 40.7]}
        }))
        .unwrap();

        assert_eq!(shape.geometry, Geometry::Point([-74.0, 40.7]));
        assert_eq!(shape.geometry.kind(), ShapeKind::Point);
    }

    #[test]
    fn test_layer_plan() {
        let layers = plan_layers(&[line_dataset("1"), polygon_dataset("2")]);

        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].source, "1");
        assert_eq!(
            layers[0].paint,
            LayerPaint::Line {
                color: "#ff0000",
                width: 3.0
            }
        );
        assert_eq!(
            layers[1].paint,
            LayerPaint::Fill {
                color: "#0000ff",
                opacity: 0.5
            }
        );

        let paint = serde_json::to_value(&layers[0].paint).unwrap();
        assert_eq!(paint["type"], "line");
        assert_eq!(paint["line-color"], "#ff0000");
    }

    #[test]
    fn test_non_feature_collection_falls_back() {
        let kml = Dataset::new("k".to_string(), json!({"kml": {"Document": []}}));

        assert!(matches!(plan_layer(&kml).paint, LayerPaint::Fill { .. }));
        assert_eq!(initial_options(&[kml]).center, DEFAULT_CENTER);
    }

    #[test]
    fn test_initial_center() {
        assert_eq!(initial_options(&[]).center, DEFAULT_CENTER);
        assert_eq!(initial_options(&[line_dataset("1")]).center, [-73.9, 40.7]);
        assert_eq!(initial_options(&[polygon_dataset("2")]).center, [10.0, 50.0]);

        let options = initial_options(&[]);
        assert_eq!(options.zoom, 12.0);
        assert_eq!(options.style, "mapbox://styles/mapbox/streets-v11");
    }
}
