use super::{FieldType, Table};
use anyhow::Result;
use askama::Template;
use serde::Serialize;
use serde_json::{Value, json};

pub const TEMPERATURE_PALETTE: &[&str] = &[
    "#313695", "#4575b4", "#74add1", "#abd9e9", "#e0f3f8", "#ffffcc", "#fee090", "#fdae61",
    "#f46d43", "#d73027", "#a50026",
];
pub const DIVERGING_PALETTE: &[&str] = &["#0571b0", "#92c5de", "#f7f7f7", "#f4a582", "#ca0020"];
pub const COLD_TO_HOT_PALETTE: &[&str] = &[
    "#0000FF", "#0080FF", "#00FFFF", "#80FF80", "#FFFF00", "#FF8000", "#FF0000",
];
pub const HOT_TO_COLD_PALETTE: &[&str] = &[
    "#FF0000", "#FF8000", "#FFFF00", "#80FF80", "#00FFFF", "#0080FF", "#0000FF",
];
pub const GLOBAL_WARMING_PALETTE: &[&str] =
    &["#5A1846", "#900C3F", "#C70039", "#E3611C", "#F1920E", "#FFC300"];

const KEPLER_VERSION: &str = "2.5.5";

#[derive(Debug, Clone, Serialize)]
pub struct KeplerConfig {
    pub version: &'static str,
    pub config: MapConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub vis_state: VisState,
    pub map_state: MapState,
    pub map_style: MapStyle,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisState {
    pub layers: Vec<Layer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapStyle {
    pub style_type: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Point,
    Heatmap,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub config: LayerConfig,
    pub visual_channels: VisualChannels,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerConfig {
    pub data_id: String,
    pub label: String,
    pub columns: Columns,
    pub is_visible: bool,
    pub vis_config: VisConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Columns {
    pub lat: &'static str,
    pub lng: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisConfig {
    pub radius: f64,
    pub opacity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filled: Option<bool>,
    #[serde(rename = "enable3d", skip_serializing_if = "Option::is_none")]
    pub enable_3d: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_scale: Option<f64>,
    pub color_range: ColorRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub colors: Vec<String>,
}

impl ColorRange {
    pub fn new(name: Option<&str>, colors: &[&str]) -> Self {
        Self {
            name: name.map(str::to_string),
            colors: colors.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualChannels {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_field: Option<ChannelField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_field: Option<ChannelField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_field: Option<ChannelField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelField {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
}

impl ChannelField {
    pub fn real(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldType::Real,
        }
    }
}

impl Layer {
    pub fn point(data_id: &str, id: &str, label: &str, color_field: &str, colors: ColorRange) -> Self {
        Self {
            id: id.to_string(),
            kind: LayerKind::Point,
            config: LayerConfig {
                data_id: data_id.to_string(),
                label: label.to_string(),
                columns: Columns {
                    lat: "latitude",
                    lng: "longitude",
                    altitude: None,
                },
                is_visible: true,
                vis_config: VisConfig {
                    radius: 8.0,
                    opacity: 0.8,
                    outline: Some(false),
                    filled: Some(true),
                    enable_3d: None,
                    elevation_scale: None,
                    color_range: colors,
                },
            },
            visual_channels: VisualChannels {
                color_field: Some(ChannelField::real(color_field)),
                ..Default::default()
            },
        }
    }

    /// 3D heatmap weighted by `weight_field`, extruded by terrain altitude.
    pub fn heatmap(data_id: &str, id: &str, label: &str, weight_field: &str, colors: ColorRange) -> Self {
        Self {
            id: id.to_string(),
            kind: LayerKind::Heatmap,
            config: LayerConfig {
                data_id: data_id.to_string(),
                label: label.to_string(),
                columns: Columns {
                    lat: "latitude",
                    lng: "longitude",
                    altitude: Some("altitude_terrain".to_string()),
                },
                is_visible: true,
                vis_config: VisConfig {
                    radius: 150.0,
                    opacity: 0.8,
                    outline: None,
                    filled: None,
                    enable_3d: Some(true),
                    elevation_scale: Some(0.1),
                    color_range: colors,
                },
            },
            visual_channels: VisualChannels {
                weight_field: Some(ChannelField::real(weight_field)),
                height_field: Some(ChannelField::real("altitude_terrain")),
                ..Default::default()
            },
        }
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.config.vis_config.radius = radius;
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.config.is_visible = visible;
        self
    }

    pub fn extruded(mut self, height_field: &str, elevation_scale: f64) -> Self {
        self.config.vis_config.enable_3d = Some(true);
        self.config.vis_config.elevation_scale = Some(elevation_scale);
        self.height_field(height_field)
    }

    pub fn height_field(mut self, height_field: &str) -> Self {
        self.visual_channels.height_field = Some(ChannelField::real(height_field));
        self
    }
}

impl KeplerConfig {
    pub fn new(map_state: MapState, style_type: &'static str, layers: Vec<Layer>) -> Self {
        Self {
            version: "v1",
            config: MapConfig {
                vis_state: VisState { layers },
                map_state,
                map_style: MapStyle { style_type },
            },
        }
    }
}

/// Centered on the mean coordinate of the table.
pub fn centered_state(table: &Table, zoom: f64, pitch: f64) -> MapState {
    MapState {
        latitude: table.mean("latitude").unwrap_or_default(),
        longitude: table.mean("longitude").unwrap_or_default(),
        zoom,
        pitch,
        bearing: 0.0,
    }
}

pub fn dataset(data_id: &str, table: &Table) -> Value {
    let fields: Vec<Value> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"name": name, "type": table.field_type(i), "format": ""}))
        .collect();
    json!({
        "info": {"id": data_id, "label": data_id},
        "data": {"fields": fields, "rows": table.rows}
    })
}

fn script_json(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[derive(Template)]
#[template(path = "kepler.html")]
struct KeplerPage<'a> {
    title: &'a str,
    kepler_version: &'a str,
    token: String,
    datasets: String,
    config: String,
}

/// Standalone page that loads Kepler.gl from unpkg and adds the dataset with `config`.
pub fn render_html(title: &str, data_id: &str, table: &Table, config: &KeplerConfig, mapbox_token: &str) -> Result<String> {
    let page = KeplerPage {
        title,
        kepler_version: KEPLER_VERSION,
        token: script_json(&mapbox_token)?,
        datasets: script_json(&dataset(data_id, table))?,
        config: script_json(config)?,
    };
    Ok(page.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Cell;

    fn table() -> Table {
        let mut table = Table::new(&["latitude", "longitude", "temp_1m", "sensor_id"]);
        table
            .push(vec![
                Cell::Real(-39.1636),
                Cell::Real(-67.0384),
                Cell::Real(14.2),
                Cell::Text("</script>".into()),
            ])
            .unwrap();
        table
    }

    #[test]
    fn point_layer_serializes_kepler_shape() {
        let layer = Layer::point(
            "sensores",
            "temp_1m",
            "Temperatura 1m",
            "temp_1m",
            ColorRange::new(Some("Temperatura"), TEMPERATURE_PALETTE),
        )
        .extruded("elevation_1m", 1.0);
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["type"], "point");
        assert_eq!(value["config"]["dataId"], "sensores");
        assert_eq!(value["config"]["isVisible"], true);
        assert_eq!(value["config"]["visConfig"]["enable3d"], true);
        assert_eq!(value["config"]["visConfig"]["colorRange"]["colors"][0], "#313695");
        assert_eq!(value["visualChannels"]["colorField"], json!({"name": "temp_1m", "type": "real"}));
        assert_eq!(value["visualChannels"]["heightField"]["name"], "elevation_1m");
        assert!(value["config"]["columns"].get("altitude").is_none());
    }

    #[test]
    fn heatmap_layer_uses_terrain_altitude() {
        let layer = Layer::heatmap(
            "heatmap",
            "heatmap_1m",
            "Heatmap 1m",
            "temp_1m",
            ColorRange::new(None, COLD_TO_HOT_PALETTE),
        )
        .visible(false);
        let value = serde_json::to_value(&layer).unwrap();
        assert_eq!(value["type"], "heatmap");
        assert_eq!(value["config"]["columns"]["altitude"], "altitude_terrain");
        assert_eq!(value["config"]["visConfig"]["radius"], 150.0);
        assert_eq!(value["config"]["visConfig"]["elevationScale"], 0.1);
        assert_eq!(value["config"]["isVisible"], false);
        assert!(value["config"]["visConfig"].get("outline").is_none());
        assert_eq!(value["visualChannels"]["weightField"]["name"], "temp_1m");
    }

    #[test]
    fn config_wraps_map_state() {
        let table = table();
        let config = KeplerConfig::new(centered_state(&table, 15.0, 50.0), "satellite", vec![]);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["version"], "v1");
        assert_eq!(value["config"]["mapState"]["pitch"], 50.0);
        assert_eq!(value["config"]["mapStyle"]["styleType"], "satellite");
        assert_eq!(value["config"]["mapState"]["latitude"], -39.1636);
    }

    #[test]
    fn dataset_lists_typed_fields() {
        let value = dataset("sensores", &table());
        assert_eq!(value["data"]["fields"][2], json!({"name": "temp_1m", "type": "real", "format": ""}));
        assert_eq!(value["data"]["fields"][3]["type"], "string");
        assert_eq!(value["data"]["rows"][0][2], 14.2);
    }

    #[test]
    fn html_embeds_escaped_dataset() {
        let table = table();
        let config = KeplerConfig::new(centered_state(&table, 15.0, 0.0), "dark", vec![]);
        let html = render_html("Mapa <test>", "sensores", &table, &config, "").unwrap();
        assert!(html.contains("<title>Mapa &lt;test&gt;</title>"));
        assert!(html.contains("kepler.gl@2.5.5/umd/keplergl.min.js"));
        assert!(html.contains(r#"<\/script>"#));
        assert_eq!(html.matches("</script>").count(), 7);
        assert!(html.contains(r#"const MAPBOX_TOKEN = "";"#));
    }

    #[test]
    fn title_markup_is_escaped_but_token_is_not() {
        let table = table();
        let config = KeplerConfig::new(centered_state(&table, 15.0, 0.0), "dark", vec![]);
        let html = render_html("Chacra & \"Sur\"", "sensores", &table, &config, "pk.abc").unwrap();
        assert!(html.contains("<title>Chacra &amp; "));
        assert!(!html.contains(r#""Sur"</title>"#));
        assert!(html.contains(r#"const MAPBOX_TOKEN = "pk.abc";"#));
        assert!(html.contains(r#"const config = {"version":"v1""#));
    }
}
